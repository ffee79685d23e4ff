//! Random point selection with an optional minimum spacing.

use std::collections::BTreeSet;

use rand::Rng;

use crate::geom::Point3;

use super::error::{RigError, RigResult};

/// Bounds for [`select_random`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    /// How many times a dead-end selection is thrown away and redrawn before
    /// the constraint is reported as infeasible.
    pub max_restarts: usize,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self { max_restarts: 32 }
    }
}

/// Picks `count` distinct indices uniformly at random.
///
/// With `min_separation`, a candidate closer than that distance to any point
/// already picked is rejected (exactly the minimum is fine). Each draw is
/// uniform over the candidates that are still eligible, which is the same
/// distribution as drawing from all points and retrying on rejection, but
/// cannot spin: when nothing is eligible the attempt is restarted, and after
/// `options.max_restarts` restarts the request fails with
/// [`RigError::InfeasibleConstraint`].
pub fn select_random<R: Rng + ?Sized>(
    points: &[Point3],
    count: usize,
    min_separation: Option<f64>,
    options: &SelectionOptions,
    rng: &mut R,
) -> RigResult<BTreeSet<usize>> {
    if count > points.len() {
        return Err(RigError::invalid(format!(
            "cannot select {count} of {} points",
            points.len()
        )));
    }
    if let Some(min) = min_separation {
        if !min.is_finite() || min < 0.0 {
            return Err(RigError::invalid(format!(
                "minimum separation must be finite and non-negative, got {min}"
            )));
        }
    }
    if count == 0 {
        return Ok(BTreeSet::new());
    }

    let mut best = 0;
    for attempt in 0..=options.max_restarts {
        let chosen = draw_once(points, count, min_separation, rng);
        if chosen.len() == count {
            return Ok(chosen.into_iter().collect());
        }
        log::debug!(
            "random selection attempt {attempt} stalled at {}/{count}",
            chosen.len()
        );
        best = best.max(chosen.len());
    }

    Err(RigError::InfeasibleConstraint {
        requested: count,
        selected: best,
        min_separation: min_separation.unwrap_or_default(),
    })
}

fn draw_once<R: Rng + ?Sized>(
    points: &[Point3],
    count: usize,
    min_separation: Option<f64>,
    rng: &mut R,
) -> Vec<usize> {
    let mut eligible: Vec<usize> = (0..points.len()).collect();
    let mut chosen = Vec::with_capacity(count);

    while chosen.len() < count && !eligible.is_empty() {
        let pick = eligible.swap_remove(rng.random_range(0..eligible.len()));
        chosen.push(pick);
        if let Some(min) = min_separation {
            let anchor = points[pick];
            eligible.retain(|&index| points[index].distance_to(anchor) >= min);
        }
    }
    chosen
}

/// Indices of points whose nearest neighbour is at least `min_distance` away.
///
/// A quick hint for how many points can be spaced that far apart; it is not a
/// feasibility guarantee in either direction.
#[must_use]
pub fn isolated_points(points: &[Point3], min_distance: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|&(index, point)| {
            let nearest = points
                .iter()
                .enumerate()
                .filter(|&(other, _)| other != index)
                .map(|(_, other)| point.distance_to(*other))
                .fold(f64::MAX, f64::min);
            nearest >= min_distance
        })
        .map(|(index, _)| index)
        .collect()
}
