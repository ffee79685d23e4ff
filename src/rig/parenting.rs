//! Distance-threshold auto-parenting.
//!
//! Parents are visited in input order. Each parent claims the **first**
//! unparented child, in enumeration order, whose head lies within the
//! threshold, then stops. This is a first-fit pass, not a nearest-fit or
//! globally optimal assignment: when a child is in range of several parents
//! the parent enumerated first wins, even if another one is closer.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::Point3;

use super::bone::{ArmatureSnapshot, BonePoint, free_label};
use super::error::{RigError, RigResult};

/// Suffix the host add-on uses for container bones.
pub const DEFAULT_INTERMEDIATE_SUFFIX: &str = "_DMG";

/// Options for [`match_parents`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParentingOptions {
    /// Maximum head-to-head distance (inclusive).
    pub threshold: f64,
    /// When set, a synthetic node named `parent + suffix` is inserted between
    /// the parent and the child.
    pub intermediate_suffix: Option<String>,
    /// Labels already in use outside `parents` and `children`; new
    /// intermediates are numbered around them.
    pub reserved_labels: HashSet<String>,
}

impl ParentingOptions {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            intermediate_suffix: None,
            reserved_labels: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_intermediate(mut self, suffix: impl Into<String>) -> Self {
        self.intermediate_suffix = Some(suffix.into());
        self
    }

    #[must_use]
    pub fn with_reserved_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_labels.extend(labels.into_iter().map(Into::into));
        self
    }

    fn validate(&self) -> RigResult<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RigError::invalid(format!(
                "distance threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// A child attached to a parent (or to the intermediate created for it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentAssignment {
    pub child: String,
    pub parent: String,
    pub distance: f64,
}

/// A synthetic node inserted between a parent and its child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateNode {
    pub label: String,
    pub parent: String,
    pub head: Point3,
    pub tail: Point3,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentingDiagnostics {
    pub parents_scanned: usize,
    pub children_considered: usize,
    pub assigned: usize,
    pub unmatched_children: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentingResult {
    /// Assignments in the order they were made.
    pub assignments: Vec<ParentAssignment>,
    pub intermediates: Vec<IntermediateNode>,
    pub diagnostics: ParentingDiagnostics,
}

impl ParentingResult {
    /// The node `child` was attached to, if any.
    #[must_use]
    pub fn parent_of(&self, child: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|assignment| assignment.child == child)
            .map(|assignment| assignment.parent.as_str())
    }
}

/// First-fit parent matching.
///
/// Children that already have a parent are never considered, and a child
/// claimed during this pass is never reassigned. A parent and child sharing a
/// label are never matched to each other.
pub fn match_parents(
    parents: &[BonePoint],
    children: &[BonePoint],
    options: &ParentingOptions,
) -> RigResult<ParentingResult> {
    options.validate()?;

    let mut claimed = vec![false; children.len()];
    let mut taken_labels: HashSet<String> = parents
        .iter()
        .chain(children)
        .map(|bone| bone.label.clone())
        .chain(options.reserved_labels.iter().cloned())
        .collect();
    let mut result = ParentingResult::default();
    result.diagnostics.parents_scanned = parents.len();
    result.diagnostics.children_considered = children.iter().filter(|c| !c.has_parent()).count();

    for parent in parents {
        let found = children.iter().enumerate().find_map(|(index, child)| {
            if claimed[index] || child.has_parent() || child.label == parent.label {
                return None;
            }
            let distance = parent.head.distance_to(child.head);
            (distance <= options.threshold).then_some((index, distance))
        });

        let Some((index, distance)) = found else {
            continue;
        };
        claimed[index] = true;

        let attach_to = match options.intermediate_suffix.as_deref() {
            Some(suffix) => {
                let label = free_label(&format!("{}{suffix}", parent.label), |label| {
                    taken_labels.contains(label)
                });
                taken_labels.insert(label.clone());
                result.intermediates.push(IntermediateNode {
                    label: label.clone(),
                    parent: parent.label.clone(),
                    head: parent.head,
                    tail: parent.tail,
                });
                label
            }
            None => parent.label.clone(),
        };

        log::debug!(
            "parenting `{}` to `{attach_to}` at distance {distance:.4}",
            children[index].label
        );
        result.assignments.push(ParentAssignment {
            child: children[index].label.clone(),
            parent: attach_to,
            distance,
        });
    }

    result.diagnostics.assigned = result.assignments.len();
    result.diagnostics.unmatched_children = children
        .iter()
        .zip(&claimed)
        .filter(|(child, claimed)| !child.has_parent() && !**claimed)
        .map(|(child, _)| child.label.clone())
        .collect();
    Ok(result)
}


/// Prefix rules that sort bones into parent and child candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleFilter {
    pub parent_prefix: String,
    pub child_prefix: String,
    /// Bones ending with this suffix are intermediates from an earlier pass.
    pub intermediate_suffix: String,
}

impl Default for RoleFilter {
    fn default() -> Self {
        Self {
            parent_prefix: "HP_".to_owned(),
            child_prefix: "P_".to_owned(),
            intermediate_suffix: DEFAULT_INTERMEDIATE_SUFFIX.to_owned(),
        }
    }
}

impl RoleFilter {
    #[must_use]
    pub fn is_parent(&self, label: &str) -> bool {
        label.starts_with(&self.parent_prefix)
    }

    #[must_use]
    pub fn is_child(&self, label: &str) -> bool {
        label.starts_with(&self.child_prefix)
    }

    #[must_use]
    pub fn is_intermediate(&self, label: &str) -> bool {
        !self.intermediate_suffix.is_empty() && label.ends_with(&self.intermediate_suffix)
    }

    /// Parent prefix, minus intermediates left by an earlier pass.
    #[must_use]
    pub fn is_parent_candidate(&self, label: &str) -> bool {
        self.is_parent(label) && !self.is_intermediate(label)
    }
}

/// Splits bones into `(parents, children)` by prefix. Intermediates from an
/// earlier pass are not parents; a bone matching both prefixes appears in
/// both lists.
#[must_use]
pub fn partition_roles(bones: &[BonePoint], filter: &RoleFilter) -> (Vec<BonePoint>, Vec<BonePoint>) {
    let parents = bones
        .iter()
        .filter(|bone| filter.is_parent_candidate(&bone.label))
        .cloned()
        .collect();
    let children = bones
        .iter()
        .filter(|bone| filter.is_child(&bone.label))
        .cloned()
        .collect();
    (parents, children)
}

/// Writes a matching result back into a snapshot: intermediates are appended
/// and children re-pointed at their new parents. The result is checked in
/// full first; on error the snapshot is unchanged.
pub fn apply_parenting(snapshot: &mut ArmatureSnapshot, result: &ParentingResult) -> RigResult<()> {
    if let Some(node) = result
        .intermediates
        .iter()
        .find(|node| snapshot.contains(&node.label))
    {
        return Err(RigError::invalid(format!(
            "intermediate label `{}` already exists",
            node.label
        )));
    }
    let mut children = Vec::with_capacity(result.assignments.len());
    for assignment in &result.assignments {
        let index = snapshot
            .index_of(&assignment.child)
            .ok_or_else(|| RigError::not_found(format!("bone `{}`", assignment.child)))?;
        children.push((index, assignment.parent.clone()));
    }

    for node in &result.intermediates {
        snapshot.bones.push(
            BonePoint::new(node.label.clone(), node.head)
                .with_tail(node.tail)
                .with_parent(node.parent.clone()),
        );
    }
    for (index, parent) in children {
        snapshot.bones[index].parent = Some(parent);
    }
    Ok(())
}

/// How many children a parenting pass at the current threshold would reach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Bones matching the child prefix.
    pub children: usize,
    /// Of those, how many already have a parent.
    pub parented: usize,
    /// Unparented children within threshold of at least one parent.
    pub reachable: usize,
}

impl CoverageReport {
    #[must_use]
    pub const fn unparented(&self) -> usize {
        self.children - self.parented
    }

    #[must_use]
    pub const fn all_parented(&self) -> bool {
        self.parented == self.children
    }

    /// Reachable share of the unparented children, in whole percent.
    #[must_use]
    pub fn percent(&self) -> usize {
        match self.unparented() {
            0 => 100,
            unparented => self.reachable * 100 / unparented,
        }
    }
}

impl fmt::Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.all_parented() {
            f.write_str("All children are parented")
        } else {
            write!(
                f,
                "{}% ({}/{})",
                self.percent(),
                self.reachable,
                self.unparented()
            )
        }
    }
}

/// Live read-out of how a parenting pass would cover the children.
///
/// Unlike [`match_parents`] this does not stop at the first hit per parent:
/// a child counts as reachable as soon as any parent is in range.
#[must_use]
pub fn children_coverage(bones: &[BonePoint], filter: &RoleFilter, threshold: f64) -> CoverageReport {
    let parents: Vec<&BonePoint> = bones
        .iter()
        .filter(|bone| filter.is_parent_candidate(&bone.label))
        .collect();

    let mut report = CoverageReport::default();
    for child in bones.iter().filter(|bone| filter.is_child(&bone.label)) {
        report.children += 1;
        if child.has_parent() {
            report.parented += 1;
            continue;
        }
        let in_range = parents.iter().any(|parent| {
            parent.label != child.label && parent.head.distance_to(child.head) <= threshold
        });
        if in_range {
            report.reachable += 1;
        }
    }
    report
}
