//! Uniform scale correction from a reference model of known size.

use serde::{Deserialize, Serialize};

use crate::geom::{Axis, BBox, Point3, Tolerance};

use super::error::{RigError, RigResult};

/// Inputs for [`scale_by_reference`]. Vertex positions are in world space
/// with the target's own scale already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleReference {
    /// Vertices of the reference model.
    pub reference: Vec<Point3>,
    /// Real-world length the reference model represents.
    pub reference_length: f64,
    /// Vertices of the model to scale.
    pub target: Vec<Point3>,
    /// Real-world length the target model should represent.
    pub target_length: f64,
    pub axis: Axis,
}

/// Factor to scale the target by so both models share one unit scale.
///
/// The reference's extent along `axis` over `reference_length` gives scene
/// units per real-world unit; the target should span `target_length` of
/// those.
pub fn scale_by_reference(input: &ScaleReference) -> RigResult<f64> {
    check_length("reference", input.reference_length)?;
    check_length("target", input.target_length)?;

    let reference_extent = measured_extent("reference", &input.reference, input.axis)?;
    let target_extent = measured_extent("target", &input.target, input.axis)?;

    let units_per_length = reference_extent / input.reference_length;
    let factor = input.target_length * units_per_length / target_extent;
    log::info!(
        "scale by reference: reference spans {reference_extent}, target spans {target_extent}, factor {factor}"
    );
    Ok(factor)
}

fn check_length(what: &str, length: f64) -> RigResult<()> {
    if !length.is_finite() || length <= 0.0 {
        return Err(RigError::invalid(format!(
            "the {what} length must be a positive number, got {length}"
        )));
    }
    Ok(())
}

/// Extent of a vertex cloud along one axis.
pub fn measured_extent(what: &str, vertices: &[Point3], axis: Axis) -> RigResult<f64> {
    let extent = BBox::from_points(vertices)
        .map(|bbox| bbox.extent(axis))
        .ok_or_else(|| RigError::not_found(format!("{what} model has no vertices")))?;
    if !extent.is_finite() || Tolerance::DEFAULT.is_zero(extent) {
        return Err(RigError::not_found(format!(
            "{what} model has no extent along {axis:?}"
        )));
    }
    Ok(extent)
}
