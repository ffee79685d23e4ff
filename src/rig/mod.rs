//! Bone utilities for armature rigging.
//!
//! - **Parenting**: attach child bones to the first parent in range.
//! - **Selection**: pick bones at random, optionally spaced apart.
//! - **Rename**: number bones from a name template.
//! - **Weights**: hand out names from a weighted list.
//! - **Orient**: turn bones along the normal of the closest mesh vertex.
//! - **Scale**: derive a scale factor from a reference model.
//!
//! Everything works on snapshots; applying results to the scene is up to the
//! caller.

mod bone;
mod error;
mod orient;
mod parenting;
mod rename;
mod scale;
mod selection;
mod weights;

pub use bone::{ArmatureSnapshot, BonePoint, MeshSnapshot, NamedDirection, VertexSnapshot};
pub use error::{RigError, RigResult};
pub use orient::{
    BoneOrientation, NormalSource, RotationResult, direction_candidates, look_at_euler, nearest,
    nearest_direction, orient_bone, orient_bones, rest_tail, roll_correction,
};
pub use parenting::{
    CoverageReport, DEFAULT_INTERMEDIATE_SUFFIX, IntermediateNode, ParentAssignment,
    ParentingDiagnostics, ParentingOptions, ParentingResult, RoleFilter, apply_parenting,
    children_coverage, match_parents, partition_roles,
};
pub use rename::{RenameOptions, preview as rename_preview, rename};
pub use scale::{ScaleReference, measured_extent, scale_by_reference};
pub use selection::{SelectionOptions, isolated_points, select_random};
pub use weights::{Allocation, WeightList, WeightedLabel, allocate};

#[cfg(test)]
mod tests;
