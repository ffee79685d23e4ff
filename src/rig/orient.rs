//! Orienting bones along the normal of the closest mesh vertex.
//!
//! The look-at decomposition below is only valid with world up `(0, 0, 1)`,
//! which is why it takes no up vector.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::geom::{Axis, Euler, Point3, Tolerance, Transform, Vec3};

use super::bone::{BonePoint, MeshSnapshot, NamedDirection};
use super::error::{RigError, RigResult};

/// Closest candidate to `query` and its distance. Ties keep the first one.
#[must_use]
pub fn nearest<I>(query: Point3, candidates: I) -> Option<(NamedDirection, f64)>
where
    I: IntoIterator<Item = NamedDirection>,
{
    let mut best: Option<(NamedDirection, f64)> = None;
    for candidate in candidates {
        let distance_sq = candidate.position.distance_squared_to(query);
        if best.is_none_or(|(_, best_sq)| distance_sq < best_sq) {
            best = Some((candidate, distance_sq));
        }
    }
    best.map(|(candidate, distance_sq)| (candidate, distance_sq.sqrt()))
}

/// Direction attached to the candidate closest to `query`.
#[must_use]
pub fn nearest_direction(query: Point3, candidates: &[NamedDirection]) -> Option<Vec3> {
    nearest(query, candidates.iter().copied()).map(|(candidate, _)| candidate.direction)
}

/// Yaw/pitch/roll that turn a bone towards `direction`.
///
/// Mirrors the host's convention for world up `(0, 0, 1)`: the direction's z
/// is flipped, yaw and pitch come straight from it, and roll is measured in
/// the frame `w0 = (-d.y, d.x, 0)`, `u0 = w0 × d`. A vertical direction has no
/// such frame and gets zero roll. Returns `None` for a zero direction.
#[must_use]
pub fn look_at_euler(direction: Vec3) -> Option<Euler> {
    let up = Vec3::Z;
    let mut d = direction.normalized()?;
    d.z = -d.z;

    let yaw = d.y.atan2(d.x);
    let pitch = d.z.clamp(-1.0, 1.0).asin();

    let w0 = Vec3::new(-d.y, d.x, 0.0);
    let u0 = w0.cross(d);
    let w0_len = w0.length();
    let u0_len = u0.length();
    let roll = if Tolerance::ZERO_LENGTH.is_zero(w0_len) || Tolerance::ZERO_LENGTH.is_zero(u0_len) {
        0.0
    } else {
        (w0.dot(up) / w0_len).atan2(u0.dot(up) / u0_len)
    };

    let euler = Euler::new(roll, pitch, yaw);
    log::debug!("look-at rotation (deg) {:?}", euler.to_degrees());
    Some(euler)
}

/// Tail offset of a bone reset to the origin before rotating, per facing axis.
#[must_use]
pub const fn rest_tail(facing: Axis) -> Vec3 {
    match facing {
        Axis::X | Axis::Z => Vec3::Y,
        Axis::Y => Vec3::X,
    }
}

/// Extra roll applied after rotating; only the Z facing axis needs one.
#[must_use]
pub const fn roll_correction(facing: Axis) -> f64 {
    match facing {
        Axis::Z => FRAC_PI_2,
        Axis::X | Axis::Y => 0.0,
    }
}

/// New placement for a bone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneOrientation {
    pub label: String,
    pub head: Point3,
    pub tail: Point3,
    pub rotation: Euler,
    /// Head translation composed with the rotation.
    pub matrix: Transform,
    /// Roll (radians) to add around the bone's own axis.
    pub roll: f64,
}

/// Places a unit-length bone at `head`, rotated towards `normal`.
#[must_use]
pub fn orient_bone(label: &str, head: Point3, normal: Vec3, facing: Axis) -> Option<BoneOrientation> {
    let rotation = look_at_euler(normal)?;
    let rotate = rotation.to_transform();
    let tail = head.add_vec(rotate.apply_vec(rest_tail(facing)));

    Some(BoneOrientation {
        label: label.to_owned(),
        head,
        tail,
        rotation,
        matrix: Transform::translate(head.to_vec3()) * rotate,
        roll: roll_correction(facing),
    })
}

/// Where normals are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalSource {
    /// Every mesh in the scene.
    #[default]
    AllMeshes,
    /// Only the mesh with this name.
    Mesh(String),
}

/// Collects direction candidates from the meshes selected by `source`.
pub fn direction_candidates(
    meshes: &[MeshSnapshot],
    source: &NormalSource,
) -> RigResult<Vec<NamedDirection>> {
    match source {
        NormalSource::AllMeshes => Ok(meshes.iter().flat_map(|mesh| mesh.directions()).collect()),
        NormalSource::Mesh(name) => {
            let mesh = meshes
                .iter()
                .find(|mesh| &mesh.name == name)
                .ok_or_else(|| RigError::not_found(format!("source mesh `{name}`")))?;
            Ok(mesh.directions().collect())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationResult {
    pub orientations: Vec<BoneOrientation>,
    /// Bones left as they were: no candidate, or a zero-length normal.
    pub skipped: Vec<String>,
}

/// Orients each bone along the normal of its closest candidate.
#[must_use]
pub fn orient_bones(
    bones: &[&BonePoint],
    candidates: &[NamedDirection],
    facing: Axis,
) -> RotationResult {
    let mut result = RotationResult::default();
    for bone in bones {
        let oriented = nearest(bone.head, candidates.iter().copied())
            .and_then(|(candidate, _)| orient_bone(&bone.label, bone.head, candidate.direction, facing));
        match oriented {
            Some(orientation) => result.orientations.push(orientation),
            None => {
                log::warn!("no usable normal for bone `{}`", bone.label);
                result.skipped.push(bone.label.clone());
            }
        }
    }
    result
}
