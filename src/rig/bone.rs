//! Snapshot data model handed over by the host.
//!
//! The host copies its bones and meshes into these types, the rig utilities
//! compute on them, and the host applies the results back. Nothing here keeps
//! a reference into host state.

use serde::{Deserialize, Serialize};

use crate::geom::{Point3, Transform, Vec3};

use super::error::{RigError, RigResult};

/// A labeled bone: head/tail positions plus its place in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BonePoint {
    pub label: String,
    pub head: Point3,
    #[serde(default)]
    pub tail: Point3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

impl BonePoint {
    #[must_use]
    pub fn new(label: impl Into<String>, head: Point3) -> Self {
        Self {
            label: label.into(),
            head,
            tail: head.add_vec(Vec3::Y),
            parent: None,
            selected: false,
        }
    }

    #[must_use]
    pub fn with_tail(mut self, tail: Point3) -> Self {
        self.tail = tail;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    #[must_use]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }
}

/// A reference position with the direction attached to it (typically a mesh
/// vertex and its normal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NamedDirection {
    pub position: Point3,
    pub direction: Vec3,
}

impl NamedDirection {
    #[must_use]
    pub const fn new(position: Point3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
        }
    }
}

/// Ordered bones of one armature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArmatureSnapshot {
    #[serde(default)]
    pub bones: Vec<BonePoint>,
}

impl ArmatureSnapshot {
    #[must_use]
    pub fn new(bones: Vec<BonePoint>) -> Self {
        Self { bones }
    }

    /// Rejects duplicate labels, which every matching pass relies on.
    pub fn validate(&self) -> RigResult<()> {
        let mut seen = std::collections::HashSet::with_capacity(self.bones.len());
        for bone in &self.bones {
            if !seen.insert(bone.label.as_str()) {
                return Err(RigError::invalid(format!(
                    "duplicate bone label `{}`",
                    bone.label
                )));
            }
            if !bone.head.is_finite() || !bone.tail.is_finite() {
                return Err(RigError::invalid(format!(
                    "bone `{}` has non-finite coordinates",
                    bone.label
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.bones.iter().position(|bone| bone.label == label)
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&BonePoint> {
        self.bones.iter().find(|bone| bone.label == label)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    #[must_use]
    pub fn heads(&self) -> Vec<Point3> {
        self.bones.iter().map(|bone| bone.head).collect()
    }

    #[must_use]
    pub fn selected_indices(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter_map(|(index, bone)| bone.selected.then_some(index))
            .collect()
    }

    pub fn clear_selection(&mut self) {
        for bone in &mut self.bones {
            bone.selected = false;
        }
    }

    /// Free label derived from `name`, numbered `name.001`, `name.002`, ...
    /// when `name` is taken, the way the host names duplicates.
    #[must_use]
    pub fn unique_label(&self, name: &str) -> String {
        free_label(name, |label| self.contains(label))
    }

    /// Renames the bone at `index` and rewrites the parent references that
    /// pointed at it. Returns the label actually applied.
    pub fn rename(&mut self, index: usize, name: &str) -> RigResult<String> {
        let old = self
            .bones
            .get(index)
            .map(|bone| bone.label.clone())
            .ok_or_else(|| RigError::invalid(format!("bone index {index} out of range")))?;
        if old == name {
            return Ok(old);
        }

        let label = self.unique_label(name);
        for bone in &mut self.bones {
            if bone.parent.as_deref() == Some(old.as_str()) {
                bone.parent = Some(label.clone());
            }
        }
        self.bones[index].label.clone_from(&label);
        Ok(label)
    }
}

/// `name` when it is free, otherwise the first free `base.001`,
/// `base.002`, ... where `base` is `name` without a numeric suffix.
pub(crate) fn free_label(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(name) {
        return name.to_owned();
    }
    let base = strip_numeric_suffix(name);
    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}.{n:03}");
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn strip_numeric_suffix(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, digits))
            if !base.is_empty() && digits.len() >= 3 && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

/// One mesh vertex as reported by the host, in mesh-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub co: Point3,
    #[serde(default)]
    pub normal: Vec3,
}

/// A mesh object: name, object-to-world matrix and vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub name: String,
    #[serde(default)]
    pub world: Transform,
    #[serde(default)]
    pub vertices: Vec<VertexSnapshot>,
}

impl MeshSnapshot {
    #[must_use]
    pub fn new(name: impl Into<String>, vertices: Vec<VertexSnapshot>) -> Self {
        Self {
            name: name.into(),
            world: Transform::identity(),
            vertices,
        }
    }

    #[must_use]
    pub fn with_world(mut self, world: Transform) -> Self {
        self.world = world;
        self
    }

    /// Vertex positions in world space.
    #[must_use]
    pub fn world_positions(&self) -> Vec<Point3> {
        self.vertices
            .iter()
            .map(|vertex| self.world.apply_point(vertex.co))
            .collect()
    }

    /// Vertices as direction candidates: world-space positions paired with
    /// the normals exactly as the host reports them.
    pub fn directions(&self) -> impl Iterator<Item = NamedDirection> + '_ {
        self.vertices
            .iter()
            .map(|vertex| NamedDirection::new(self.world.apply_point(vertex.co), vertex.normal))
    }
}

#[cfg(test)]
mod tests {
    use super::{ArmatureSnapshot, BonePoint, MeshSnapshot, VertexSnapshot};
    use crate::geom::{Point3, Transform, Vec3};

    fn armature(labels: &[&str]) -> ArmatureSnapshot {
        ArmatureSnapshot::new(
            labels
                .iter()
                .map(|label| BonePoint::new(*label, Point3::ORIGIN))
                .collect(),
        )
    }

    #[test]
    fn unique_label_numbers_duplicates() {
        let snapshot = armature(&["P_a", "P_a.001", "HP_b"]);
        assert_eq!(snapshot.unique_label("P_c"), "P_c");
        assert_eq!(snapshot.unique_label("P_a"), "P_a.002");
        assert_eq!(snapshot.unique_label("P_a.001"), "P_a.002");
        assert_eq!(snapshot.unique_label("HP_b"), "HP_b.001");
    }

    #[test]
    fn rename_rewrites_child_references() {
        let mut snapshot = ArmatureSnapshot::new(vec![
            BonePoint::new("root", Point3::ORIGIN),
            BonePoint::new("leaf", Point3::ORIGIN).with_parent("root"),
        ]);
        let applied = snapshot.rename(0, "hips").expect("rename");
        assert_eq!(applied, "hips");
        assert_eq!(snapshot.bones[1].parent.as_deref(), Some("hips"));
    }

    #[test]
    fn rename_to_taken_label_gets_numbered() {
        let mut snapshot = armature(&["a", "b"]);
        let applied = snapshot.rename(1, "a").expect("rename");
        assert_eq!(applied, "a.001");
        assert!(snapshot.rename(5, "x").is_err());
    }

    #[test]
    fn validate_rejects_duplicate_labels() {
        assert!(armature(&["a", "b"]).validate().is_ok());
        assert!(armature(&["a", "a"]).validate().is_err());
    }

    #[test]
    fn mesh_directions_use_world_positions_and_raw_normals() {
        let mesh = MeshSnapshot::new(
            "hull",
            vec![VertexSnapshot {
                co: Point3::new(1.0, 0.0, 0.0),
                normal: Vec3::X,
            }],
        )
        .with_world(Transform::translate(Vec3::new(0.0, 0.0, 2.0)));

        let directions: Vec<_> = mesh.directions().collect();
        assert_eq!(directions.len(), 1);
        assert_eq!(directions[0].position, Point3::new(1.0, 0.0, 2.0));
        assert_eq!(directions[0].direction, Vec3::X);
    }
}
