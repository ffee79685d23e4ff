//! # Settings
//!
//! Every tunable of the rig utilities, grouped per tool. Defaults match the
//! values the add-on panels start with, so an empty JSON object deserializes
//! into a usable configuration.

use serde::{Deserialize, Serialize};

use crate::geom::Axis;
use crate::rig::{
    NormalSource, ParentingOptions, RenameOptions, RigError, RigResult, RoleFilter,
    SelectionOptions,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSettings {
    pub parenting: ParentingSettings,
    pub selection: SelectionSettings,
    pub rename: RenameOptions,
    pub rotation: RotationSettings,
    pub scale: ScaleSettings,
}

impl RigSettings {
    /// Checks every group; the first violation wins.
    pub fn validate(&self) -> RigResult<()> {
        self.parenting.validate()?;
        self.selection.validate()?;
        if self.rename.step == 0 {
            return Err(RigError::invalid("rename step must be at least 1"));
        }
        self.scale.validate()
    }
}

// ───────────────────────────── parenting ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentingSettings {
    /// Maximum head-to-head distance for a child to be attached.
    pub threshold: f64,
    /// Insert a container bone between each parent and its child.
    pub add_intermediate: bool,
    pub roles: RoleFilter,
}

impl Default for ParentingSettings {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            add_intermediate: true,
            roles: RoleFilter::default(),
        }
    }
}

impl ParentingSettings {
    #[must_use]
    pub fn options(&self) -> ParentingOptions {
        let options = ParentingOptions::new(self.threshold);
        if self.add_intermediate {
            options.with_intermediate(self.roles.intermediate_suffix.clone())
        } else {
            options
        }
    }

    fn validate(&self) -> RigResult<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(RigError::invalid(format!(
                "parenting threshold must be finite and non-negative, got {}",
                self.threshold
            )));
        }
        if self.roles.parent_prefix.is_empty() || self.roles.child_prefix.is_empty() {
            return Err(RigError::invalid("parent and child prefixes cannot be empty"));
        }
        if self.add_intermediate && self.roles.intermediate_suffix.is_empty() {
            return Err(RigError::invalid("intermediate suffix cannot be empty"));
        }
        Ok(())
    }
}

// ───────────────────────────── selection ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// How many bones to select.
    pub count: usize,
    /// Keep selected bones at least `min_distance` apart.
    pub space_by_distance: bool,
    pub min_distance: f64,
    pub max_restarts: usize,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            count: 1,
            space_by_distance: true,
            min_distance: 0.0,
            max_restarts: SelectionOptions::default().max_restarts,
        }
    }
}

impl SelectionSettings {
    /// Separation to enforce, if spacing is on.
    #[must_use]
    pub fn min_separation(&self) -> Option<f64> {
        self.space_by_distance.then_some(self.min_distance)
    }

    #[must_use]
    pub const fn options(&self) -> SelectionOptions {
        SelectionOptions {
            max_restarts: self.max_restarts,
        }
    }

    fn validate(&self) -> RigResult<()> {
        if self.count == 0 {
            return Err(RigError::invalid("random count must be at least 1"));
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(RigError::invalid(format!(
                "minimum distance must be finite and non-negative, got {}",
                self.min_distance
            )));
        }
        Ok(())
    }
}

// ───────────────────────────── rotation ──────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Bone axis that ends up pointing along the normal.
    pub facing_axis: Axis,
    /// Only look up normals on `normal_object`.
    pub use_normal_object: bool,
    pub normal_object: Option<String>,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            facing_axis: Axis::Z,
            use_normal_object: false,
            normal_object: None,
        }
    }
}

impl RotationSettings {
    /// Where normals come from. Asking for a named mesh without naming one
    /// is an error rather than a silent fallback to every mesh.
    pub fn normal_source(&self) -> RigResult<NormalSource> {
        if !self.use_normal_object {
            return Ok(NormalSource::AllMeshes);
        }
        match self.normal_object.as_deref() {
            Some(name) if !name.is_empty() => Ok(NormalSource::Mesh(name.to_owned())),
            _ => Err(RigError::invalid("no normal source object set")),
        }
    }
}

// ─────────────────────────────── scale ───────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleSettings {
    /// Mesh of known real-world size.
    pub ref_model: Option<String>,
    pub ref_length: f64,
    /// Mesh to rescale.
    pub target_model: Option<String>,
    pub target_length: f64,
    pub length_axis: Axis,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            ref_model: None,
            ref_length: 1.0,
            target_model: None,
            target_length: 1.0,
            length_axis: Axis::Y,
        }
    }
}

impl ScaleSettings {
    fn validate(&self) -> RigResult<()> {
        for (what, length) in [("reference", self.ref_length), ("target", self.target_length)] {
            if !length.is_finite() || length < 0.0 {
                return Err(RigError::invalid(format!(
                    "{what} length must be finite and non-negative, got {length}"
                )));
            }
        }
        Ok(())
    }
}
