#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod geom;
pub mod rig;

use std::fmt;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use config::RigSettings;
use rig::{
    Allocation, ArmatureSnapshot, CoverageReport, MeshSnapshot, ParentingResult, RigError,
    RigResult, RotationResult, ScaleReference, WeightList,
};

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for hosts.
///
/// Holds the latest armature and mesh snapshots, the settings and the weight
/// list. Every operation recomputes from that state; results that change
/// bones are written back into the held armature so the host can read it
/// back with [`Engine::armature`].
#[wasm_bindgen]
pub struct Engine {
    settings: RigSettings,
    armature: ArmatureSnapshot,
    meshes: Vec<MeshSnapshot>,
    weights: WeightList,
    rng: StdRng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Engine whose random choices repeat for the same seed.
    #[wasm_bindgen(js_name = withSeed)]
    pub fn with_seed(seed: u64) -> Engine {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    #[wasm_bindgen(js_name = setSettings)]
    pub fn js_set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.set_settings(from_js(settings)?).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getSettings)]
    pub fn js_settings(&self) -> Result<JsValue, JsValue> {
        to_js(&self.settings)
    }

    #[wasm_bindgen(js_name = loadArmature)]
    pub fn js_load_armature(&mut self, armature: JsValue) -> Result<(), JsValue> {
        self.load_armature(from_js(armature)?).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getArmature)]
    pub fn js_armature(&self) -> Result<JsValue, JsValue> {
        to_js(&self.armature)
    }

    #[wasm_bindgen(js_name = loadMeshes)]
    pub fn js_load_meshes(&mut self, meshes: JsValue) -> Result<(), JsValue> {
        self.load_meshes(from_js(meshes)?).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = parentBones)]
    pub fn js_parent_bones(&mut self) -> Result<JsValue, JsValue> {
        let result = self.parent_bones().map_err(to_js_error)?;
        to_js(&result)
    }

    #[wasm_bindgen(js_name = childrenCoverage)]
    pub fn js_children_coverage(&self) -> Result<JsValue, JsValue> {
        to_js(&self.children_coverage())
    }

    #[wasm_bindgen(js_name = selectRandomBones)]
    pub fn js_select_random_bones(&mut self) -> Result<JsValue, JsValue> {
        let selected = self.select_random_bones().map_err(to_js_error)?;
        to_js(&selected)
    }

    #[wasm_bindgen(js_name = bonesInRange)]
    pub fn js_bones_in_range(&self) -> Result<JsValue, JsValue> {
        to_js(&self.bones_in_range())
    }

    #[wasm_bindgen(js_name = renameSelected)]
    pub fn js_rename_selected(&mut self) -> Result<JsValue, JsValue> {
        let renamed = self.rename_selected().map_err(to_js_error)?;
        to_js(&renamed)
    }

    #[wasm_bindgen(js_name = renamePreview)]
    pub fn js_rename_preview(&self) -> Result<Option<String>, JsValue> {
        self.rename_preview().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getWeights)]
    pub fn js_weights(&self) -> Result<JsValue, JsValue> {
        to_js(&self.weights)
    }

    #[wasm_bindgen(js_name = setWeights)]
    pub fn js_set_weights(&mut self, weights: JsValue) -> Result<(), JsValue> {
        self.weights = from_js(weights)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = addWeight)]
    pub fn js_add_weight(&mut self) -> usize {
        self.weights.push_default()
    }

    #[wasm_bindgen(js_name = editWeight)]
    pub fn js_edit_weight(&mut self, index: usize, value: &str, weight: f64) -> Result<(), JsValue> {
        self.weights.set_value(index, value).map_err(to_js_error)?;
        self.weights.set_weight(index, weight).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = removeWeight)]
    pub fn js_remove_weight(&mut self, index: usize) -> Result<usize, JsValue> {
        self.weights.remove(index).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = moveWeightUp)]
    pub fn js_move_weight_up(&mut self, index: usize) -> Result<usize, JsValue> {
        self.weights.move_up(index).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = moveWeightDown)]
    pub fn js_move_weight_down(&mut self, index: usize) -> Result<usize, JsValue> {
        self.weights.move_down(index).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = renameByWeight)]
    pub fn js_rename_by_weight(&mut self) -> Result<JsValue, JsValue> {
        let allocation = self.rename_by_weight().map_err(to_js_error)?;
        to_js(&allocation)
    }

    #[wasm_bindgen(js_name = rotateSelected)]
    pub fn js_rotate_selected(&mut self) -> Result<JsValue, JsValue> {
        let result = self.rotate_selected().map_err(to_js_error)?;
        to_js(&result)
    }

    #[wasm_bindgen(js_name = scaleByReference)]
    pub fn js_scale_by_reference(&self) -> Result<f64, JsValue> {
        self.scale_by_reference().map_err(to_js_error)
    }
}

impl Engine {
    fn with_rng(rng: StdRng) -> Self {
        Self {
            settings: RigSettings::default(),
            armature: ArmatureSnapshot::default(),
            meshes: Vec::new(),
            weights: WeightList::new(),
            rng,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &RigSettings {
        &self.settings
    }

    /// Replaces the settings after validating them; invalid settings leave
    /// the previous ones in place.
    pub fn set_settings(&mut self, settings: RigSettings) -> RigResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    #[must_use]
    pub fn armature(&self) -> &ArmatureSnapshot {
        &self.armature
    }

    pub fn load_armature(&mut self, armature: ArmatureSnapshot) -> RigResult<()> {
        armature.validate()?;
        debug_log!("armature loaded with {} bones", armature.len());
        self.armature = armature;
        Ok(())
    }

    #[must_use]
    pub fn meshes(&self) -> &[MeshSnapshot] {
        &self.meshes
    }

    pub fn load_meshes(&mut self, meshes: Vec<MeshSnapshot>) -> RigResult<()> {
        for mesh in &meshes {
            if let Some(vertex) = mesh
                .vertices
                .iter()
                .find(|vertex| !vertex.co.is_finite() || !vertex.normal.is_finite())
            {
                return Err(RigError::invalid(format!(
                    "mesh `{}` has a non-finite vertex {vertex:?}",
                    mesh.name
                )));
            }
        }
        debug_log!("{} meshes loaded", meshes.len());
        self.meshes = meshes;
        Ok(())
    }

    #[must_use]
    pub fn weights(&self) -> &WeightList {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightList {
        &mut self.weights
    }

    // ───────────────────────────── parenting ─────────────────────────────

    /// Attaches `P_` children to the first `HP_` parent in range and writes
    /// the new hierarchy (and any container bones) into the armature.
    pub fn parent_bones(&mut self) -> RigResult<ParentingResult> {
        let parenting = &self.settings.parenting;
        let (parents, children) = rig::partition_roles(&self.armature.bones, &parenting.roles);
        let options = parenting
            .options()
            .with_reserved_labels(self.armature.bones.iter().map(|bone| bone.label.clone()));
        let result = rig::match_parents(&parents, &children, &options)?;
        rig::apply_parenting(&mut self.armature, &result)?;
        debug_log!(
            "parenting: {} assignments, {} container bones",
            result.assignments.len(),
            result.intermediates.len()
        );
        Ok(result)
    }

    #[must_use]
    pub fn children_coverage(&self) -> CoverageReport {
        let parenting = &self.settings.parenting;
        rig::children_coverage(&self.armature.bones, &parenting.roles, parenting.threshold)
    }

    // ───────────────────────────── selection ─────────────────────────────

    /// Replaces the selection with randomly picked bones and returns their
    /// labels in armature order.
    pub fn select_random_bones(&mut self) -> RigResult<Vec<String>> {
        let selection = &self.settings.selection;
        let picked = rig::select_random(
            &self.armature.heads(),
            selection.count,
            selection.min_separation(),
            &selection.options(),
            &mut self.rng,
        )?;

        self.armature.clear_selection();
        let mut labels = Vec::with_capacity(picked.len());
        for index in picked {
            let bone = &mut self.armature.bones[index];
            bone.selected = true;
            labels.push(bone.label.clone());
        }
        Ok(labels)
    }

    /// Bones with no neighbour closer than the selection's minimum distance.
    #[must_use]
    pub fn bones_in_range(&self) -> Vec<String> {
        rig::isolated_points(&self.armature.heads(), self.settings.selection.min_distance)
            .into_iter()
            .map(|index| self.armature.bones[index].label.clone())
            .collect()
    }

    // ────────────────────────────── renaming ─────────────────────────────

    /// Renames the selected bones from the rename template and returns the
    /// labels applied. Clashing names get the host's `.001` numbering.
    pub fn rename_selected(&mut self) -> RigResult<Vec<String>> {
        let indices = self.armature.selected_indices();
        let current: Vec<String> = indices
            .iter()
            .map(|&index| self.armature.bones[index].label.clone())
            .collect();
        let names = rig::rename(&current, &self.settings.rename)?;

        indices
            .into_iter()
            .zip(names)
            .map(|(index, name)| self.armature.rename(index, &name))
            .collect()
    }

    /// Name the first selected bone would get, if any bone is selected.
    pub fn rename_preview(&self) -> RigResult<Option<String>> {
        let indices = self.armature.selected_indices();
        let Some(&first) = indices.first() else {
            return Ok(None);
        };
        rig::rename_preview(
            &self.armature.bones[first].label,
            &self.settings.rename,
            indices.len(),
        )
        .map(Some)
    }

    /// Hands the weight list's labels out over the selected bones. The
    /// returned allocation carries the labels as applied.
    pub fn rename_by_weight(&mut self) -> RigResult<Allocation> {
        let indices = self.armature.selected_indices();
        let mut allocation = rig::allocate(indices.len(), &self.weights, &mut self.rng)?;
        for (index, label) in indices.into_iter().zip(allocation.labels.iter_mut()) {
            if let Some(name) = label.as_mut() {
                *name = self.armature.rename(index, name)?;
            }
        }
        Ok(allocation)
    }

    // ───────────────────────────── rotation ──────────────────────────────

    /// Turns each selected bone along the normal of its closest mesh vertex
    /// and writes head/tail back into the armature.
    pub fn rotate_selected(&mut self) -> RigResult<RotationResult> {
        let source = self.settings.rotation.normal_source()?;
        let candidates = rig::direction_candidates(&self.meshes, &source)?;
        let selected = self.armature.selected_indices();
        let bones: Vec<_> = selected
            .iter()
            .map(|&index| &self.armature.bones[index])
            .collect();

        let result = rig::orient_bones(&bones, &candidates, self.settings.rotation.facing_axis);
        for orientation in &result.orientations {
            if let Some(index) = self.armature.index_of(&orientation.label) {
                let bone = &mut self.armature.bones[index];
                bone.head = orientation.head;
                bone.tail = orientation.tail;
            }
        }
        debug_log!(
            "rotation: {} oriented, {} skipped",
            result.orientations.len(),
            result.skipped.len()
        );
        Ok(result)
    }

    // ─────────────────────────────── scale ───────────────────────────────

    /// Uniform factor for the configured target mesh, measured against the
    /// configured reference mesh.
    pub fn scale_by_reference(&self) -> RigResult<f64> {
        let scale = &self.settings.scale;
        let reference = self.named_mesh("reference", scale.ref_model.as_deref())?;
        let target = self.named_mesh("target", scale.target_model.as_deref())?;
        rig::scale_by_reference(&ScaleReference {
            reference: reference.world_positions(),
            reference_length: scale.ref_length,
            target: target.world_positions(),
            target_length: scale.target_length,
            axis: scale.length_axis,
        })
    }

    fn named_mesh(&self, role: &str, name: Option<&str>) -> RigResult<&MeshSnapshot> {
        let name = name.ok_or_else(|| RigError::invalid(format!("no {role} model set")))?;
        self.meshes
            .iter()
            .find(|mesh| mesh.name == name)
            .ok_or_else(|| RigError::not_found(format!("{role} model `{name}`")))
    }
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
