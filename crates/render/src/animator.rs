use std::collections::BTreeMap;

use glam::Mat4;
use tracing::debug;

use crate::{tessellate_boxes, MeshData, Shape};

/// Clip start request handed to an animator.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationMetaData {
    /// Clip name in the shape.
    pub animation: String,
    /// Code the running clip is tracked under.
    pub code: String,
    /// Blend-in speed.
    pub ease_in_speed: f32,
    /// Blend-out speed.
    pub ease_out_speed: f32,
    /// Playback speed multiplier.
    pub animation_speed: f32,
}

impl AnimationMetaData {
    /// Clip played under its own name with symmetric easing.
    pub fn eased(code: &str, ease_speed: f32) -> Self {
        Self {
            animation: code.to_string(),
            code: code.to_string(),
            ease_in_speed: ease_speed,
            ease_out_speed: ease_speed,
            animation_speed: 1.0,
        }
    }
}

/// Renderer knobs the leaf behaviors drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererState {
    /// Whether the animated mesh is drawn this frame.
    pub should_render: bool,
    /// Yaw in degrees.
    pub rotation_deg_y: f32,
    /// X scale; `-1` mirrors the mesh.
    pub scale_x: f32,
    /// Backface culling; disabled for mirrored meshes.
    pub backface_culling: bool,
    /// Extra model transform applied before rotation.
    pub custom_transform: Option<Mat4>,
}

impl Default for RendererState {
    fn default() -> Self {
        Self {
            should_render: false,
            rotation_deg_y: 0.0,
            scale_x: 1.0,
            backface_culling: true,
            custom_transform: None,
        }
    }
}

/// Host animation utility for a single block instance.
pub trait AnimationUtil {
    /// Build the animator-ready mesh for `shape`, cached under `dict_key`.
    fn create_mesh(&mut self, dict_key: &str, shape: &Shape) -> MeshData;

    /// Bind the animator to `mesh`/`shape`; a no-op when already bound to `dict_key`.
    fn initialize_animator(&mut self, dict_key: &str, mesh: &MeshData, shape: &Shape);

    /// Whether an animator has been initialized.
    fn has_animator(&self) -> bool;

    /// Start (or restart) a clip.
    fn start_animation(&mut self, meta: AnimationMetaData);

    /// Stop a clip; unknown codes are ignored.
    fn stop_animation(&mut self, code: &str);

    /// Whether `code` is running.
    fn is_active(&self, code: &str) -> bool;

    /// Renderer state, once an animator exists.
    fn renderer(&mut self) -> Option<&mut RendererState>;
}

/// Records animator calls without drawing anything.
#[derive(Debug, Clone, Default)]
pub struct HeadlessAnimator {
    bound_key: Option<String>,
    active: BTreeMap<String, AnimationMetaData>,
    renderer: RendererState,
    /// Every clip start, oldest first.
    pub started: Vec<String>,
    /// Every clip stop that hit a running clip, oldest first.
    pub stopped: Vec<String>,
    /// Dict keys passed to `create_mesh`.
    pub created_meshes: Vec<String>,
}

impl HeadlessAnimator {
    /// Fresh animator with no bound mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dict key the animator is currently bound to.
    pub fn bound_key(&self) -> Option<&str> {
        self.bound_key.as_deref()
    }

    /// Read-only renderer state.
    pub fn renderer_state(&self) -> &RendererState {
        &self.renderer
    }
}

impl AnimationUtil for HeadlessAnimator {
    fn create_mesh(&mut self, dict_key: &str, shape: &Shape) -> MeshData {
        self.created_meshes.push(dict_key.to_string());
        tessellate_boxes(shape)
    }

    fn initialize_animator(&mut self, dict_key: &str, _mesh: &MeshData, _shape: &Shape) {
        if self.bound_key.as_deref() == Some(dict_key) {
            return;
        }
        debug!(dict_key, "animator bound");
        self.bound_key = Some(dict_key.to_string());
    }

    fn has_animator(&self) -> bool {
        self.bound_key.is_some()
    }

    fn start_animation(&mut self, meta: AnimationMetaData) {
        self.started.push(meta.code.clone());
        self.active.insert(meta.code.clone(), meta);
    }

    fn stop_animation(&mut self, code: &str) {
        if self.active.remove(code).is_some() {
            self.stopped.push(code.to_string());
        }
    }

    fn is_active(&self, code: &str) -> bool {
        self.active.contains_key(code)
    }

    fn renderer(&mut self) -> Option<&mut RendererState> {
        if self.bound_key.is_some() {
            Some(&mut self.renderer)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidingwindows_core::{AssetLocation, Cuboid};

    fn shape() -> Shape {
        Shape {
            code: AssetLocation::parse("x:shapes/sash").unwrap(),
            elements: vec![Cuboid::unit()],
            animations: vec!["opening".into(), "closing".into()],
        }
    }

    #[test]
    fn renderer_appears_after_binding() {
        let mut animator = HeadlessAnimator::new();
        assert!(animator.renderer().is_none());
        let mesh = animator.create_mesh("x:shapes/sash", &shape());
        animator.initialize_animator("x:shapes/sash", &mesh, &shape());
        assert!(animator.renderer().is_some());
        assert_eq!(animator.bound_key(), Some("x:shapes/sash"));
    }

    #[test]
    fn stop_only_records_running_clips() {
        let mut animator = HeadlessAnimator::new();
        animator.start_animation(AnimationMetaData::eased("opening", 10.0));
        animator.stop_animation("closing");
        animator.stop_animation("opening");
        assert_eq!(animator.stopped, vec!["opening".to_string()]);
        assert!(!animator.is_active("opening"));
    }
}
