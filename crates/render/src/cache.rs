use std::collections::HashMap;

use slidingwindows_assets::BlockType;
use slidingwindows_core::AssetLocation;
use tracing::debug;

use crate::{AnimationUtil, AnimTrack, MeshData, Shape, ShapeLoader, Tessellator};

/// Meshes shared by every instance of one block type.
#[derive(Debug, Clone, Default)]
pub struct MeshSet {
    /// Animator dict key of the closed shape.
    pub closed_dict_key: Option<String>,
    /// Animator dict key of the opened shape.
    pub opened_dict_key: Option<String>,
    /// Closed-state shape.
    pub closed_shape: Option<Shape>,
    /// Opened-state shape.
    pub opened_shape: Option<Shape>,
    /// Static closed mesh.
    pub closed_static: Option<MeshData>,
    /// Static opened mesh.
    pub opened_static: Option<MeshData>,
    /// Animator-ready closed mesh.
    pub closed_anim: Option<MeshData>,
    /// Animator-ready opened mesh.
    pub opened_anim: Option<MeshData>,
}

impl MeshSet {
    /// Whether the opened shape is available for the mesh-swap pipeline.
    pub fn advanced_animation_available(&self) -> bool {
        self.opened_shape.is_some()
    }

    /// Whether another `prepare` pass could still fill something in.
    pub fn needs_preparation(&self, wants_opened: bool) -> bool {
        self.closed_static.is_none()
            || self.closed_anim.is_none()
            || (wants_opened && self.opened_static.is_none() && self.opened_anim.is_none())
    }

    /// Resting mesh for the given state. Falls back to the closed meshes.
    pub fn static_mesh(&self, opened: bool) -> Option<&MeshData> {
        if opened {
            if let Some(mesh) = &self.opened_static {
                return Some(mesh);
            }
        }
        self.closed_static.as_ref().or(self.closed_anim.as_ref())
    }

    /// Animator inputs for a track: opening plays from the closed mesh,
    /// closing from the opened one (falling back to closed).
    pub fn track(&self, track: AnimTrack) -> Option<(&str, &MeshData, &Shape)> {
        let (key, mesh, shape) = match track {
            AnimTrack::Opening => (
                self.closed_dict_key.as_deref(),
                self.closed_anim.as_ref(),
                self.closed_shape.as_ref(),
            ),
            AnimTrack::Closing => (
                self.opened_dict_key
                    .as_deref()
                    .or(self.closed_dict_key.as_deref()),
                self.opened_anim.as_ref().or(self.closed_anim.as_ref()),
                self.opened_shape.as_ref().or(self.closed_shape.as_ref()),
            ),
        };
        Some((key?, mesh?, shape?))
    }
}

/// Per-block-type mesh cache, filled lazily by the first instance that needs it.
#[derive(Debug, Default)]
pub struct MeshCache {
    entries: HashMap<AssetLocation, MeshSet>,
}

impl MeshCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cached set for `code`.
    pub fn get(&self, code: &AssetLocation) -> Option<&MeshSet> {
        self.entries.get(code)
    }

    /// Number of block types with an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill in whatever `block`'s entry is still missing. Already present
    /// pieces are never rebuilt.
    ///
    /// `closed_key` is the animator dict key of the closed shape;
    /// `opened_suffix` names the opened key relative to it (`-alt` for
    /// windows, `-open` for doors and trapdoors).
    pub fn prepare(
        &mut self,
        block: &BlockType,
        closed_key: &str,
        opened_suffix: &str,
        shapes: &dyn ShapeLoader,
        tessellator: &dyn Tessellator,
        mut animator: Option<&mut dyn AnimationUtil>,
    ) -> &MeshSet {
        let set = self.entries.entry(block.code.clone()).or_default();
        let Some(closed_loc) = block.shape.as_ref() else {
            return set;
        };

        set.closed_dict_key
            .get_or_insert_with(|| closed_key.to_string());

        if set.closed_shape.is_none() {
            set.closed_shape = shapes.load_shape(closed_loc);
        }
        if set.closed_anim.is_none() {
            if let (Some(animator), Some(shape)) =
                (animator.as_deref_mut(), set.closed_shape.as_ref())
            {
                set.closed_anim = Some(animator.create_mesh(closed_key, shape));
            }
        }
        if set.closed_static.is_none() {
            if let Some(shape) = &set.closed_shape {
                set.closed_static = Some(tessellator.tessellate_shape(block, shape));
            }
        }

        if let Some(opened) = block.attributes.opened_shape.as_deref() {
            let opened_key = format!("{closed_key}{opened_suffix}");
            set.opened_dict_key.get_or_insert(opened_key.clone());

            if set.opened_shape.is_none() {
                set.opened_shape = AssetLocation::parse(opened)
                    .ok()
                    .and_then(|loc| shapes.load_shape(&loc));
            }
            if set.opened_anim.is_none() {
                if let (Some(animator), Some(shape)) =
                    (animator.as_deref_mut(), set.opened_shape.as_ref())
                {
                    set.opened_anim = Some(animator.create_mesh(&opened_key, shape));
                }
            }
            if set.opened_static.is_none() {
                if let Some(shape) = &set.opened_shape {
                    set.opened_static = Some(tessellator.tessellate_shape(block, shape));
                }
            }
        }

        debug!(
            block = %block.code,
            advanced = set.advanced_animation_available(),
            "prepared mesh set"
        );
        set
    }
}
