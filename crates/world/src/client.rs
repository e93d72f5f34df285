//! Client-side host state: mesh cache, per-leaf animators and the frame
//! scheduler that drives the mesh-swap pipeline.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use slidingwindows_assets::BlockType;
use slidingwindows_core::{AssetLocation, BlockPos};
use slidingwindows_render::{
    AnimTrack, AnimationUtil, BoxTessellator, FrameScheduler, HeadlessAnimator, MeshCache,
    MeshData, ShapeLibrary, ShapeLoader, Tessellator,
};

use crate::visuals::{self, VisualTask};
use crate::BlockAccessor;

/// Builds the animator for one leaf instance. `None` means the block is
/// rendered from static meshes only.
pub type AnimatorFactory = Box<dyn Fn(&BlockType) -> Option<Box<dyn AnimationUtil>>>;

/// A player-facing error raised on the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InGameError {
    /// Stable error code.
    pub code: String,
    /// Rendered message.
    pub message: String,
}

/// Everything the client side of the game lends to leaves.
pub struct ClientApi {
    /// Next-frame tasks and timed callbacks.
    pub scheduler: FrameScheduler<VisualTask>,
    /// Meshes shared per block type.
    pub meshes: MeshCache,
    shapes: Box<dyn ShapeLoader>,
    tessellator: Box<dyn Tessellator>,
    animators: HashMap<BlockPos, Box<dyn AnimationUtil>>,
    animator_factory: AnimatorFactory,
    /// Errors shown to the player, oldest first.
    pub in_game_errors: Vec<InGameError>,
    /// Whether block info lines are shown.
    pub extended_debug_info: bool,
}

impl fmt::Debug for ClientApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientApi")
            .field("pending_tasks", &self.scheduler.len())
            .field("mesh_sets", &self.meshes.len())
            .field("animators", &self.animators.len())
            .field("in_game_errors", &self.in_game_errors)
            .field("extended_debug_info", &self.extended_debug_info)
            .finish_non_exhaustive()
    }
}

fn headless_animator(block: &BlockType) -> Option<Box<dyn AnimationUtil>> {
    block
        .shape
        .as_ref()
        .map(|_| Box::new(HeadlessAnimator::new()) as Box<dyn AnimationUtil>)
}

impl ClientApi {
    /// Client backed by the given shape loader and tessellator, with
    /// headless animators for every shaped leaf.
    pub fn new(shapes: Box<dyn ShapeLoader>, tessellator: Box<dyn Tessellator>) -> Self {
        Self {
            scheduler: FrameScheduler::new(),
            meshes: MeshCache::new(),
            shapes,
            tessellator,
            animators: HashMap::new(),
            animator_factory: Box::new(headless_animator),
            in_game_errors: Vec::new(),
            extended_debug_info: false,
        }
    }

    /// Client over an in-memory shape table and box tessellation.
    pub fn headless(shapes: ShapeLibrary) -> Self {
        Self::new(Box::new(shapes), Box::new(BoxTessellator))
    }

    /// Replace how per-leaf animators are built.
    pub fn with_animator_factory(
        mut self,
        factory: impl Fn(&BlockType) -> Option<Box<dyn AnimationUtil>> + 'static,
    ) -> Self {
        self.animator_factory = Box::new(factory);
        self
    }

    /// Show an error to the player.
    pub fn trigger_ingame_error(&mut self, code: &str, message: String) {
        debug!(code, %message, "in-game error");
        self.in_game_errors.push(InGameError {
            code: code.to_string(),
            message,
        });
    }

    /// Animator of the leaf at `pos`.
    pub fn animator(&self, pos: BlockPos) -> Option<&dyn AnimationUtil> {
        self.animators.get(&pos).map(|a| a.as_ref())
    }

    pub(crate) fn animator_mut(&mut self, pos: BlockPos) -> Option<&mut (dyn AnimationUtil + 'static)> {
        self.animators.get_mut(&pos).map(|a| a.as_mut())
    }

    /// Whether the leaf at `pos` has an animator instance.
    pub fn has_animator(&self, pos: BlockPos) -> bool {
        self.animators.contains_key(&pos)
    }

    pub(crate) fn ensure_animator(&mut self, pos: BlockPos, block: &BlockType) {
        if self.animators.contains_key(&pos) {
            return;
        }
        if let Some(animator) = (self.animator_factory)(block) {
            self.animators.insert(pos, animator);
        }
    }

    /// Drop per-instance state of a removed leaf.
    pub fn forget(&mut self, pos: BlockPos) {
        self.animators.remove(&pos);
    }

    /// Fill in the shared mesh set of `block` using the animator at `pos`.
    pub fn prepare_meshes(&mut self, pos: BlockPos, block: &BlockType) {
        let wants_opened = block.attributes.opened_shape.is_some();
        let ready = self
            .meshes
            .get(&block.code)
            .is_some_and(|set| !set.needs_preparation(wants_opened));
        if ready {
            return;
        }
        let (closed_key, suffix) = visuals::dict_keys(block);
        let animator: Option<&mut dyn AnimationUtil> = match self.animators.get_mut(&pos) {
            Some(a) => Some(a.as_mut()),
            None => None,
        };
        self.meshes.prepare(
            block,
            &closed_key,
            suffix,
            self.shapes.as_ref(),
            self.tessellator.as_ref(),
            animator,
        );
    }

    /// Bind the animator at `pos` to the cached inputs of `track`.
    pub(crate) fn bind_track(&mut self, pos: BlockPos, code: &AssetLocation, track: AnimTrack) {
        let Some(animator) = self.animators.get_mut(&pos) else {
            return;
        };
        if let Some((key, mesh, shape)) = self.meshes.get(code).and_then(|set| set.track(track)) {
            animator.initialize_animator(key, mesh, shape);
        }
    }
}

/// What one client frame did.
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Static meshes baked this frame, by controller position.
    pub tessellated: Vec<(BlockPos, MeshData)>,
    /// Pipeline steps executed.
    pub tasks_run: usize,
}

/// Advance the client by one frame of `dt_ms`: re-tessellate dirty leaves,
/// then run whatever the scheduler releases.
pub fn run_frame(world: &mut dyn BlockAccessor, client: &mut ClientApi, dt_ms: u64) -> FrameReport {
    let mut report = FrameReport::default();

    for pos in world.take_dirty_blocks() {
        if world.leaf(pos).is_none() {
            continue;
        }
        if let Some(mesh) = visuals::on_tessellation(world, client, pos) {
            report.tessellated.push((pos, mesh));
        }
    }

    for (id, task) in client.scheduler.advance(dt_ms) {
        if let Some(id) = id {
            if let Some(leaf) = world.leaf_mut(task.pos) {
                leaf.state_mut().visuals.callbacks.retain(|c| *c != id);
            }
        }
        visuals::run_task(world, client, task);
        report.tasks_run += 1;
    }
    report
}
