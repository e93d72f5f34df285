//! Client-side mesh swap and animation sequencing for leaves.
//!
//! A toggle keeps the resting static mesh in the chunk for one more
//! tessellation while the animator takes over, hides it on the next frame,
//! and after six clip durations restores it and winds the animator down.
//! Every deferred step is a [`VisualTask`] on the client's
//! [`FrameScheduler`](slidingwindows_render::FrameScheduler), so removal can
//! drain them by position.

use glam::{Mat4, Vec3};
use tracing::debug;

use slidingwindows_assets::{BehaviorKind, BlockType};
use slidingwindows_core::{BlockPos, RAD2DEG};
use slidingwindows_render::{
    around, static_mesh_restore_delay_ms, AnimTrack, AnimationMetaData, MeshData,
    ANIMATION_FINISH_DELAY_MS, LEGACY_OPENED_ANIMATION,
};

use crate::{door, trapdoor, window, BlockAccessor, ClientApi, Leaf, VisualFlags};

/// One deferred pipeline step for the leaf at `pos`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualTask {
    /// Controller position of the leaf.
    pub pos: BlockPos,
    /// What to do.
    pub step: VisualStep,
}

/// Pipeline steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualStep {
    /// Stop adding the static mesh, then mark dirty on the following frame.
    StopStaticTessellation,
    /// Re-tessellate.
    MarkDirty,
    /// Put the resting mesh back after the clip has played out.
    RestoreStaticMesh {
        /// Track the next toggle will play.
        next: AnimTrack,
    },
    /// Let the next tessellation pass wind the animation down.
    ArmStopsSoon {
        /// Track to pre-warm afterwards.
        next: AnimTrack,
    },
    /// Bind the animator to a track ahead of time.
    EnsureTrack(AnimTrack),
    /// Mark dirty and stop the animator shortly after.
    ScheduleFinish,
    /// Hide the animator and stop both clips.
    FinishAnimation,
}

impl VisualTask {
    fn new(pos: BlockPos, step: VisualStep) -> Self {
        Self { pos, step }
    }
}

/// Animator dict key of the closed shape and the suffix of the opened one.
pub fn dict_keys(block: &BlockType) -> (String, &'static str) {
    let shape_key = || {
        block
            .shape
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| block.code.to_string())
    };
    match block.behavior {
        Some(BehaviorKind::GlassTrapdoor) => {
            (trapdoor::closed_dict_key(block), trapdoor::OPENED_DICT_SUFFIX)
        }
        Some(BehaviorKind::SlidingWindow) => (shape_key(), window::OPENED_DICT_SUFFIX),
        Some(BehaviorKind::GlassDoor) | None => (shape_key(), door::OPENED_DICT_SUFFIX),
    }
}

fn clip_code(block: &BlockType, track: AnimTrack) -> &str {
    match track {
        AnimTrack::Opening => &block.attributes.opening_animation_code,
        AnimTrack::Closing => &block.attributes.closing_animation_code,
    }
}

fn flags(world: &dyn BlockAccessor, pos: BlockPos) -> VisualFlags {
    world
        .leaf(pos)
        .map(|leaf| leaf.state().visuals.flags)
        .unwrap_or_default()
}

fn update_flags(world: &mut dyn BlockAccessor, pos: BlockPos, f: impl FnOnce(&mut VisualFlags)) {
    if let Some(leaf) = world.leaf_mut(pos) {
        f(&mut leaf.state_mut().visuals.flags);
    }
}

/// Push the render-animation flag into the animator's renderer.
fn sync_should_render(world: &dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) {
    let render = flags(world, pos).contains(VisualFlags::RENDER_ANIMATION);
    if let Some(renderer) = client.animator_mut(pos).and_then(|a| a.renderer()) {
        renderer.should_render = render;
    }
}

fn uses_advanced_animation(world: &dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) -> bool {
    let block = world.block(pos);
    client.has_animator(pos)
        && client
            .meshes
            .get(&block.code)
            .is_some_and(|set| set.advanced_animation_available())
}

/// Rebuild the oriented resting mesh of the leaf at `pos` for its current
/// state and line the animator's renderer up with it.
pub fn update_static_mesh(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) {
    let block = world.block(pos).clone();
    let Some(leaf) = world.leaf(pos) else {
        return;
    };
    client.ensure_animator(pos, &block);
    client.prepare_meshes(pos, &block);
    let Some(base) = client
        .meshes
        .get(&block.code)
        .and_then(|set| set.static_mesh(leaf.is_open()))
    else {
        return;
    };

    let center = Vec3::splat(0.5);
    let mut mesh: MeshData;
    match leaf {
        Leaf::Trapdoor(t) => {
            let tf = trapdoor::transform(t);
            mesh = base.clone();
            mesh.matrix_transform(&tf);
            if let Some(renderer) = client.animator_mut(pos).and_then(|a| a.renderer()) {
                renderer.custom_transform = Some(tf);
            }
        }
        Leaf::SlidingWindow(_) | Leaf::Door(_) => {
            let pairing = leaf.pairing().copied().unwrap_or_default();
            let rot = pairing.mesh_yaw();
            mesh = if rot != 0.0 {
                base.rotated_y(center, rot)
            } else {
                base.clone()
            };
            if pairing.invert {
                mesh.matrix_transform(&around(center, Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))));
            }
            if let Some(renderer) = client.animator_mut(pos).and_then(|a| a.renderer()) {
                renderer.rotation_deg_y = rot * RAD2DEG;
                renderer.scale_x = if pairing.invert { -1.0 } else { 1.0 };
                renderer.backface_culling = !pairing.invert;
            }
        }
    }

    if let Some(leaf) = world.leaf_mut(pos) {
        leaf.state_mut().visuals.static_mesh = Some(mesh);
    }
}

/// Bind the animator of the leaf at `pos` to `track`. Returns `false` when
/// the leaf has no animator.
pub fn ensure_track(world: &dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, track: AnimTrack) -> bool {
    if !client.has_animator(pos) {
        return false;
    }
    let block = world.block(pos);
    client.prepare_meshes(pos, block);
    client.bind_track(pos, &block.code, track);
    true
}

/// Run (or drop) the leaf's pending timed callbacks right now.
fn complete_pending(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, invoke: bool) {
    let ids = match world.leaf_mut(pos) {
        Some(leaf) => std::mem::take(&mut leaf.state_mut().visuals.callbacks),
        None => return,
    };
    for id in ids {
        if let Some(task) = client.scheduler.unregister_callback(id) {
            if invoke {
                run_task(world, client, task);
            }
        }
    }
}

fn register(world: &mut dyn BlockAccessor, client: &mut ClientApi, task: VisualTask, delay_ms: u64) {
    let id = client.scheduler.register_callback(task, delay_ms);
    if let Some(leaf) = world.leaf_mut(task.pos) {
        leaf.state_mut().visuals.callbacks.push(id);
    }
}

/// Start `track` and queue the mesh-swap pipeline.
fn start(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, track: AnimTrack) {
    let rendering = flags(world, pos).contains(VisualFlags::RENDER_ANIMATION);
    complete_pending(world, client, pos, !rendering);
    if !ensure_track(world, client, pos, track) {
        return;
    }

    let block = world.block(pos).clone();
    let ease = block.attributes.ease_speed(track == AnimTrack::Opening);

    update_flags(world, pos, |f| {
        f.insert(VisualFlags::TESSELLATE_STATIC | VisualFlags::RENDER_ANIMATION)
    });
    sync_should_render(world, client, pos);
    if let Some(animator) = client.animator_mut(pos) {
        animator.start_animation(AnimationMetaData::eased(clip_code(&block, track), ease));
    }
    update_static_mesh(world, client, pos);
    world.mark_block_dirty(pos);

    client
        .scheduler
        .enqueue_before_next_frame(VisualTask::new(pos, VisualStep::StopStaticTessellation));
    register(
        world,
        client,
        VisualTask::new(pos, VisualStep::RestoreStaticMesh { next: track.next() }),
        static_mesh_restore_delay_ms(ease),
    );
    debug!(%pos, ?track, ease, "animation started");
}

/// Single-clip fallback for content without an opened shape or animator.
fn animate_legacy(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, open: bool) {
    update_static_mesh(world, client, pos);
    let easing = world
        .block(pos)
        .attributes
        .easing_speed
        .unwrap_or(slidingwindows_render::DEFAULT_EASE_SPEED);
    if let Some(animator) = client.animator_mut(pos) {
        if open {
            animator.start_animation(AnimationMetaData::eased(LEGACY_OPENED_ANIMATION, easing));
        } else {
            animator.stop_animation(LEGACY_OPENED_ANIMATION);
        }
    }
    world.mark_block_dirty(pos);
}

/// Play the transition of the leaf at `pos` into the `open` state.
pub fn animate(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, open: bool) {
    let block = world.block(pos).clone();
    client.ensure_animator(pos, &block);
    client.prepare_meshes(pos, &block);
    if !uses_advanced_animation(world, client, pos) {
        animate_legacy(world, client, pos, open);
        return;
    }

    let track = AnimTrack::towards(open);
    update_static_mesh(world, client, pos);
    start(world, client, pos, track);
    world.mark_block_dirty(pos);
}

/// Client-side setup of a freshly created or loaded leaf.
pub fn on_loaded(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) {
    let block = world.block(pos).clone();
    let Some(open) = world.leaf(pos).map(Leaf::is_open) else {
        return;
    };
    client.ensure_animator(pos, &block);
    client.prepare_meshes(pos, &block);

    if uses_advanced_animation(world, client, pos) {
        ensure_track(world, client, pos, AnimTrack::towards(!open));
        update_static_mesh(world, client, pos);
        update_flags(world, pos, |f| f.remove(VisualFlags::RENDER_ANIMATION));
        sync_should_render(world, client, pos);
    } else {
        update_static_mesh(world, client, pos);
        let easing = block
            .attributes
            .easing_speed
            .unwrap_or(slidingwindows_render::DEFAULT_EASE_SPEED);
        if let Some(animator) = client.animator_mut(pos) {
            if open && !animator.is_active(LEGACY_OPENED_ANIMATION) {
                animator.start_animation(AnimationMetaData::eased(LEGACY_OPENED_ANIMATION, easing));
            }
        }
    }
    world.mark_block_dirty(pos);
}

/// Client reaction to replicated state.
pub fn on_synced(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos, was_open: bool) {
    let Some(open) = world.leaf(pos).map(Leaf::is_open) else {
        return;
    };
    if open != was_open && client.has_animator(pos) {
        animate(world, client, pos, open);
        return;
    }

    ensure_track(world, client, pos, AnimTrack::towards(!open));
    if !flags(world, pos).contains(VisualFlags::RENDER_ANIMATION) {
        update_static_mesh(world, client, pos);
        world.mark_block_dirty(pos);
    }
}

/// Tessellation pass for the leaf at `pos`: the static mesh to bake, if any.
///
/// A pass that finds the leaf armed to stop queues the wind-down.
pub fn on_tessellation(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) -> Option<MeshData> {
    let visuals = &mut world.leaf_mut(pos)?.state_mut().visuals;
    if !visuals.flags.contains(VisualFlags::TESSELLATE_STATIC) {
        return None;
    }
    let mesh = visuals.static_mesh.as_ref().filter(|m| m.vertex_count() > 0)?.clone();

    if visuals
        .flags
        .contains(VisualFlags::RENDER_ANIMATION | VisualFlags::STOPS_SOON)
    {
        visuals.flags.remove(VisualFlags::STOPS_SOON);
        client
            .scheduler
            .enqueue_before_next_frame(VisualTask::new(pos, VisualStep::ScheduleFinish));
    }
    Some(mesh)
}

/// Execute one pipeline step.
pub fn run_task(world: &mut dyn BlockAccessor, client: &mut ClientApi, task: VisualTask) {
    let pos = task.pos;
    if world.leaf(pos).is_none() {
        return;
    }
    match task.step {
        VisualStep::StopStaticTessellation => {
            update_flags(world, pos, |f| f.remove(VisualFlags::TESSELLATE_STATIC));
            client
                .scheduler
                .enqueue_before_next_frame(VisualTask::new(pos, VisualStep::MarkDirty));
        }
        VisualStep::MarkDirty => world.mark_block_dirty(pos),
        VisualStep::RestoreStaticMesh { next } => {
            update_static_mesh(world, client, pos);
            update_flags(world, pos, |f| f.insert(VisualFlags::TESSELLATE_STATIC));
            client
                .scheduler
                .enqueue_before_next_frame(VisualTask::new(pos, VisualStep::ArmStopsSoon { next }));
        }
        VisualStep::ArmStopsSoon { next } => {
            update_flags(world, pos, |f| f.insert(VisualFlags::STOPS_SOON));
            world.mark_block_dirty(pos);
            client
                .scheduler
                .enqueue_before_next_frame(VisualTask::new(pos, VisualStep::EnsureTrack(next)));
        }
        VisualStep::EnsureTrack(track) => {
            ensure_track(world, client, pos, track);
        }
        VisualStep::ScheduleFinish => {
            world.mark_block_dirty(pos);
            register(
                world,
                client,
                VisualTask::new(pos, VisualStep::FinishAnimation),
                ANIMATION_FINISH_DELAY_MS,
            );
        }
        VisualStep::FinishAnimation => {
            if !client.has_animator(pos) {
                return;
            }
            update_flags(world, pos, |f| {
                f.insert(VisualFlags::TESSELLATE_STATIC);
                f.remove(VisualFlags::RENDER_ANIMATION);
            });
            sync_should_render(world, client, pos);
            let block = world.block(pos);
            if let Some(animator) = client.animator_mut(pos) {
                animator.stop_animation(clip_code(block, AnimTrack::Opening));
                animator.stop_animation(clip_code(block, AnimTrack::Closing));
            }
            debug!(%pos, "animation finished");
        }
    }
}

/// Drop all pending work of the leaf at `pos` and return it to rest.
pub fn cancel(world: &mut dyn BlockAccessor, client: &mut ClientApi, pos: BlockPos) {
    let dropped = client.scheduler.cancel_where(|task| task.pos == pos);
    if let Some(leaf) = world.leaf_mut(pos) {
        let visuals = &mut leaf.state_mut().visuals;
        visuals.callbacks.clear();
        visuals.flags.remove(VisualFlags::STOPS_SOON | VisualFlags::RENDER_ANIMATION);
        visuals.flags.insert(VisualFlags::TESSELLATE_STATIC);
    }
    sync_should_render(world, client, pos);
    if let Some(renderer) = client.animator_mut(pos).and_then(|a| a.renderer()) {
        renderer.should_render = false;
    }

    let block = world.block(pos);
    if let Some(animator) = client.animator_mut(pos) {
        animator.stop_animation(clip_code(block, AnimTrack::Opening));
        animator.stop_animation(clip_code(block, AnimTrack::Closing));
        animator.stop_animation(LEGACY_OPENED_ANIMATION);
    }
    if dropped > 0 {
        debug!(%pos, dropped, "cancelled visual tasks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidingwindows_assets::{registry_from_str, BehaviorClasses};

    fn block(json: &str) -> BlockType {
        let mut classes = BehaviorClasses::new();
        classes.register_block_behavior_class("SlidingWindow", BehaviorKind::SlidingWindow);
        classes.register_block_behavior_class("GlassTrapdoor", BehaviorKind::GlassTrapdoor);
        let registry = registry_from_str(json, &classes).unwrap();
        let block = registry.iter().find(|b| !b.is_air() && !b.is_filler()).unwrap().clone();
        block
    }

    #[test]
    fn window_keys_use_the_shape_and_alt_suffix() {
        let b = block(r#"[{ "code": "x:window", "behavior": "SlidingWindow", "shape": "x:shapes/window" }]"#);
        assert_eq!(dict_keys(&b), ("x:shapes/window".to_string(), "-alt"));
    }

    #[test]
    fn trapdoor_keys_use_the_style() {
        let b = block(
            r#"[{ "code": "x:hatch", "behavior": "GlassTrapdoor", "variant": { "style": "leaded" } }]"#,
        );
        assert_eq!(dict_keys(&b), ("trapdoor-leaded".to_string(), "-open"));
    }
}
