//! Leaf lifecycle: toggling, hand interaction, activation and world edits.

use thiserror::Error;
use tracing::{debug, warn};

use slidingwindows_assets::{BehaviorKind, BlockType};
use slidingwindows_audio::SoundRequest;
use slidingwindows_core::{facing::wrap_radians, AssetLocation, BlockPos, TreeAttribute, DEG2RAD};

use crate::multiblock::{leaf_footprint, resolve_leaf};
use crate::pairing::{self, partner};
use crate::{door, trapdoor, visuals, window, Api, BlockAccessor, BlockSelection, GameMode, Hand, Leaf, Player};

/// Range of the open and close sounds.
pub const SOUND_RANGE: f32 = 32.0;

/// Why a hand interaction was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteractError {
    /// The leaf is not `handopenable` and the player is not in creative mode.
    #[error("this {0} cannot be opened by hand")]
    NotHandOpenable(&'static str),
    /// Nothing to interact with at the position.
    #[error("no door, window or trapdoor at {0}")]
    NoLeaf(BlockPos),
}

impl InteractError {
    /// In-game error code.
    pub fn code(&self) -> &'static str {
        match self {
            InteractError::NotHandOpenable(_) => "nothandopenable",
            InteractError::NoLeaf(_) => "noleaf",
        }
    }
}

fn pitches(kind: BehaviorKind) -> (f32, f32) {
    match kind {
        BehaviorKind::SlidingWindow => (window::OPEN_PITCH, window::CLOSE_PITCH),
        BehaviorKind::GlassDoor | BehaviorKind::GlassTrapdoor => (door::OPEN_PITCH, door::CLOSE_PITCH),
    }
}

fn sound(code: &str, pos: BlockPos) -> Option<SoundRequest> {
    match AssetLocation::parse(code) {
        Ok(location) => Some(SoundRequest::new(location, pos.center()).with_range(SOUND_RANGE)),
        Err(err) => {
            warn!(code, %err, "skipping unparsable sound code");
            None
        }
    }
}

fn play_toggle_sounds(world: &mut dyn BlockAccessor, block: &BlockType, kind: BehaviorKind, pos: BlockPos, open: bool) {
    let attrs = &block.attributes;
    let secondary = if open {
        attrs.secondary_sounds.open.as_deref()
    } else {
        attrs.secondary_sounds.close.as_deref()
    };
    if let Some(request) = secondary.and_then(|code| sound(code, pos)) {
        let pitch = if open { 0.8 } else { 1.0 };
        world.play_sound_at(request.with_pitch(pitch).with_volume(2.0));
    }

    let (open_pitch, close_pitch) = pitches(kind);
    let (code, pitch) = if open {
        (attrs.open_sound_code(), open_pitch)
    } else {
        (attrs.close_sound_code(), close_pitch)
    };
    if let Some(request) = sound(code, pos) {
        world.play_sound_at(request.with_pitch(pitch));
    }
}

/// Notify the neighbours of every footprint cell of the leaf at `pos`.
pub fn update_neighbours(world: &mut dyn BlockAccessor, pos: BlockPos) {
    for cell in leaf_footprint(world, pos) {
        world.trigger_neighbour_update(cell);
    }
}

/// Move the leaf at `pos` into the `open` state.
///
/// Returns `false` when it already is there. The source leaf plays its sounds
/// and forwards the new state to its partners (the left one only when this
/// leaf is inverted); a toggle arriving from a partner is silent and never
/// forwarded again.
pub fn toggle(api: &mut Api<'_>, pos: BlockPos, open: bool, from_partner: bool) -> bool {
    let Some(leaf) = api.world.leaf_mut(pos) else {
        return false;
    };
    if leaf.is_open() == open {
        return false;
    }
    leaf.state_mut().open = open;
    let kind = leaf.kind();
    let invert = leaf.invert();
    let block = api.world.block(pos).clone();
    debug!(%pos, open, from_partner, "toggle");

    if !from_partner {
        play_toggle_sounds(api.world, &block, kind, pos, open);
    }

    if let Some(client) = api.client.as_deref_mut() {
        visuals::animate(api.world, client, pos, open);
        api.world.mark_block_dirty(pos);
    }

    if !from_partner {
        if invert {
            if let Some(left) = partner(api.world, pos, Hand::Left) {
                toggle(api, left, open, true);
            }
        }
        if let Some(right) = partner(api.world, pos, Hand::Right) {
            toggle(api, right, open, true);
        }
    }

    if api.is_server() {
        api.world.mark_entity_dirty(pos);
        update_neighbours(api.world, pos);
    }
    true
}

/// A player uses the block at `pos` (controller or filler).
pub fn interact(api: &mut Api<'_>, player: &Player, pos: BlockPos) -> Result<(), InteractError> {
    let controller = resolve_leaf(&*api.world, pos, None).ok_or(InteractError::NoLeaf(pos))?;
    let block = api.world.block(controller);
    let noun = block.behavior.map_or("door", BehaviorKind::noun);

    if !block.attributes.handopenable && player.game_mode != GameMode::Creative {
        let err = InteractError::NotHandOpenable(noun);
        if let Some(client) = api.client.as_deref_mut() {
            client.trigger_ingame_error(err.code(), format!("This {noun} cannot be opened by hand."));
        }
        return Err(err);
    }

    let open = api.world.leaf(controller).is_some_and(|l| !l.is_open());
    toggle(api, controller, open, false);
    Ok(())
}

/// Scripted activation of the block at `pos`.
///
/// Without arguments the leaf flips. `opened` (or the door key `isOpen`)
/// requests an explicit state; a leaf already there is left alone.
pub fn activate(api: &mut Api<'_>, pos: BlockPos, args: Option<&TreeAttribute>) -> bool {
    let Some(controller) = resolve_leaf(&*api.world, pos, None) else {
        return false;
    };
    let Some(current) = api.world.leaf(controller).map(Leaf::is_open) else {
        return false;
    };
    let open = args.map_or(!current, |args| {
        args.get_bool_or("opened", args.get_bool_or("isOpen", !current))
    });
    open != current && toggle(api, controller, open, false)
}

/// Bring a freshly created or loaded leaf up: boxes, meshes and animator.
pub fn initialize(api: &mut Api<'_>, pos: BlockPos) {
    pairing::setup(api, pos, false);
    if let Some(client) = api.client.as_deref_mut() {
        visuals::on_loaded(api.world, client, pos);
    }
}

/// Orient the leaf at `pos` from the placing player and run pairing.
pub fn on_block_placed(api: &mut Api<'_>, pos: BlockPos, player: &Player, selection: &BlockSelection) {
    let yaw = crate::multiblock::placement_yaw(player, selection);
    match api.world.leaf_mut(pos) {
        Some(Leaf::Trapdoor(t)) => {
            let (face, rot_deg) = trapdoor::placement_orientation(selection);
            t.attached_face = face;
            t.rot_deg = rot_deg;
        }
        Some(leaf) => {
            if let Some(pairing) = leaf.pairing_mut() {
                pairing.rotate_y_rad = yaw;
            }
        }
        None => return,
    }
    api.world.mark_entity_dirty(pos);
    pairing::setup(api, pos, true);
}

/// Apply a world-edit rotation of `degrees` about Y to the leaf at `pos`.
pub fn on_transformed(api: &mut Api<'_>, pos: BlockPos, degrees: i32) {
    match api.world.leaf_mut(pos) {
        Some(Leaf::Trapdoor(t)) => trapdoor::on_transformed(t, degrees),
        Some(leaf) => {
            if let Some(pairing) = leaf.pairing_mut() {
                pairing.rotate_y_rad = wrap_radians(pairing.rotate_y_rad - degrees as f32 * DEG2RAD);
            }
        }
        None => return,
    }
    api.world.mark_entity_dirty(pos);
    pairing::setup(api, pos, false);
}

/// Apply a replicated tree to the leaf at `pos`.
///
/// Boxes are rebuilt from the new state. On the client a changed open flag
/// plays the transition; otherwise the resting mesh is refreshed unless an
/// animation is on screen.
pub fn from_tree(api: &mut Api<'_>, pos: BlockPos, tree: &TreeAttribute) {
    let block = api.world.block(pos).clone();
    let Some(leaf) = api.world.leaf_mut(pos) else {
        return;
    };
    let was_open = leaf.is_open();
    leaf.read_tree(tree);
    leaf.update_hitboxes(&block);

    if let Some(client) = api.client.as_deref_mut() {
        visuals::on_synced(api.world, client, pos, was_open);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientApi, MemoryWorld};
    use glam::Vec3;
    use slidingwindows_assets::{registry_from_str, BehaviorClasses};
    use slidingwindows_core::BlockFacing;
    use std::sync::Arc;

    const BLOCKS: &str = r#"[
        { "code": "x:door", "behavior": "GlassDoor",
          "collisionBoxes": [{ "x1": 0, "y1": 0, "z1": 0, "x2": 1, "y2": 2, "z2": 0.1 }],
          "attributes": { "width": 1, "height": 2, "openSound": "x:sounds/open",
                          "secondarySounds": { "close": "x:sounds/latch" } } },
        { "code": "x:bars", "behavior": "GlassDoor",
          "attributes": { "width": 1, "height": 1, "handopenable": false } }
    ]"#;

    fn world() -> MemoryWorld {
        let mut classes = BehaviorClasses::new();
        classes.register_block_behavior_class("GlassDoor", BehaviorKind::GlassDoor);
        MemoryWorld::server(Arc::new(registry_from_str(BLOCKS, &classes).unwrap()))
    }

    fn place(world: &mut MemoryWorld, code: &str, pos: BlockPos) {
        let id = world.registry().id_by_code(code).unwrap();
        world.set_block(id, pos);
        initialize(&mut Api::server(world), pos);
    }

    #[test]
    fn toggling_to_the_current_state_does_nothing() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);

        assert!(!toggle(&mut Api::server(&mut w), pos, false, false));
        assert!(w.sounds().is_empty());
        assert!(w.neighbour_updates().is_empty());
    }

    #[test]
    fn open_plays_the_open_sound_at_door_pitch() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);

        assert!(toggle(&mut Api::server(&mut w), pos, true, false));
        let sounds = w.take_sounds();
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].location.to_string(), "x:sounds/open");
        assert_eq!(sounds[0].pitch, door::OPEN_PITCH);
        assert_eq!(w.neighbour_updates().len(), 2);
    }

    #[test]
    fn closing_adds_the_secondary_sound() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);
        toggle(&mut Api::server(&mut w), pos, true, false);
        w.take_sounds();

        toggle(&mut Api::server(&mut w), pos, false, false);
        let sounds = w.take_sounds();
        assert_eq!(sounds.len(), 2);
        assert_eq!(sounds[0].location.to_string(), "x:sounds/latch");
        assert_eq!(sounds[0].volume, 2.0);
        assert_eq!(sounds[1].pitch, door::CLOSE_PITCH);
    }

    #[test]
    fn activation_arguments_pick_the_state() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);

        let mut args = TreeAttribute::new();
        args.set_bool("opened", false);
        assert!(!activate(&mut Api::server(&mut w), pos, Some(&args)));
        args.set_bool("opened", true);
        assert!(activate(&mut Api::server(&mut w), pos, Some(&args)));
        assert!(w.leaf(pos).unwrap().is_open());
        assert!(activate(&mut Api::server(&mut w), pos, None));
        assert!(!w.leaf(pos).unwrap().is_open());
    }

    #[test]
    fn bars_refuse_survival_hands_with_a_client_error() {
        let registry = world().registry_arc();
        let mut w = MemoryWorld::client(registry);
        let mut client = ClientApi::headless(Default::default());
        let pos = BlockPos::new(0, 0, 0);
        let id = w.registry().id_by_code("x:bars").unwrap();
        w.set_block(id, pos);

        let survivor = Player::new(Vec3::ZERO, GameMode::Survival);
        let err = interact(&mut Api::client(&mut w, &mut client), &survivor, pos).unwrap_err();
        assert_eq!(err.code(), "nothandopenable");
        assert_eq!(client.in_game_errors.len(), 1);
        assert_eq!(client.in_game_errors[0].message, "This door cannot be opened by hand.");

        let builder = Player::new(Vec3::ZERO, GameMode::Creative);
        interact(&mut Api::client(&mut w, &mut client), &builder, pos).unwrap();
        assert!(w.leaf(pos).unwrap().is_open());
    }

    #[test]
    fn world_edit_rotation_turns_the_facing() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);
        on_transformed(&mut Api::server(&mut w), pos, 90);
        assert_eq!(w.leaf(pos).unwrap().facing_when_closed(), BlockFacing::East);
    }

    #[test]
    fn replicated_state_updates_boxes() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place(&mut w, "x:door", pos);
        let closed = w.leaf(pos).unwrap().col_sel_boxes().to_vec();

        let mut tree = TreeAttribute::new();
        tree.set_bool("isOpen", true);
        from_tree(&mut Api::server(&mut w), pos, &tree);
        assert_ne!(w.leaf(pos).unwrap().col_sel_boxes(), closed.as_slice());
    }
}
