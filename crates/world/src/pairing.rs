//! Partner discovery and the handedness fix-ups run when a leaf is placed.
//!
//! Partners are stored as offsets between controllers and resolved through
//! the world on every access. A link whose target no longer holds a leaf of
//! the same kind heals to `None` the first time it is followed.

use tracing::debug;

use slidingwindows_assets::{BehaviorKind, BLOCK_AIR};
use slidingwindows_core::{Axis, BlockFacing, BlockPos, Vec3i};

use crate::multiblock::{self, resolve_leaf};
use crate::{visuals, Api, BlockAccessor, Hand, Leaf};

/// Result of a partner search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Combinable {
    /// Controller of the combinable neighbour.
    pub other: Option<BlockPos>,
    /// Shift from the searched position to the controller cell the new leaf
    /// must take so both spans end exactly adjacent.
    pub shift: Vec3i,
}

/// Follow the `hand` link of the leaf at `pos` without touching the world.
pub fn resolve_partner(world: &dyn BlockAccessor, pos: BlockPos, hand: Hand) -> Option<BlockPos> {
    let leaf = world.leaf(pos)?;
    let target = pos + leaf.partner_offset(hand)?;
    world
        .leaf(target)
        .is_some_and(|other| other.kind() == leaf.kind())
        .then_some(target)
}

/// Follow the `hand` link of the leaf at `pos`, clearing it when stale.
pub fn partner(world: &mut dyn BlockAccessor, pos: BlockPos, hand: Hand) -> Option<BlockPos> {
    let offset = world.leaf(pos)?.partner_offset(hand)?;
    if let Some(target) = resolve_partner(world, pos, hand) {
        return Some(target);
    }
    debug!(%pos, ?hand, %offset, "dropping stale partner link");
    if let Some(leaf) = world.leaf_mut(pos) {
        leaf.set_partner_offset(hand, None);
    }
    world.mark_entity_dirty(pos);
    None
}

/// Link `a`'s `hand` slot to `b` and `b`'s opposite slot back to `a`.
pub fn link(world: &mut dyn BlockAccessor, a: BlockPos, hand: Hand, b: BlockPos) {
    if let Some(leaf) = world.leaf_mut(a) {
        leaf.set_partner_offset(hand, Some(b - a));
    }
    if let Some(leaf) = world.leaf_mut(b) {
        leaf.set_partner_offset(hand.other(), Some(a - b));
    }
    world.mark_entity_dirty(a);
    world.mark_entity_dirty(b);
    debug!(%a, %b, ?hand, "linked partners");
}

fn is_unpaired(world: &dyn BlockAccessor, pos: BlockPos) -> bool {
    resolve_partner(world, pos, Hand::Left).is_none()
        && resolve_partner(world, pos, Hand::Right).is_none()
}

/// Look for a leaf of `kind` to pair with on the `hand` side of `pos`.
///
/// The adjacent cell is probed first, then (for wide leaves) cells up to
/// `width` away. A candidate qualifies when it is unpaired, faces the same
/// way and, for windows, is pairable, and when the probed cell lies in its
/// column along the facing axis.
///
/// A left partner ends up uninverted with the new leaf inverted one cell to
/// its right; a right partner ends up inverted with the new leaf one cell to
/// its left. A neighbour with the wrong handedness is flipped over its own
/// cells, which puts its controller at the far end of its span.
pub fn find_combinable(
    world: &dyn BlockAccessor,
    kind: BehaviorKind,
    hand: Hand,
    yaw: f32,
    pos: BlockPos,
    width: i32,
) -> Combinable {
    let facing = BlockFacing::horizontal_from_yaw(yaw);
    let dir = hand.direction(facing);

    let Some((probe, other)) = (1..=width.max(1)).find_map(|i| {
        let probe = pos.offset(dir, i);
        resolve_leaf(world, probe, Some(kind)).map(|other| (probe, other))
    }) else {
        return Combinable::default();
    };
    let Some(leaf) = world.leaf(other) else {
        return Combinable::default();
    };

    let other_facing = leaf.facing_when_closed();
    let in_column = match other_facing.axis() {
        Axis::X => probe.x == other.x,
        Axis::Z => probe.z == other.z,
        Axis::Y => true,
    };
    let combinable = in_column
        && other_facing == facing
        && (kind != BehaviorKind::SlidingWindow || world.block(other).attributes.pairable)
        && is_unpaired(world, other);
    if !combinable {
        return Combinable::default();
    }

    let steps = if needs_flip(hand, leaf.invert()) {
        world.block(other).attributes.footprint_width()
    } else {
        1
    };
    let origin = other.offset(dir.opposite(), steps);
    Combinable {
        other: Some(other),
        shift: origin - pos,
    }
}

// A left partner must end up uninverted, a right partner inverted.
fn needs_flip(hand: Hand, invert: bool) -> bool {
    match hand {
        Hand::Left => invert,
        Hand::Right => !invert,
    }
}

/// Flip the handedness of the partner at `other`, seen from a leaf on its
/// `hand.other()` side, returning its controller afterwards.
///
/// Single-cell leaves flip in place. Wider leaves move their controller to
/// the far end of their span so they keep covering the same cells.
fn flip_partner(api: &mut Api<'_>, other: BlockPos, hand: Hand, yaw: f32, invert: bool) -> BlockPos {
    let facing = BlockFacing::horizontal_from_yaw(yaw);
    let other_width = api.world.block(other).attributes.footprint_width();
    if other_width > 1 {
        let moved = other.offset(hand.direction(facing).opposite(), other_width - 1);
        relocate(api, other, moved, yaw, invert);
        moved
    } else {
        if let Some(p) = api.world.leaf_mut(other).and_then(Leaf::pairing_mut) {
            p.invert = invert;
        }
        api.world.mark_entity_dirty(other);
        other
    }
}

/// Move the wide leaf at `from` to `to`, keeping its block type and taking
/// `yaw` and `invert`. Fillers follow the leaf.
fn relocate(api: &mut Api<'_>, from: BlockPos, to: BlockPos, yaw: f32, invert: bool) {
    let block_id = api.world.block_id(from);
    multiblock::clear_multiblock_parts(api.world, from);
    if let Some(client) = api.client.as_deref_mut() {
        visuals::cancel(api.world, client, from);
        client.forget(from);
    }
    api.world.set_block(BLOCK_AIR, from);
    api.world.trigger_neighbour_update(from);

    api.world.set_block(block_id, to);
    if let Some(pairing) = api.world.leaf_mut(to).and_then(Leaf::pairing_mut) {
        pairing.rotate_y_rad = yaw;
        pairing.invert = invert;
    }
    multiblock::place_multiblock_parts(api.world, to);
    debug!(%from, %to, "relocated partner leaf");
}

/// Orientation, pairing and box setup of the leaf at `pos`.
///
/// With `initial` set (fresh placement) the leaf looks for partners. A left
/// partner makes this leaf inverted and is itself un-inverted; a right
/// partner is inverted. Wide partners flip over their own cells by moving
/// their controller. Partner mutations only happen on the server. A
/// non-pairable window drops any saved links instead.
pub fn setup(api: &mut Api<'_>, pos: BlockPos, initial: bool) {
    let Some(leaf) = api.world.leaf(pos) else {
        return;
    };
    let kind = leaf.kind();
    let Some(pairing) = leaf.pairing().copied() else {
        finish_setup(api, pos);
        return;
    };
    let block = api.world.block(pos).clone();
    let width = block.attributes.footprint_width();
    let yaw = pairing.rotate_y_rad;
    let facing = pairing.facing();

    if initial && multiblock::pairing_enabled(&block) {
        let left = find_combinable(&*api.world, kind, Hand::Left, yaw, pos, width).other;
        if let Some(other) = left {
            if api.is_server() {
                let other_invert = api.world.leaf(other).is_some_and(Leaf::invert);
                if needs_flip(Hand::Left, other_invert) {
                    let moved = flip_partner(api, other, Hand::Left, yaw, false);
                    link(api.world, pos, Hand::Left, moved);
                    setup(api, moved, false);
                } else {
                    link(api.world, pos, Hand::Left, other);
                }
            }
            if let Some(p) = api.world.leaf_mut(pos).and_then(Leaf::pairing_mut) {
                p.invert = true;
            }
            api.world.mark_entity_dirty(pos);
        }

        let right = find_combinable(&*api.world, kind, Hand::Right, yaw, pos, width).other;
        if let (Some(other), true) = (right, api.is_server()) {
            let other_invert = api.world.leaf(other).is_some_and(Leaf::invert);
            if needs_flip(Hand::Right, other_invert) {
                let moved = flip_partner(api, other, Hand::Right, yaw, true);
                link(api.world, pos, Hand::Right, moved);
                setup(api, moved, false);
            } else {
                link(api.world, pos, Hand::Right, other);
            }
        }
    } else if initial && kind == BehaviorKind::SlidingWindow {
        if let Some(p) = api.world.leaf_mut(pos).and_then(Leaf::pairing_mut) {
            p.left = None;
            p.right = None;
            p.invert = false;
        }
        api.world.mark_entity_dirty(pos);
    }

    finish_setup(api, pos);
}

fn finish_setup(api: &mut Api<'_>, pos: BlockPos) {
    let block = api.world.block(pos).clone();
    if let Some(leaf) = api.world.leaf_mut(pos) {
        leaf.update_hitboxes(&block);
    }
    if let Some(client) = api.client.as_deref_mut() {
        visuals::update_static_mesh(api.world, client, pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryWorld;
    use slidingwindows_assets::{registry_from_str, BehaviorClasses};
    use std::sync::Arc;

    fn world() -> MemoryWorld {
        let mut classes = BehaviorClasses::new();
        classes.register_block_behavior_class("GlassDoor", BehaviorKind::GlassDoor);
        let registry = registry_from_str(
            r#"[{ "code": "x:door", "behavior": "GlassDoor", "attributes": { "width": 1, "height": 2 } }]"#,
            &classes,
        )
        .unwrap();
        MemoryWorld::server(Arc::new(registry))
    }

    fn place_door(world: &mut MemoryWorld, pos: BlockPos) {
        let id = world.registry().id_by_code("x:door").unwrap();
        world.set_block(id, pos);
    }

    #[test]
    fn stale_link_heals_on_access() {
        let mut w = world();
        let pos = BlockPos::new(0, 0, 0);
        place_door(&mut w, pos);
        w.leaf_mut(pos)
            .unwrap()
            .set_partner_offset(Hand::Left, Some(Vec3i::new(1, 0, 0)));

        assert_eq!(partner(&mut w, pos, Hand::Left), None);
        assert_eq!(w.leaf(pos).unwrap().partner_offset(Hand::Left), None);
        assert!(w.take_dirty_entities().contains(&pos));
    }

    #[test]
    fn link_is_mutual() {
        let mut w = world();
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(1, 0, 0);
        place_door(&mut w, a);
        place_door(&mut w, b);
        link(&mut w, a, Hand::Left, b);

        assert_eq!(partner(&mut w, a, Hand::Left), Some(b));
        assert_eq!(partner(&mut w, b, Hand::Right), Some(a));
    }

    #[test]
    fn neighbour_east_of_a_north_door_is_on_the_left() {
        let mut w = world();
        place_door(&mut w, BlockPos::new(1, 0, 0));
        let found = find_combinable(&w, BehaviorKind::GlassDoor, Hand::Left, 0.0, BlockPos::new(0, 0, 0), 1);
        assert_eq!(found.other, Some(BlockPos::new(1, 0, 0)));

        let right = find_combinable(&w, BehaviorKind::GlassDoor, Hand::Right, 0.0, BlockPos::new(0, 0, 0), 1);
        assert_eq!(right.other, None);
    }

    #[test]
    fn paired_or_turned_neighbours_are_not_combinable() {
        let mut w = world();
        let other = BlockPos::new(1, 0, 0);
        place_door(&mut w, other);
        if let Some(p) = w.leaf_mut(other).and_then(Leaf::pairing_mut) {
            p.rotate_y_rad = std::f32::consts::FRAC_PI_2;
        }
        let found = find_combinable(&w, BehaviorKind::GlassDoor, Hand::Left, 0.0, BlockPos::new(0, 0, 0), 1);
        assert_eq!(found, Combinable::default());
    }
}
