//! Multiblock footprints: placement, filler stamping and removal.

use thiserror::Error;
use tracing::{debug, warn};

use slidingwindows_assets::{BehaviorKind, BlockId, BlockType, BLOCK_AIR};
use slidingwindows_core::{adjacent_offset, snap_yaw, BlockPos, Cuboid};

use crate::pairing::find_combinable;
use crate::{door, interaction, visuals, window, Api, BlockAccessor, BlockSelection, Hand, Leaf, Player};

/// Reasons a placement is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// A footprint cell holds a block that may not be replaced.
    #[error("not enough space for the multiblock at {0}")]
    NotEnoughSpace(BlockPos),
    /// The block id is not registered.
    #[error("unknown block id {0}")]
    UnknownBlock(BlockId),
}

impl PlacementError {
    /// Player-facing failure code.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::NotEnoughSpace(_) => "notenoughspace",
            PlacementError::UnknownBlock(_) => "unknownblock",
        }
    }
}

/// Footprint size as `(width, height, depth)`.
///
/// Doors are as deep as they are wide so an open leaf has room to swing;
/// windows are one block thick and trapdoors a single cell.
pub fn footprint_dims(block: &BlockType) -> (i32, i32, i32) {
    let attrs = &block.attributes;
    match block.behavior {
        Some(BehaviorKind::GlassDoor) => {
            let width = attrs.footprint_width();
            (width, attrs.footprint_height(), width)
        }
        Some(BehaviorKind::SlidingWindow) => (attrs.footprint_width(), attrs.footprint_height(), 1),
        Some(BehaviorKind::GlassTrapdoor) | None => (1, 1, 1),
    }
}

/// Every cell of `block`'s footprint with its controller at `pos`, the
/// controller first.
pub fn footprint(block: &BlockType, pos: BlockPos, yaw: f32, invert: bool) -> Vec<BlockPos> {
    let (width, height, depth) = footprint_dims(block);
    let mut cells = Vec::with_capacity((width * height * depth) as usize);
    for dx in 0..width {
        for dy in 0..height {
            for dz in 0..depth {
                cells.push(pos + adjacent_offset(dx, dz, dy, yaw, invert));
            }
        }
    }
    cells
}

/// Footprint of the leaf stored at `pos`.
pub fn leaf_footprint(world: &dyn BlockAccessor, pos: BlockPos) -> Vec<BlockPos> {
    let (yaw, invert) = world
        .leaf(pos)
        .and_then(Leaf::pairing)
        .map(|p| (p.rotate_y_rad, p.invert))
        .unwrap_or_default();
    footprint(world.block(pos), pos, yaw, invert)
}

/// Controller position of the leaf covering `pos`.
///
/// `pos` itself wins when it holds a leaf; a filler is followed back to its
/// controller. With `kind` set, leaves of other kinds are ignored.
pub fn resolve_leaf(
    world: &dyn BlockAccessor,
    pos: BlockPos,
    kind: Option<BehaviorKind>,
) -> Option<BlockPos> {
    let matches = |p: BlockPos| {
        world
            .leaf(p)
            .is_some_and(|leaf| kind.map_or(true, |k| leaf.kind() == k))
    };
    if matches(pos) {
        return Some(pos);
    }
    let controller = pos + world.block(pos).offset_inv()?;
    matches(controller).then_some(controller)
}

/// Yaw a leaf placed from `selection` faces: towards the player, snapped to
/// a quarter turn.
pub fn placement_yaw(player: &Player, selection: &BlockSelection) -> f32 {
    let target = if selection.did_offset {
        selection.position.neighbor(selection.face.opposite())
    } else {
        selection.position
    };
    let dx = player.position.x - (target.x as f32 + selection.hit_position.x);
    let dz = player.position.z - (target.z as f32 + selection.hit_position.z);
    snap_yaw(dx.atan2(dz))
}

/// Whether `block` looks for partners when placed.
pub fn pairing_enabled(block: &BlockType) -> bool {
    match block.behavior {
        Some(BehaviorKind::GlassDoor) => true,
        Some(BehaviorKind::SlidingWindow) => block.attributes.pairable,
        Some(BehaviorKind::GlassTrapdoor) | None => false,
    }
}

/// Controller cell and handedness a placement at `pos` resolves to.
///
/// A combinable left neighbour makes the new leaf inverted. Either way the
/// controller moves to the cell next to the partner's span.
fn placement_origin(
    world: &dyn BlockAccessor,
    block: &BlockType,
    pos: BlockPos,
    yaw: f32,
) -> (BlockPos, bool) {
    let Some(kind) = block.behavior.filter(|_| pairing_enabled(block)) else {
        return (pos, false);
    };
    let width = block.attributes.footprint_width();

    let left = find_combinable(world, kind, Hand::Left, yaw, pos, width);
    if left.other.is_some() {
        return (pos + left.shift, true);
    }
    let right = find_combinable(world, kind, Hand::Right, yaw, pos, width);
    if right.other.is_some() {
        return (pos + right.shift, false);
    }
    (pos, false)
}

/// Check that every footprint cell of a placement may be overwritten.
pub fn can_place_block(
    world: &dyn BlockAccessor,
    player: &Player,
    selection: &BlockSelection,
    block_id: BlockId,
) -> Result<(), PlacementError> {
    let block = world
        .registry()
        .get(block_id)
        .ok_or(PlacementError::UnknownBlock(block_id))?;
    let yaw = placement_yaw(player, selection);
    let (origin, invert) = placement_origin(world, block, selection.position, yaw);

    for cell in footprint(block, origin, yaw, invert) {
        if !world.block(cell).is_replaceable() {
            debug!(block = %block.code, %cell, "placement blocked");
            return Err(PlacementError::NotEnoughSpace(cell));
        }
    }
    Ok(())
}

/// Place `block_id` from `selection`, returning the controller position.
///
/// Runs the leaf's placement hook (orientation and pairing) and, on the
/// server, stamps fillers over the rest of the footprint.
pub fn try_place_block(
    api: &mut Api<'_>,
    player: &Player,
    selection: &BlockSelection,
    block_id: BlockId,
) -> Result<BlockPos, PlacementError> {
    can_place_block(&*api.world, player, selection, block_id)?;

    let block = api
        .world
        .registry()
        .get(block_id)
        .cloned()
        .ok_or(PlacementError::UnknownBlock(block_id))?;
    let yaw = placement_yaw(player, selection);
    let (origin, _) = placement_origin(&*api.world, &block, selection.position, yaw);

    api.world.set_block(block_id, origin);
    interaction::initialize(api, origin);
    interaction::on_block_placed(api, origin, player, selection);

    if api.is_server() {
        place_multiblock_parts(api.world, origin);
    }
    debug!(block = %block.code, %origin, "placed");
    Ok(origin)
}

/// Stamp filler blocks over every non-controller cell of the leaf at `pos`.
pub fn place_multiblock_parts(world: &mut dyn BlockAccessor, pos: BlockPos) {
    let is_server = world.side() == slidingwindows_core::Side::Server;
    for cell in leaf_footprint(world, pos) {
        if cell == pos {
            continue;
        }
        let Some(filler) = world.registry().filler_block(cell - pos) else {
            warn!(offset = %(cell - pos), "no filler block for offset");
            continue;
        };
        world.set_block(filler, cell);
        if is_server {
            world.trigger_neighbour_update(cell);
        }
    }
}

/// Clear the fillers around the leaf at `pos`; other blocks are left alone.
pub fn clear_multiblock_parts(world: &mut dyn BlockAccessor, pos: BlockPos) {
    for cell in leaf_footprint(world, pos) {
        if cell == pos || !world.block(cell).is_filler() {
            continue;
        }
        world.set_block(BLOCK_AIR, cell);
        world.trigger_neighbour_update(cell);
    }
}

/// Break the block at `pos`.
///
/// Fillers forward to their controller. The server clears the fillers; the
/// client drops every pending visual task of the leaf.
pub fn remove_block(api: &mut Api<'_>, pos: BlockPos) {
    let target = resolve_leaf(&*api.world, pos, None).unwrap_or(pos);

    if api.is_server() {
        clear_multiblock_parts(api.world, target);
    }
    if let Some(client) = api.client.as_deref_mut() {
        visuals::cancel(api.world, client, target);
        client.forget(target);
    }
    api.world.set_block(BLOCK_AIR, target);
    api.world.trigger_neighbour_update(target);
    debug!(%target, "removed");
}

/// Collision and selection boxes of the cell at `pos`.
///
/// Controllers use their leaf's current boxes. Window fillers shift the
/// controller's boxes into their own space; door fillers reuse them unshifted
/// except for the cells the leaf never sweeps through.
pub fn collision_boxes_at(world: &dyn BlockAccessor, pos: BlockPos) -> Vec<Cuboid> {
    if let Some(leaf) = world.leaf(pos) {
        return leaf.col_sel_boxes().to_vec();
    }
    let block = world.block(pos);
    let Some(offset_inv) = block.offset_inv() else {
        return block.collision_boxes.clone();
    };
    let Some(leaf) = world.leaf(pos + offset_inv) else {
        return Vec::new();
    };
    match leaf {
        Leaf::SlidingWindow(_) => window::filler_boxes(leaf.col_sel_boxes(), offset_inv),
        Leaf::Door(_) => door::filler_boxes(leaf, offset_inv).unwrap_or_default(),
        Leaf::Trapdoor(_) => Vec::new(),
    }
}
