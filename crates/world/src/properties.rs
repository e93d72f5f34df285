//! Block properties the host queries for leaves and their fillers: liquid
//! barriers, sound and heat retention, and debug descriptions.

use slidingwindows_assets::BehaviorKind;
use slidingwindows_core::{BlockFacing, BlockPos, Vec3i};

use crate::multiblock::resolve_leaf;
use crate::{door, Api, BlockAccessor, Leaf, OPEN_DOORS_NOT_SOLID};

/// What a retention query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetentionKind {
    /// Sound propagation.
    Sound,
    /// Room heat.
    Heat,
}

/// Controller leaf for `pos` plus the offset from `pos` back to it.
fn controller(world: &dyn BlockAccessor, pos: BlockPos) -> Option<(BlockPos, &Leaf, Vec3i)> {
    let at = resolve_leaf(world, pos, None)?;
    Some((at, world.leaf(at)?, at - pos))
}

/// Height of the liquid barrier on `face` of the cell at `pos`, 0 or 1.
pub fn liquid_barrier_height_on_side(world: &dyn BlockAccessor, pos: BlockPos, face: BlockFacing) -> f32 {
    let Some((at, leaf, offset_inv)) = controller(world, pos) else {
        return 0.0;
    };
    if !leaf.is_side_solid(face) {
        return 0.0;
    }
    let block = world.block(at);
    if leaf.kind() == BehaviorKind::GlassDoor && block.style() == Some(door::SLEEK_WINDOWED_STYLE) {
        // The glazed upper half of a sleek door lets liquid through.
        return if offset_inv.y == -1 { 0.0 } else { 1.0 };
    }
    if block.attributes.airtight {
        1.0
    } else {
        0.0
    }
}

/// Retention of `kind` through `face` of the cell at `pos`.
///
/// Sound is blocked (3) by any solid side. Heat needs an airtight leaf; a
/// leaf solid on the face or its opposite insulates by its material, any
/// other orientation seals completely (3) unless open doors count as
/// non-solid in this world.
pub fn retention(world: &dyn BlockAccessor, pos: BlockPos, face: BlockFacing, kind: RetentionKind) -> i32 {
    let Some((at, leaf, _)) = controller(world, pos) else {
        return 0;
    };
    let solid = leaf.is_side_solid(face);
    if kind == RetentionKind::Sound {
        return if solid { 3 } else { 0 };
    }

    let block = world.block(at);
    if !block.attributes.airtight {
        return 0;
    }
    let insulation = block.material.insulation();
    if world.world_flag(OPEN_DOORS_NOT_SOLID, false) {
        return if solid { insulation } else { 0 };
    }
    if solid || leaf.is_side_solid(face.opposite()) {
        insulation
    } else {
        3
    }
}

/// Debug lines describing the leaf at (or owning) `pos`.
pub fn describe(world: &dyn BlockAccessor, pos: BlockPos) -> Vec<String> {
    let Some((at, leaf, _)) = controller(world, pos) else {
        return Vec::new();
    };
    let attrs = &world.block(at).attributes;
    let state = if leaf.is_open() { "open" } else { "closed" };
    let mut lines = Vec::new();

    match leaf {
        Leaf::Door(d) => {
            let inv = if d.pairing.invert { "-inv " } else { " " };
            lines.push(format!("{}{inv}{state}", leaf.facing_when_closed()));
            let left = d
                .pairing
                .left
                .map_or_else(|| " ".to_string(), |o| format!(" leftdoor at:{o}"));
            let right = d
                .pairing
                .right
                .map_or_else(|| " ".to_string(), |o| format!(" rightdoor at:{o}"));
            lines.push(format!("{}x{}{left}{right}", attrs.height, attrs.width));
        }
        Leaf::SlidingWindow(w) => {
            lines.push(format!("{} {state}", w.pairing.facing()));
            lines.push(format!("{}x{}", attrs.height, attrs.width));
        }
        Leaf::Trapdoor(t) => {
            lines.push(format!("{} {state}", leaf.facing_when_closed()));
            lines.push(format!("attached:{} rot:{}", t.attached_face, t.rot_deg));
        }
    }

    for face in BlockFacing::HORIZONTALS {
        if liquid_barrier_height_on_side(world, at, face) > 0.0 {
            lines.push(format!("Barrier to liquid on side: {}", capitalized(face)));
        }
    }
    lines
}

fn capitalized(face: BlockFacing) -> String {
    let code = face.code();
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Block info shown to a client player: [`describe`] when extended debug
/// info is enabled, nothing otherwise.
pub fn block_info(api: &Api<'_>, pos: BlockPos) -> Vec<String> {
    match api.client.as_deref() {
        Some(client) if client.extended_debug_info => describe(&*api.world, pos),
        _ => Vec::new(),
    }
}
