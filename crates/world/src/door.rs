//! Glass door geometry and tuning.

use glam::Vec3;

use slidingwindows_assets::BlockType;
use slidingwindows_core::{adjacent_offset, BlockFacing, Cuboid, Vec3i, RAD2DEG};

use crate::{Leaf, Pairing};

/// Pitch of the open sound.
pub const OPEN_PITCH: f32 = 1.1;
/// Pitch of the close sound.
pub const CLOSE_PITCH: f32 = 0.9;
/// Suffix of the opened animator dict key.
pub const OPENED_DICT_SUFFIX: &str = "-open";
/// Door style that always holds back liquids on its solid side.
pub const SLEEK_WINDOWED_STYLE: &str = "sleek-windowed";

/// Facing of a swung-open door leaf.
pub fn facing_when_opened(pairing: &Pairing) -> BlockFacing {
    let closed = pairing.facing();
    if pairing.invert {
        closed.ccw()
    } else {
        closed.cw()
    }
}

/// Closed boxes are the collision boxes turned by the yaw; opened boxes swing
/// them a further quarter turn towards the hinge side.
pub fn hitboxes(block: &BlockType, pairing: &Pairing) -> (Vec<Cuboid>, Vec<Cuboid>) {
    let center = Vec3::splat(0.5);
    let deg_y = pairing.rotate_y_rad * RAD2DEG;
    let closed: Vec<Cuboid> = block
        .collision_boxes
        .iter()
        .map(|b| b.rotated_copy(0.0, deg_y, 0.0, center))
        .collect();

    let swing = if pairing.invert { 90.0 } else { -90.0 };
    let opened = closed
        .iter()
        .map(|b| b.rotated_copy(0.0, swing, 0.0, center))
        .collect();

    (closed, opened)
}

/// Boxes of a filler cell, `None` for the cells the leaf does not cover.
///
/// The diagonal cell is always empty; the cell beside the hinge is empty while
/// open and the cell behind it is empty while closed. Only X and Z of the
/// inverse offset are compared.
pub fn filler_boxes(leaf: &Leaf, offset_inv: Vec3i) -> Option<Vec<Cuboid>> {
    let pairing = leaf.pairing()?;
    let adjacent = |right: i32, back: i32| {
        adjacent_offset(right, back, 0, pairing.rotate_y_rad, pairing.invert)
    };
    let same_column = |o: Vec3i| o.x == offset_inv.x && o.z == offset_inv.z;

    if same_column(adjacent(-1, -1)) {
        return None;
    }
    let uncovered = if leaf.is_open() {
        adjacent(-1, 0)
    } else {
        adjacent(0, -1)
    };
    if same_column(uncovered) {
        return None;
    }
    Some(leaf.col_sel_boxes().to_vec())
}
