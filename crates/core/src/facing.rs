//! Block faces, yaw snapping and the multiblock adjacency formula.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use crate::pos::Vec3i;

/// World axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// East/west.
    X,
    /// Up/down.
    Y,
    /// North/south.
    Z,
}

/// One of the six block faces.
///
/// The discriminant is the face index used in persisted state
/// (`North = 0` .. `Down = 5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockFacing {
    /// Negative Z.
    North = 0,
    /// Positive X.
    East = 1,
    /// Positive Z.
    South = 2,
    /// Negative X.
    West = 3,
    /// Positive Y.
    Up = 4,
    /// Negative Y.
    Down = 5,
}

impl BlockFacing {
    /// All faces in index order.
    pub const ALL: [BlockFacing; 6] = [
        BlockFacing::North,
        BlockFacing::East,
        BlockFacing::South,
        BlockFacing::West,
        BlockFacing::Up,
        BlockFacing::Down,
    ];

    /// Horizontal faces in index order.
    pub const HORIZONTALS: [BlockFacing; 4] = [
        BlockFacing::North,
        BlockFacing::East,
        BlockFacing::South,
        BlockFacing::West,
    ];

    /// Horizontal faces ordered by counter-clockwise angle, starting at east (0 rad).
    pub const HORIZONTALS_ANGLEORDER: [BlockFacing; 4] = [
        BlockFacing::East,
        BlockFacing::North,
        BlockFacing::West,
        BlockFacing::South,
    ];

    /// Face index (`North = 0` .. `Down = 5`).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Face by index; `None` when out of range.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Lowercase code, e.g. `"north"`.
    pub fn code(self) -> &'static str {
        match self {
            BlockFacing::North => "north",
            BlockFacing::East => "east",
            BlockFacing::South => "south",
            BlockFacing::West => "west",
            BlockFacing::Up => "up",
            BlockFacing::Down => "down",
        }
    }

    /// Integer unit normal.
    pub fn normal_i(self) -> Vec3i {
        match self {
            BlockFacing::North => Vec3i::new(0, 0, -1),
            BlockFacing::East => Vec3i::new(1, 0, 0),
            BlockFacing::South => Vec3i::new(0, 0, 1),
            BlockFacing::West => Vec3i::new(-1, 0, 0),
            BlockFacing::Up => Vec3i::new(0, 1, 0),
            BlockFacing::Down => Vec3i::new(0, -1, 0),
        }
    }

    /// Float unit normal.
    pub fn normal(self) -> Vec3 {
        let n = self.normal_i();
        Vec3::new(n.x as f32, n.y as f32, n.z as f32)
    }

    /// Axis the normal lies on.
    pub fn axis(self) -> Axis {
        match self {
            BlockFacing::East | BlockFacing::West => Axis::X,
            BlockFacing::Up | BlockFacing::Down => Axis::Y,
            BlockFacing::North | BlockFacing::South => Axis::Z,
        }
    }

    /// North, West and Down point along a negative axis.
    pub fn is_negative(self) -> bool {
        matches!(self, BlockFacing::North | BlockFacing::West | BlockFacing::Down)
    }

    /// True for the four compass faces.
    pub fn is_horizontal(self) -> bool {
        self.axis() != Axis::Y
    }

    /// True for up and down.
    pub fn is_vertical(self) -> bool {
        self.axis() == Axis::Y
    }

    /// Opposite face.
    pub fn opposite(self) -> Self {
        match self {
            BlockFacing::North => BlockFacing::South,
            BlockFacing::East => BlockFacing::West,
            BlockFacing::South => BlockFacing::North,
            BlockFacing::West => BlockFacing::East,
            BlockFacing::Up => BlockFacing::Down,
            BlockFacing::Down => BlockFacing::Up,
        }
    }

    /// Clockwise neighbor when seen from above. Vertical faces map to themselves.
    pub fn cw(self) -> Self {
        match self {
            BlockFacing::North => BlockFacing::East,
            BlockFacing::East => BlockFacing::South,
            BlockFacing::South => BlockFacing::West,
            BlockFacing::West => BlockFacing::North,
            other => other,
        }
    }

    /// Counter-clockwise neighbor when seen from above.
    pub fn ccw(self) -> Self {
        match self {
            BlockFacing::North => BlockFacing::West,
            BlockFacing::West => BlockFacing::South,
            BlockFacing::South => BlockFacing::East,
            BlockFacing::East => BlockFacing::North,
            other => other,
        }
    }

    /// Position in [`Self::HORIZONTALS_ANGLEORDER`]; vertical faces return 0.
    pub fn horizontal_angle_index(self) -> i32 {
        match self {
            BlockFacing::East => 0,
            BlockFacing::North => 1,
            BlockFacing::West => 2,
            BlockFacing::South => 3,
            BlockFacing::Up | BlockFacing::Down => 0,
        }
    }

    /// Horizontal face closest to the given angle (radians, 0 = east, counter-clockwise).
    pub fn horizontal_from_angle(angle: f32) -> Self {
        let steps = (angle.to_degrees() / 90.0).round() as i32;
        Self::HORIZONTALS_ANGLEORDER[steps.rem_euclid(4) as usize]
    }

    /// Horizontal face for a block yaw (0 faces north, `PI/2` faces west).
    pub fn horizontal_from_yaw(yaw: f32) -> Self {
        Self::horizontal_from_angle(yaw + FRAC_PI_2)
    }

    /// Face whose normal best matches this face's normal after rotating by
    /// `Rx * Ry * Rz` (radians).
    pub fn face_when_rotated_by(self, rad_x: f32, rad_y: f32, rad_z: f32) -> Self {
        let matrix =
            Mat4::from_rotation_x(rad_x) * Mat4::from_rotation_y(rad_y) * Mat4::from_rotation_z(rad_z);
        let rotated = matrix.transform_vector3(self.normal());

        let mut best = self;
        let mut best_dot = f32::MIN;
        for face in Self::ALL {
            let dot = face.normal().dot(rotated);
            if dot > best_dot {
                best_dot = dot;
                best = face;
            }
        }
        best
    }

    /// Parse a lowercase face code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }
}

impl fmt::Display for BlockFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Round an angle to the nearest multiple of 90 degrees.
pub fn snap_yaw(angle: f32) -> f32 {
    (angle / FRAC_PI_2).round() * FRAC_PI_2
}

/// Offset of a footprint cell relative to the controller.
///
/// `right` runs across the leaf, `back` runs away from the facing and `up` is
/// vertical. Inverted (mirrored) leaves extend to the other side.
pub fn adjacent_offset(right: i32, back: i32, up: i32, yaw: f32, invert: bool) -> Vec3i {
    let right = if invert { -right } else { right };
    let r_sin = (yaw + FRAC_PI_2).sin().round() as i32;
    let r_cos = (yaw + FRAC_PI_2).cos().round() as i32;
    let b_sin = yaw.sin().round() as i32;
    let b_cos = yaw.cos().round() as i32;
    Vec3i::new(right * r_sin - back * b_sin, up, right * r_cos - back * b_cos)
}

/// Normalize an angle into `(-2PI, 2PI)` the way a truncating float remainder does.
pub fn wrap_radians(angle: f32) -> f32 {
    angle % (2.0 * PI)
}
