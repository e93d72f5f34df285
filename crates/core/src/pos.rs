//! Integer block positions and offsets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::facing::BlockFacing;

/// Integer offset between two blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Vec3i {
    /// X component (east is positive).
    pub x: i32,
    /// Y component (up is positive).
    pub y: i32,
    /// Z component (south is positive).
    pub z: i32,
}

impl Vec3i {
    /// Zero offset.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Construct an offset.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Whether every component is zero.
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl Add for Vec3i {
    type Output = Vec3i;

    fn add(self, rhs: Vec3i) -> Vec3i {
        Vec3i::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Neg for Vec3i {
    type Output = Vec3i;

    fn neg(self) -> Vec3i {
        Vec3i::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<i32> for Vec3i {
    type Output = Vec3i;

    fn mul(self, rhs: i32) -> Vec3i {
        Vec3i::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vec3i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

/// Absolute world position of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockPos {
    /// World X.
    pub x: i32,
    /// World Y.
    pub y: i32,
    /// World Z.
    pub z: i32,
}

impl BlockPos {
    /// Construct a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position `n` steps away along `facing`.
    pub fn offset(self, facing: BlockFacing, n: i32) -> Self {
        self + facing.normal_i() * n
    }

    /// Neighbor one step along `facing`.
    pub fn neighbor(self, facing: BlockFacing) -> Self {
        self.offset(facing, 1)
    }

    /// Position shifted by an explicit offset.
    pub fn add_xyz(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Block center in world space.
    pub fn center(self) -> [f32; 3] {
        [
            self.x as f32 + 0.5,
            self.y as f32 + 0.5,
            self.z as f32 + 0.5,
        ]
    }
}

impl Add<Vec3i> for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: Vec3i) -> BlockPos {
        BlockPos::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign<Vec3i> for BlockPos {
    fn add_assign(&mut self, rhs: Vec3i) {
        *self = *self + rhs;
    }
}

impl Sub for BlockPos {
    type Output = Vec3i;

    fn sub(self, rhs: BlockPos) -> Vec3i {
        Vec3i::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}
