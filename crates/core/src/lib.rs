#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod asset;
pub mod attributes;
pub mod cuboid;
pub mod facing;
pub mod pos;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use asset::{AssetLocation, AssetLocationError, DEFAULT_DOMAIN};
pub use attributes::{AttributeError, AttributeValue, TreeAttribute};
pub use cuboid::Cuboid;
pub use facing::{adjacent_offset, snap_yaw, Axis, BlockFacing};
pub use pos::{BlockPos, Vec3i};

/// Fixed tick type used by the deterministic test harnesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SimTick(pub u64);

impl SimTick {
    /// First tick in any deterministic timeline.
    pub const ZERO: Self = Self(0);

    /// Advance by `delta` ticks.
    pub fn advance(self, delta: u64) -> Self {
        Self(self.0 + delta)
    }
}

/// Which half of the game a call is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Authoritative world simulation.
    Server,
    /// Rendering/audio side.
    Client,
}

/// Helper to derive a reproducible RNG seeded by world + tick domains.
pub fn scoped_rng(world_seed: u64, chunk_hash: u64, tick: SimTick) -> StdRng {
    let seed = world_seed ^ chunk_hash ^ tick.0;
    StdRng::seed_from_u64(seed)
}

/// Degrees to radians for `f32` math.
pub const DEG2RAD: f32 = std::f32::consts::PI / 180.0;

/// Radians to degrees for `f32` math.
pub const RAD2DEG: f32 = 180.0 / std::f32::consts::PI;

/// Euclidean modulo that always yields a value in `0..m`.
pub fn mod_i32(value: i32, m: i32) -> i32 {
    value.rem_euclid(m)
}
