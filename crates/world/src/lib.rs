#![warn(missing_docs)]
//! Sliding windows, glass doors and glass trapdoors: multiblock placement,
//! partner pairing, open/close interaction and the client animation pipeline.

mod accessor;
mod client;
mod leaf;
mod memory;
mod weather;

pub mod door;
pub mod interaction;
pub mod multiblock;
pub mod pairing;
pub mod properties;
pub mod trapdoor;
pub mod visuals;
pub mod window;

pub use accessor::{Api, BlockAccessor, BlockSelection, GameMode, Player, OPEN_DOORS_NOT_SOLID};
pub use client::{run_frame, AnimatorFactory, ClientApi, FrameReport, InGameError};
pub use interaction::InteractError;
pub use leaf::{
    DoorLeaf, Hand, Leaf, LeafState, LeafVisuals, Pairing, TrapdoorLeaf, VisualFlags, WindowLeaf,
};
pub use memory::{MemoryWorld, SnapshotError, WorldSnapshot, DEFAULT_RAIN_HEIGHT};
pub use multiblock::PlacementError;
pub use properties::RetentionKind;
pub use visuals::{VisualStep, VisualTask};
pub use weather::*;
