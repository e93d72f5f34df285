#![warn(missing_docs)]
//! Block-type definitions, attribute schema and the block registry.

mod behavior;
mod loader;
mod registry;

pub use behavior::{BehaviorClasses, BehaviorKind};
pub use loader::{registry_from_file, registry_from_str};
pub use registry::{
    filler_code, parse_filler_code, BlockId, BlockRegistry, BlockType, BLOCK_AIR, FILLER_PREFIX,
};

use serde::Deserialize;
use slidingwindows_core::Cuboid;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default sound for both opening and closing.
pub const DEFAULT_TRIGGER_SOUND: &str = "sounds/block/door";

/// Block definition as authored in JSON packs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDefinition {
    /// Domain-qualified code (e.g. `slidingwindows:window-1x2-clear`).
    pub code: String,
    /// Behavior class name registered by a mod (e.g. `SlidingWindow`).
    #[serde(default)]
    pub behavior: Option<String>,
    /// Block-entity behavior class name (e.g. `SlidingWindowBE`).
    #[serde(default)]
    pub entity_behavior: Option<String>,
    /// Coarse material class.
    #[serde(default)]
    pub material: BlockMaterial,
    /// Closed-state shape reference.
    #[serde(default)]
    pub shape: Option<String>,
    /// Collision/selection boxes in block-local space.
    #[serde(default = "default_boxes")]
    pub collision_boxes: Vec<Cuboid>,
    /// Whether other blocks may be placed into this cell.
    #[serde(default)]
    pub replaceable: bool,
    /// Variant key/value pairs (e.g. `style`).
    #[serde(default)]
    pub variant: BTreeMap<String, String>,
    /// Behavior tuning attributes.
    #[serde(default)]
    pub attributes: BlockAttributes,
}

fn default_boxes() -> Vec<Cuboid> {
    vec![Cuboid::unit()]
}

/// Coarse block material used for insulation and the all-glass rain option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockMaterial {
    /// Empty space.
    Air,
    /// Any glass.
    Glass,
    /// Wooden blocks.
    Wood,
    /// Metal blocks.
    Metal,
    /// Natural and cut stone.
    Stone,
    /// Dirt, sand, gravel.
    Soil,
    /// Ore-bearing rock.
    Ore,
    /// Fired clay.
    Ceramic,
    /// Everything else.
    #[default]
    Other,
}

impl BlockMaterial {
    /// Heat insulation sign used by door retention: dense materials leak.
    pub fn insulation(self) -> i32 {
        match self {
            BlockMaterial::Ore | BlockMaterial::Stone | BlockMaterial::Soil | BlockMaterial::Ceramic => -1,
            _ => 1,
        }
    }
}

/// Sounds played in addition to the primary open/close sound.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SecondarySounds {
    /// Extra sound on open.
    pub open: Option<String>,
    /// Extra sound on close.
    pub close: Option<String>,
}

/// Tuning attributes consumed by the door/window/trapdoor behaviors.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockAttributes {
    /// Footprint width in blocks.
    pub width: i32,
    /// Footprint height in blocks.
    pub height: i32,
    /// Windows only pair with neighbors when set.
    pub pairable: bool,
    /// Mirrored sash track (informational for shapes).
    pub mirror_track: bool,
    /// Whether players may toggle it by hand outside creative mode.
    pub handopenable: bool,
    /// Blocks liquids and heat when closed.
    pub airtight: bool,
    /// Sets both open and close sounds.
    pub trigger_sound: Option<String>,
    /// Sound on open.
    pub open_sound: Option<String>,
    /// Sound on close.
    pub close_sound: Option<String>,
    /// Animation clip played when opening.
    pub opening_animation_code: String,
    /// Animation clip played when closing.
    pub closing_animation_code: String,
    /// Opened-state shape; enables the mesh-swap animation pipeline.
    pub opened_shape: Option<String>,
    /// Shared ease speed.
    pub easing_speed: Option<f32>,
    /// Ease speed while opening.
    pub opening_speed: Option<f32>,
    /// Ease speed while closing.
    pub closing_speed: Option<f32>,
    /// Extra open/close sounds.
    pub secondary_sounds: SecondarySounds,
    /// Glass color variant; any non-empty value marks the block as glass.
    pub glass: Option<String>,
}

impl Default for BlockAttributes {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pairable: false,
            mirror_track: false,
            handopenable: true,
            airtight: true,
            trigger_sound: None,
            open_sound: None,
            close_sound: None,
            opening_animation_code: "opening".to_string(),
            closing_animation_code: "closing".to_string(),
            opened_shape: None,
            easing_speed: None,
            opening_speed: None,
            closing_speed: None,
            secondary_sounds: SecondarySounds::default(),
            glass: None,
        }
    }
}

impl BlockAttributes {
    /// Width clamped to at least one block.
    pub fn footprint_width(&self) -> i32 {
        self.width.max(1)
    }

    /// Height clamped to at least one block.
    pub fn footprint_height(&self) -> i32 {
        self.height.max(1)
    }

    /// Sound played on open, falling back to the trigger sound.
    pub fn open_sound_code(&self) -> &str {
        self.open_sound
            .as_deref()
            .or(self.trigger_sound.as_deref())
            .unwrap_or(DEFAULT_TRIGGER_SOUND)
    }

    /// Sound played on close, falling back to the trigger sound.
    pub fn close_sound_code(&self) -> &str {
        self.close_sound
            .as_deref()
            .or(self.trigger_sound.as_deref())
            .unwrap_or(DEFAULT_TRIGGER_SOUND)
    }

    /// Ease speed for opening (or closing when `opening` is false), default 10.
    pub fn ease_speed(&self, opening: bool) -> f32 {
        let directed = if opening {
            self.opening_speed
        } else {
            self.closing_speed
        };
        directed.or(self.easing_speed).unwrap_or(10.0)
    }

    /// Whether the `glass` attribute marks this block as glass.
    pub fn is_glassy(&self) -> bool {
        self.glass.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// Errors emitted during pack loading.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Wrap IO errors when reading packs.
    #[error("failed to read asset pack: {0}")]
    Io(#[from] std::io::Error),
    /// Wrap serde parsing issues.
    #[error("failed to parse asset pack: {0}")]
    Parse(#[from] serde_json::Error),
    /// A code failed to parse as an asset location.
    #[error("invalid block code: {0}")]
    Code(#[from] slidingwindows_core::AssetLocationError),
    /// Two definitions share a code.
    #[error("duplicate block code {0}")]
    Duplicate(String),
    /// Block and entity behavior classes disagree.
    #[error("block {0} pairs a block behavior with a different entity behavior")]
    MismatchedBehavior(String),
    /// A definition names a behavior class nobody registered.
    #[error("block {code} uses unknown behavior class {class}")]
    UnknownBehavior {
        /// Offending block code.
        code: String,
        /// Unregistered class name.
        class: String,
    },
}

/// Parse a JSON string into a list of blocks.
pub fn load_blocks_from_str(input: &str) -> Result<Vec<BlockDefinition>, AssetError> {
    Ok(serde_json::from_str(input)?)
}
