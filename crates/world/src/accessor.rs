//! Host-world seam consumed by the leaf behaviors.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use slidingwindows_assets::{BlockId, BlockRegistry, BlockType};
use slidingwindows_audio::SoundRequest;
use slidingwindows_core::{BlockFacing, BlockPos, Side};

use crate::{ClientApi, Leaf};

/// World flag that makes open doors count as non-solid for heat retention.
pub const OPEN_DOORS_NOT_SOLID: &str = "openDoorsNotSolid";

/// Block grid, block entities and world services as seen by one side.
pub trait BlockAccessor {
    /// Which side this accessor runs on.
    fn side(&self) -> Side;

    /// Block types known to the world.
    fn registry(&self) -> &BlockRegistry;

    /// Block id at `pos`; unset cells are air.
    fn block_id(&self, pos: BlockPos) -> BlockId;

    /// Block type at `pos`.
    fn block(&self, pos: BlockPos) -> &BlockType {
        self.registry().get_or_air(self.block_id(pos))
    }

    /// Replace the block at `pos`.
    ///
    /// Any leaf stored at `pos` is dropped. Blocks carrying a behavior get a
    /// fresh default leaf.
    fn set_block(&mut self, id: BlockId, pos: BlockPos);

    /// Leaf stored at `pos`.
    fn leaf(&self, pos: BlockPos) -> Option<&Leaf>;

    /// Mutable leaf stored at `pos`.
    fn leaf_mut(&mut self, pos: BlockPos) -> Option<&mut Leaf>;

    /// Notify the neighbours of `pos` that it changed.
    fn trigger_neighbour_update(&mut self, pos: BlockPos);

    /// Ask the host to re-tessellate the block at `pos`.
    fn mark_block_dirty(&mut self, pos: BlockPos);

    /// Block positions queued for re-tessellation, oldest first.
    fn take_dirty_blocks(&mut self) -> Vec<BlockPos>;

    /// Flag the leaf at `pos` for saving.
    fn mark_entity_dirty(&mut self, pos: BlockPos);

    /// Height of the highest rain-blocking block in column `(x, z)`.
    fn rain_map_height(&self, x: i32, z: i32) -> i32;

    /// Play a positional sound.
    fn play_sound_at(&mut self, request: SoundRequest);

    /// Boolean world configuration value.
    fn world_flag(&self, key: &str, default: bool) -> bool;
}

/// Everything a behavior call may touch: the world, plus client-only state on
/// the client side.
pub struct Api<'a> {
    /// The block world.
    pub world: &'a mut dyn BlockAccessor,
    /// Render timeline, mesh cache and animators; `None` on the server.
    pub client: Option<&'a mut ClientApi>,
}

impl<'a> Api<'a> {
    /// Server-side context.
    pub fn server(world: &'a mut dyn BlockAccessor) -> Self {
        Self {
            world,
            client: None,
        }
    }

    /// Client-side context.
    pub fn client(world: &'a mut dyn BlockAccessor, client: &'a mut ClientApi) -> Self {
        Self {
            world,
            client: Some(client),
        }
    }

    /// Side of the underlying world.
    pub fn side(&self) -> Side {
        self.world.side()
    }

    /// True on the server.
    pub fn is_server(&self) -> bool {
        self.world.side() == Side::Server
    }
}

/// Player game mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Normal play; some leaves refuse hand interaction.
    #[default]
    Survival,
    /// Anything goes.
    Creative,
}

/// The interacting player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Feet position.
    pub position: Vec3,
    /// Eye height above the feet.
    pub local_eye_y: f32,
    /// Current game mode.
    pub game_mode: GameMode,
}

impl Player {
    /// Player with the default eye height.
    pub fn new(position: Vec3, game_mode: GameMode) -> Self {
        Self {
            position,
            local_eye_y: 1.7,
            game_mode,
        }
    }

    /// Block containing the player's feet; coordinates truncate toward zero.
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.position.x as i32,
            self.position.y as i32,
            self.position.z as i32,
        )
    }
}

/// Where the player clicked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockSelection {
    /// Cell the new block would occupy.
    pub position: BlockPos,
    /// Face of the clicked block.
    pub face: BlockFacing,
    /// Hit point inside the clicked block, in `[0, 1]^3`.
    pub hit_position: Vec3,
    /// Whether `position` was offset from the clicked block along `face`.
    pub did_offset: bool,
}

impl BlockSelection {
    /// Selection of `position` itself, hit at `hit_position` on `face`.
    pub fn at(position: BlockPos, face: BlockFacing, hit_position: Vec3) -> Self {
        Self {
            position,
            face,
            hit_position,
            did_offset: false,
        }
    }
}
