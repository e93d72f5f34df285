//! In-memory [`BlockAccessor`] used by the headless demo and tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use slidingwindows_assets::{BlockId, BlockRegistry, BLOCK_AIR};
use slidingwindows_audio::SoundRequest;
use slidingwindows_core::{AttributeError, BlockPos, Side, TreeAttribute};

use crate::{BlockAccessor, Leaf};

/// Rain map height reported for columns without an explicit value.
pub const DEFAULT_RAIN_HEIGHT: i32 = 0;

/// Errors produced while saving or loading a [`MemoryWorld`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// A leaf tree failed to encode or decode.
    #[error("leaf at {pos}: {source}")]
    Leaf {
        /// Leaf position.
        pos: BlockPos,
        /// Underlying codec error.
        #[source]
        source: AttributeError,
    },
    /// The snapshot document itself is malformed.
    #[error("snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Saved blocks and leaf trees of a [`MemoryWorld`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Non-air blocks by code.
    pub blocks: Vec<(BlockPos, String)>,
    /// Encoded leaf trees.
    pub leaves: Vec<(BlockPos, Vec<u8>)>,
}

impl WorldSnapshot {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from [`Self::to_json`] output.
    pub fn from_json(input: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Sparse block grid with leaves, recording every side effect.
#[derive(Debug, Clone)]
pub struct MemoryWorld {
    side: Side,
    registry: Arc<BlockRegistry>,
    blocks: HashMap<BlockPos, BlockId>,
    leaves: BTreeMap<BlockPos, Leaf>,
    rain_heights: HashMap<(i32, i32), i32>,
    default_rain_height: i32,
    flags: HashMap<String, bool>,
    sounds: Vec<SoundRequest>,
    neighbour_updates: Vec<BlockPos>,
    dirty_blocks: Vec<BlockPos>,
    dirty_entities: Vec<BlockPos>,
}

impl MemoryWorld {
    /// Empty world on `side`.
    pub fn new(side: Side, registry: Arc<BlockRegistry>) -> Self {
        Self {
            side,
            registry,
            blocks: HashMap::new(),
            leaves: BTreeMap::new(),
            rain_heights: HashMap::new(),
            default_rain_height: DEFAULT_RAIN_HEIGHT,
            flags: HashMap::new(),
            sounds: Vec::new(),
            neighbour_updates: Vec::new(),
            dirty_blocks: Vec::new(),
            dirty_entities: Vec::new(),
        }
    }

    /// Empty server world.
    pub fn server(registry: Arc<BlockRegistry>) -> Self {
        Self::new(Side::Server, registry)
    }

    /// Empty client world.
    pub fn client(registry: Arc<BlockRegistry>) -> Self {
        Self::new(Side::Client, registry)
    }

    /// Shared handle to the registry.
    pub fn registry_arc(&self) -> Arc<BlockRegistry> {
        Arc::clone(&self.registry)
    }

    /// Set the rain map height of column `(x, z)`.
    pub fn set_rain_height(&mut self, x: i32, z: i32, height: i32) {
        self.rain_heights.insert((x, z), height);
    }

    /// Rain map height of columns without an explicit value.
    pub fn set_default_rain_height(&mut self, height: i32) {
        self.default_rain_height = height;
    }

    /// Set a boolean world configuration value.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }

    /// Sounds played so far, oldest first.
    pub fn sounds(&self) -> &[SoundRequest] {
        &self.sounds
    }

    /// Drain the recorded sounds.
    pub fn take_sounds(&mut self) -> Vec<SoundRequest> {
        std::mem::take(&mut self.sounds)
    }

    /// Neighbour updates triggered so far, oldest first.
    pub fn neighbour_updates(&self) -> &[BlockPos] {
        &self.neighbour_updates
    }

    /// Forget the recorded neighbour updates.
    pub fn clear_neighbour_updates(&mut self) {
        self.neighbour_updates.clear();
    }

    /// Drain the positions flagged for saving.
    pub fn take_dirty_entities(&mut self) -> Vec<BlockPos> {
        std::mem::take(&mut self.dirty_entities)
    }

    /// Positions holding a leaf, in ascending order.
    pub fn leaf_positions(&self) -> Vec<BlockPos> {
        self.leaves.keys().copied().collect()
    }

    /// Capture blocks and leaf trees.
    pub fn snapshot(&self) -> Result<WorldSnapshot, SnapshotError> {
        let mut blocks: Vec<(BlockPos, String)> = self
            .blocks
            .iter()
            .filter(|(_, id)| **id != BLOCK_AIR)
            .map(|(pos, id)| (*pos, self.registry.get_or_air(*id).code.to_string()))
            .collect();
        blocks.sort();

        let mut leaves = Vec::with_capacity(self.leaves.len());
        for (pos, leaf) in &self.leaves {
            let mut tree = TreeAttribute::new();
            leaf.to_tree(&mut tree);
            let bytes = tree
                .to_bytes()
                .map_err(|source| SnapshotError::Leaf { pos: *pos, source })?;
            leaves.push((*pos, bytes));
        }
        Ok(WorldSnapshot { blocks, leaves })
    }

    /// Rebuild a world from a snapshot. Unknown block codes are skipped.
    ///
    /// Leaves come back with their persisted fields only; run
    /// [`crate::interaction::initialize`] on each to restore the rest.
    pub fn restore(
        side: Side,
        registry: Arc<BlockRegistry>,
        snapshot: &WorldSnapshot,
    ) -> Result<Self, SnapshotError> {
        let mut world = Self::new(side, registry);
        for (pos, code) in &snapshot.blocks {
            match world.registry.id_by_code(code) {
                Some(id) => {
                    world.blocks.insert(*pos, id);
                }
                None => warn!(%pos, code, "unknown block in snapshot; skipping"),
            }
        }
        for (pos, bytes) in &snapshot.leaves {
            let Some(kind) = world.block(*pos).behavior else {
                warn!(%pos, "leaf without a behavior block; skipping");
                continue;
            };
            let tree = TreeAttribute::from_bytes(bytes)
                .map_err(|source| SnapshotError::Leaf { pos: *pos, source })?;
            world.leaves.insert(*pos, Leaf::from_tree(kind, &tree));
        }
        debug!(
            blocks = world.blocks.len(),
            leaves = world.leaves.len(),
            "restored world"
        );
        Ok(world)
    }
}

impl BlockAccessor for MemoryWorld {
    fn side(&self) -> Side {
        self.side
    }

    fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    fn block_id(&self, pos: BlockPos) -> BlockId {
        self.blocks.get(&pos).copied().unwrap_or(BLOCK_AIR)
    }

    fn set_block(&mut self, id: BlockId, pos: BlockPos) {
        self.leaves.remove(&pos);
        if id == BLOCK_AIR {
            self.blocks.remove(&pos);
            return;
        }
        self.blocks.insert(pos, id);
        if let Some(leaf) = Leaf::for_block(self.registry.get_or_air(id)) {
            self.leaves.insert(pos, leaf);
        }
    }

    fn leaf(&self, pos: BlockPos) -> Option<&Leaf> {
        self.leaves.get(&pos)
    }

    fn leaf_mut(&mut self, pos: BlockPos) -> Option<&mut Leaf> {
        self.leaves.get_mut(&pos)
    }

    fn trigger_neighbour_update(&mut self, pos: BlockPos) {
        self.neighbour_updates.push(pos);
    }

    fn mark_block_dirty(&mut self, pos: BlockPos) {
        if !self.dirty_blocks.contains(&pos) {
            self.dirty_blocks.push(pos);
        }
    }

    fn take_dirty_blocks(&mut self) -> Vec<BlockPos> {
        std::mem::take(&mut self.dirty_blocks)
    }

    fn mark_entity_dirty(&mut self, pos: BlockPos) {
        self.dirty_entities.push(pos);
    }

    fn rain_map_height(&self, x: i32, z: i32) -> i32 {
        self.rain_heights
            .get(&(x, z))
            .copied()
            .unwrap_or(self.default_rain_height)
    }

    fn play_sound_at(&mut self, request: SoundRequest) {
        self.sounds.push(request);
    }

    fn world_flag(&self, key: &str, default: bool) -> bool {
        self.flags.get(key).copied().unwrap_or(default)
    }
}
