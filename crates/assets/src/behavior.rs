use std::collections::HashMap;

/// Closed set of behaviors a block type can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    /// Multiblock sliding window.
    SlidingWindow,
    /// Multiblock glass door.
    GlassDoor,
    /// Single-cell glass trapdoor.
    GlassTrapdoor,
}

impl BehaviorKind {
    /// Human-readable noun used in player-facing messages.
    pub fn noun(self) -> &'static str {
        match self {
            BehaviorKind::SlidingWindow => "window",
            BehaviorKind::GlassDoor => "door",
            BehaviorKind::GlassTrapdoor => "trapdoor",
        }
    }
}

/// Table of behavior class names registered by mods at start-up.
///
/// Block definitions refer to behaviors by these names; the registry resolves
/// them when the pack is loaded.
#[derive(Debug, Clone, Default)]
pub struct BehaviorClasses {
    block: HashMap<String, BehaviorKind>,
    entity: HashMap<String, BehaviorKind>,
}

impl BehaviorClasses {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block behavior class.
    pub fn register_block_behavior_class(&mut self, name: &str, kind: BehaviorKind) {
        self.block.insert(name.to_string(), kind);
    }

    /// Register a block-entity behavior class.
    pub fn register_block_entity_behavior_class(&mut self, name: &str, kind: BehaviorKind) {
        self.entity.insert(name.to_string(), kind);
    }

    /// Resolve a block behavior class name.
    pub fn block_behavior(&self, name: &str) -> Option<BehaviorKind> {
        self.block.get(name).copied()
    }

    /// Resolve a block-entity behavior class name.
    pub fn entity_behavior(&self, name: &str) -> Option<BehaviorKind> {
        self.entity.get(name).copied()
    }

    /// Number of registered names across both tables.
    pub fn len(&self) -> usize {
        self.block.len() + self.entity.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
