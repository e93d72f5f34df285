//! Start-up registration of the behavior classes block packs refer to.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use slidingwindows_assets::{registry_from_file, registry_from_str, BehaviorClasses, BehaviorKind, BlockRegistry};

/// Block behavior and block-entity behavior class names, per leaf kind.
pub const BEHAVIOR_CLASSES: [(&str, &str, BehaviorKind); 3] = [
    ("SlidingWindow", "SlidingWindowBE", BehaviorKind::SlidingWindow),
    ("GlassDoor", "GlassDoorBE", BehaviorKind::GlassDoor),
    ("GlassTrapdoor", "GlassTrapdoorBE", BehaviorKind::GlassTrapdoor),
];

/// Registers the window, door and trapdoor behavior classes.
#[derive(Debug, Default)]
pub struct SlidingWindowsModSystem;

impl SlidingWindowsModSystem {
    /// Register every class into `classes`.
    pub fn start(&self, classes: &mut BehaviorClasses) {
        for (block, entity, kind) in BEHAVIOR_CLASSES {
            classes.register_block_behavior_class(block, kind);
            classes.register_block_entity_behavior_class(entity, kind);
        }
        info!(classes = classes.len(), "registered sliding windows behaviors");
    }

    /// Fresh class table with this mod's classes.
    pub fn behavior_classes(&self) -> BehaviorClasses {
        let mut classes = BehaviorClasses::new();
        self.start(&mut classes);
        classes
    }

    /// Load a block pack from JSON text.
    pub fn load_blocks_str(&self, json: &str) -> Result<BlockRegistry> {
        registry_from_str(json, &self.behavior_classes()).context("failed to load block pack")
    }

    /// Load a block pack from a JSON file.
    pub fn load_blocks_file(&self, path: &Path) -> Result<BlockRegistry> {
        registry_from_file(path, &self.behavior_classes())
            .with_context(|| format!("failed to load block pack {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_leaf_kinds_resolve_by_name() {
        let classes = SlidingWindowsModSystem.behavior_classes();
        assert_eq!(classes.block_behavior("GlassDoor"), Some(BehaviorKind::GlassDoor));
        assert_eq!(
            classes.entity_behavior("SlidingWindowBE"),
            Some(BehaviorKind::SlidingWindow)
        );
        assert_eq!(classes.block_behavior("Ladder"), None);
    }

    #[test]
    fn unknown_behavior_in_a_pack_is_an_error() {
        let err = SlidingWindowsModSystem
            .load_blocks_str(r#"[{ "code": "x:ladder", "behavior": "Ladder" }]"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("block pack"));
    }
}
