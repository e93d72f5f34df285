use std::fs;
use std::path::Path;

use crate::{AssetError, BehaviorClasses, BlockRegistry};

/// Load a block registry from the provided JSON file path.
pub fn registry_from_file(
    path: &Path,
    classes: &BehaviorClasses,
) -> Result<BlockRegistry, AssetError> {
    let data = fs::read_to_string(path)?;
    registry_from_str(&data, classes)
}

/// Load a block registry from an in-memory JSON string.
pub fn registry_from_str(
    input: &str,
    classes: &BehaviorClasses,
) -> Result<BlockRegistry, AssetError> {
    let defs = crate::load_blocks_from_str(input)?;
    BlockRegistry::from_definitions(defs, classes)
}
