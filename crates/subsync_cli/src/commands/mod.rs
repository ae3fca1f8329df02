//! CLI command implementations.

pub mod check;
pub mod run;

use std::path::Path;
use subsync_core::{DescriptorSet, SyncError, SyncResult};

/// Reads and parses a descriptor set from a YAML file.
pub fn load_descriptors(path: &Path) -> SyncResult<DescriptorSet> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        SyncError::configuration(format!(
            "cannot read descriptor file {}: {e}",
            path.display()
        ))
    })?;
    DescriptorSet::from_yaml_str(&text)
}
