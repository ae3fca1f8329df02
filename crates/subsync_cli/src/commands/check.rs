//! Check command implementation.

use std::path::Path;
use subsync_core::{schedule, SyncResult};

/// Validates a descriptor file and prints its dependency schedule.
pub fn run(descriptors: &Path) -> SyncResult<()> {
    let set = super::load_descriptors(descriptors)?;
    let layers = schedule(&set)?;

    println!("{} descriptors in {} layers", set.len(), layers.len());
    for (depth, layer) in layers.iter().enumerate() {
        let names: Vec<&str> = layer.iter().map(|d| d.name.as_str()).collect();
        println!("  layer {}: {}", depth + 1, names.join(", "));
    }
    Ok(())
}
