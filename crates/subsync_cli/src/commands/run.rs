//! Run command implementation.

use std::path::Path;
use subsync_core::{
    connect, ExistingDataPolicy, Scheduler, SyncConfig, SyncError, SyncResult,
};

/// Runs a full sync from a descriptor file.
pub fn run(
    descriptors: &Path,
    source: Option<String>,
    dest: Option<String>,
    batch_size: usize,
    existing: &str,
) -> SyncResult<()> {
    let source_uri = resolve_uri(source, "SOURCE_URI", "--source")?;
    let dest_uri = resolve_uri(dest, "DESTINATION_URI", "--dest")?;
    let set = super::load_descriptors(descriptors)?;

    let config = SyncConfig::new()
        .with_batch_size(batch_size)
        .with_existing_data(parse_policy(existing)?);

    // Connections are acquired once and held for the run's duration.
    let source_store = connect(&source_uri)?;
    let dest_store = connect(&dest_uri)?;

    let stats = Scheduler::new(config).run(&set, &source_store, &dest_store)?;

    println!(
        "Synchronized {} collections, {} documents inserted",
        stats.descriptors_processed(),
        stats.total_inserted()
    );
    for collection in &stats.collections {
        println!(
            "  {}: {} inserted, {} deleted, {} batches",
            collection.collection, collection.inserted, collection.deleted, collection.batches
        );
    }
    Ok(())
}

fn resolve_uri(flag: Option<String>, env_var: &str, flag_name: &str) -> SyncResult<String> {
    if let Some(uri) = flag {
        return Ok(uri);
    }
    std::env::var(env_var).map_err(|_| {
        SyncError::configuration(format!("{flag_name} not given and {env_var} is not set"))
    })
}

fn parse_policy(text: &str) -> SyncResult<ExistingDataPolicy> {
    match text {
        "fail" => Ok(ExistingDataPolicy::Fail),
        "replace" => Ok(ExistingDataPolicy::Replace),
        "append" => Ok(ExistingDataPolicy::Append),
        other => Err(SyncError::configuration(format!(
            "unknown existing-data policy {other:?} (expected fail, replace, or append)"
        ))),
    }
}
