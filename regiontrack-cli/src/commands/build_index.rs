//! Build-index command - parse the dataset and write the index cache.

use std::path::Path;

use regiontrack::region::RegionStore;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the build-index command.
///
/// With `force`, an existing cache file is removed first so the dataset is
/// always parsed.
pub fn run(config_path: Option<&Path>, force: bool, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, debug)?;
    runner.log_startup("build-index");

    let store_config = runner.config().region_store_config();
    if force && store_config.cache_file.exists() {
        std::fs::remove_file(&store_config.cache_file).map_err(|e| {
            CliError::Config(format!(
                "failed to remove cache file '{}': {}",
                store_config.cache_file.display(),
                e
            ))
        })?;
    }

    println!("Dataset: {}", store_config.dataset.display());
    let cache_file = store_config.cache_file.clone();
    let store = RegionStore::new(store_config);
    let summary = store.load_blocking(debug)?;

    println!(
        "Regions: {} ({} skipped)",
        summary.regions, summary.skipped
    );
    println!(
        "Source:  {}",
        if summary.from_cache { "existing cache" } else { "dataset" }
    );
    if summary.cache_written {
        println!("Cache:   {}", cache_file.display());
    } else {
        println!("Cache:   not written (see log)");
    }
    println!("Elapsed: {:.2}s", summary.elapsed.as_secs_f64());

    Ok(())
}
