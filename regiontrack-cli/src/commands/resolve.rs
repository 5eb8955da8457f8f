//! Resolve command - look up the region containing one point.

use std::path::Path;

use regiontrack::region::{RegionLookup, RegionStore};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the resolve command, printing the region name or "Unknown".
pub fn run(config_path: Option<&Path>, lat: f64, lon: f64) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, false)?;
    runner.log_startup("resolve");

    let store = RegionStore::new(runner.config().region_store_config());
    store.load_blocking(false)?;

    match store.resolve_region(lon, lat)? {
        RegionLookup::Region(name) => println!("{}", name),
        RegionLookup::Unknown => println!("Unknown"),
    }
    Ok(())
}
