//! regiontrack - region resolution and live map tracking for in-vehicle displays
//!
//! This library determines which administrative region a moving point is in
//! and keeps a map viewport centred on it, pushing map images and status text
//! to a display.
//!
//! # Components
//!
//! - [`region`] - boundary dataset, grid-bucketed spatial index and its cache
//! - [`location`] - latest-fix slot and the sources that feed it
//! - [`readiness`] - bounded start-and-poll protocol for startup subsystems
//! - [`viewport`] - keep-or-recentre bounding box logic and map rendering
//! - [`display`] - display sink trait and stock sinks
//! - [`live`] - the controller sequencing everything above
//!
//! # Example
//!
//! ```ignore
//! use regiontrack::config::ConfigFile;
//! use regiontrack::live::{LiveLoopController, RegionStoreSubsystem};
//!
//! let config = ConfigFile::load()?;
//! let store = Arc::new(RegionStore::new(config.region_store_config()));
//! let controller = LiveLoopController::new(
//!     config.live_loop_config(), store, feed, tracker, display,
//! )?;
//! let outcome = controller.run(startup_subsystems, token).await?;
//! ```

pub mod config;
pub mod display;
pub mod live;
pub mod location;
pub mod logging;
pub mod panic;
pub mod readiness;
pub mod region;
pub mod viewport;

/// Version of the regiontrack library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
