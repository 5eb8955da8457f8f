//! Live loop controller.
//!
//! Brings the region store and location feed up through the readiness
//! coordinator, then streams: each tick reads the latest fix, resolves its
//! region, advances the viewport and pushes the map with a text overlay to
//! the display.

mod controller;
mod error;
mod stats;
mod subsystems;

pub use controller::{
    ExitReason, LiveLoopConfig, LiveLoopController, LoopOutcome, LoopState,
    DEFAULT_FRAME_DURATION, DEFAULT_RENDER_TIMEOUT, DEFAULT_TICK_INTERVAL,
};
pub use error::{LiveLoopError, TickError};
pub use stats::{log_summary, LoopStats, LoopStatsSnapshot};
pub use subsystems::{
    checking_subsystems, LocationFeedSubsystem, RegionStoreSubsystem, FIX_CHANNEL_CAPACITY,
    INDEX_CACHE, LOCATION_FEED, LOCATION_FIX, REGION_STORE,
};
