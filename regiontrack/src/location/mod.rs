//! Location Feed: the latest valid positioning fix.
//!
//! # Architecture
//!
//! ```text
//! FixSource (replay / lines) ──mpsc<RawFix>──► ingester task ──► LocationFeed
//!                                                                    │
//!                                                  latest() ◄────────┘
//! ```
//!
//! The feed holds exactly one sample. A fix is accepted only when latitude,
//! longitude and speed are all present, finite and in range; otherwise it is
//! counted as rejected and the previous sample stays current. Before the
//! first accepted fix, [`LocationFeed::latest`] returns
//! [`LocationReading::NoDataYet`].
//!
//! # Usage
//!
//! ```
//! use regiontrack::location::{LocationFeed, LocationReading, RawFix};
//!
//! let feed = LocationFeed::new();
//! assert_eq!(feed.latest(), LocationReading::NoDataYet);
//!
//! feed.ingest(RawFix::new(44.98, 8.56, 12.0));
//! assert!(feed.has_sample());
//! ```

mod error;
mod feed;
mod ingest;
mod sample;
mod source;

pub use error::LocationError;
pub use feed::{FeedStats, LocationFeed};
pub use ingest::spawn_ingester;
pub use sample::{LocationReading, LocationSample, RawFix};
pub use source::{
    parse_fix_line, FixSource, LineSource, ReplaySource, DEFAULT_REPLAY_INTERVAL, DEMO_ROUTE,
};
