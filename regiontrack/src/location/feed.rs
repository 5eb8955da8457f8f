//! LocationFeed - single-slot store of the latest valid fix.
//!
//! Replace-on-write with no history: each accepted fix replaces the whole
//! sample under a short write lock, and readers copy the current value out.
//! Rejected fixes leave the previous sample in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use tracing::{debug, info};

use super::sample::{LocationReading, LocationSample, RawFix};

/// Counts of ingested fixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub accepted: u64,
    pub rejected: u64,
}

#[derive(Debug, Default)]
struct FeedInner {
    latest: RwLock<Option<LocationSample>>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

/// Shared handle to the latest location sample.
///
/// Cloning is cheap; all clones observe the same slot.
#[derive(Debug, Clone, Default)]
pub struct LocationFeed {
    inner: Arc<FeedInner>,
}

impl LocationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a fix. Returns true if it was accepted.
    pub fn ingest(&self, fix: RawFix) -> bool {
        match LocationSample::from_fix(fix, Instant::now()) {
            Ok(sample) => {
                let first = {
                    let mut latest = self.inner.latest.write().expect("LocationFeed lock poisoned");
                    let first = latest.is_none();
                    *latest = Some(sample);
                    first
                };
                self.inner.accepted.fetch_add(1, Ordering::Relaxed);

                if first {
                    info!(
                        lat = format!("{:.5}", sample.latitude),
                        lon = format!("{:.5}", sample.longitude),
                        "First valid location fix"
                    );
                }
                true
            }
            Err(e) => {
                let rejected = self.inner.rejected.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(error = %e, rejected, "Location fix rejected");
                false
            }
        }
    }

    /// Latest valid sample, or `NoDataYet`.
    pub fn latest(&self) -> LocationReading {
        match *self.inner.latest.read().expect("LocationFeed lock poisoned") {
            Some(sample) => LocationReading::Sample(sample),
            None => LocationReading::NoDataYet,
        }
    }

    /// Whether at least one valid sample has been ingested.
    pub fn has_sample(&self) -> bool {
        self.inner
            .latest
            .read()
            .map(|latest| latest.is_some())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> FeedStats {
        FeedStats {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_data_before_first_fix() {
        let feed = LocationFeed::new();
        assert_eq!(feed.latest(), LocationReading::NoDataYet);
        assert!(!feed.has_sample());
    }

    #[test]
    fn test_latest_returns_ingested_sample_until_superseded() {
        let feed = LocationFeed::new();

        assert!(feed.ingest(RawFix::new(44.98, 8.56, 10.0)));
        let first = feed.latest().sample().unwrap();
        assert_eq!((first.latitude, first.longitude, first.speed), (44.98, 8.56, 10.0));
        // Stable across reads
        assert_eq!(feed.latest(), LocationReading::Sample(first));

        assert!(feed.ingest(RawFix::new(44.97, 8.55, 12.0)));
        let second = feed.latest().sample().unwrap();
        assert_eq!((second.latitude, second.longitude), (44.97, 8.55));
    }

    #[test]
    fn test_rejected_fix_keeps_previous_sample() {
        let feed = LocationFeed::new();
        feed.ingest(RawFix::new(44.98, 8.56, 10.0));
        let before = feed.latest();

        assert!(!feed.ingest(RawFix {
            latitude: Some(45.0),
            longitude: None,
            speed: Some(1.0),
        }));
        assert_eq!(feed.latest(), before);
        assert_eq!(
            feed.stats(),
            FeedStats {
                accepted: 1,
                rejected: 1
            }
        );
    }

    #[test]
    fn test_rejected_fix_before_any_sample_is_no_data() {
        let feed = LocationFeed::new();
        assert!(!feed.ingest(RawFix::default()));
        assert_eq!(feed.latest(), LocationReading::NoDataYet);
    }

    #[test]
    fn test_line_without_speed_is_rejected() {
        let feed = LocationFeed::new();
        let fix = crate::location::parse_fix_line("44.98,8.56").unwrap();
        assert!(!fix.is_complete());
        assert!(!feed.ingest(fix));
        assert_eq!(feed.latest(), LocationReading::NoDataYet);
    }

    #[test]
    fn test_clones_share_slot() {
        let feed = LocationFeed::new();
        let reader = feed.clone();
        feed.ingest(RawFix::new(1.0, 2.0, 3.0));
        assert!(reader.has_sample());
    }
}
