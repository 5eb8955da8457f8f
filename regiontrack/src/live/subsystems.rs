//! Startup and checking subsystems for the live loop.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::location::{spawn_ingester, FixSource, LocationFeed};
use crate::readiness::{flag_probe, ProbeStatus, Subsystem};
use crate::region::RegionStore;

/// Capacity of the fix channel between source and ingester.
pub const FIX_CHANNEL_CAPACITY: usize = 64;

pub const REGION_STORE: &str = "region-store";
pub const LOCATION_FEED: &str = "location-feed";
pub const LOCATION_FIX: &str = "location-fix";
pub const INDEX_CACHE: &str = "index-cache";

/// Loads the region index in the background.
///
/// Ready once an index is published. A load failure is logged by the store and
/// leaves the probe Pending, so it surfaces as TimedOut.
pub struct RegionStoreSubsystem {
    store: Arc<RegionStore>,
    debug: bool,
    started: Mutex<bool>,
}

impl RegionStoreSubsystem {
    pub fn new(store: Arc<RegionStore>, debug: bool) -> Self {
        Self {
            store,
            debug,
            started: Mutex::new(false),
        }
    }
}

impl Subsystem for RegionStoreSubsystem {
    fn name(&self) -> &str {
        REGION_STORE
    }

    fn start(&self) {
        let mut started = self.started.lock().expect("RegionStoreSubsystem lock poisoned");
        if *started {
            return;
        }
        *started = true;
        // Outcome is recorded on the store; the handle is not needed
        drop(self.store.load(self.debug));
    }

    fn probe(&self) -> ProbeStatus {
        if self.store.is_loaded() {
            ProbeStatus::Ready
        } else {
            ProbeStatus::Pending
        }
    }
}

struct FeedTasks {
    source: JoinHandle<()>,
    ingester: JoinHandle<()>,
}

/// Runs a fix source and the ingester that drains it into the feed.
///
/// Ready once both tasks are running. Failed when cancelled, or when the source
/// ends without producing a valid fix. A source that ends after a fix (a
/// finished replay) is not a failure: the feed keeps its last sample.
pub struct LocationFeedSubsystem {
    feed: LocationFeed,
    source: Mutex<Option<Box<dyn FixSource>>>,
    tasks: Mutex<Option<FeedTasks>>,
    cancellation_token: CancellationToken,
}

impl LocationFeedSubsystem {
    pub fn new(
        feed: LocationFeed,
        source: Box<dyn FixSource>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            feed,
            source: Mutex::new(Some(source)),
            tasks: Mutex::new(None),
            cancellation_token,
        }
    }

    /// Whether the fix source task has finished.
    pub fn source_finished(&self) -> bool {
        self.tasks
            .lock()
            .map(|tasks| tasks.as_ref().is_some_and(|t| t.source.is_finished()))
            .unwrap_or(false)
    }
}

impl Subsystem for LocationFeedSubsystem {
    fn name(&self) -> &str {
        LOCATION_FEED
    }

    fn start(&self) {
        let Some(source) = self
            .source
            .lock()
            .expect("LocationFeedSubsystem lock poisoned")
            .take()
        else {
            return;
        };

        let (fix_tx, fix_rx) = mpsc::channel(FIX_CHANNEL_CAPACITY);
        let ingester = spawn_ingester(self.feed.clone(), fix_rx, self.cancellation_token.clone());

        let name = source.name();
        let run = source.run(fix_tx, self.cancellation_token.clone());
        let source = tokio::spawn(async move {
            match run.await {
                Ok(()) => info!(source = name, "Fix source finished"),
                Err(e) => warn!(source = name, error = %e, "Fix source failed"),
            }
        });

        *self.tasks.lock().expect("LocationFeedSubsystem lock poisoned") =
            Some(FeedTasks { source, ingester });
    }

    fn probe(&self) -> ProbeStatus {
        let tasks = self.tasks.lock().expect("LocationFeedSubsystem lock poisoned");
        match tasks.as_ref() {
            None => ProbeStatus::Pending,
            Some(tasks) if tasks.ingester.is_finished() && self.cancellation_token.is_cancelled() => {
                ProbeStatus::Failed("location ingester stopped".to_string())
            }
            // The ingester finishes only after draining the channel
            Some(tasks) if tasks.ingester.is_finished() && !self.feed.has_sample() => {
                ProbeStatus::Failed("fix source ended without a valid fix".to_string())
            }
            Some(_) => ProbeStatus::Ready,
        }
    }
}

/// Checking-phase probes: a fix is available and the index cache exists.
pub fn checking_subsystems(store: &Arc<RegionStore>, feed: &LocationFeed) -> Vec<Arc<dyn Subsystem>> {
    let feed = feed.clone();
    let store = Arc::clone(store);
    vec![
        flag_probe(LOCATION_FIX, move || feed.has_sample()),
        flag_probe(INDEX_CACHE, move || store.has_cached_index()),
    ]
}
