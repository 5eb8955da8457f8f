//! Live loop driven end to end: fix lines in, frame files out.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use regiontrack::display::{Display, FrameDirDisplay, MAP_FILENAME, STATUS_FILENAME};
use regiontrack::live::{
    ExitReason, LiveLoopConfig, LiveLoopController, LiveLoopError, LocationFeedSubsystem,
    LoopState, RegionStoreSubsystem,
};
use regiontrack::location::{LineSource, LocationFeed};
use regiontrack::readiness::{ReadinessConfig, Subsystem};
use regiontrack::region::{RegionStore, RegionStoreConfig};
use regiontrack::viewport::{
    GeoPoint, MapArtifact, MapRenderer, RenderError, TrackerConfig, Viewport, ViewportTracker,
};
use tempfile::TempDir;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

const DATASET: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {"type": "Feature", "properties": {"name": "R1"},
         "geometry": {"type": "Polygon",
                      "coordinates": [[[8.0, 44.0], [9.0, 44.0], [9.0, 45.0], [8.0, 45.0], [8.0, 44.0]]]}}
    ]
}"#;

/// Renders a placeholder, failing for points west of `fail_west_of`.
struct PlaceholderRenderer {
    fail_west_of: f64,
}

impl MapRenderer for PlaceholderRenderer {
    fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError> {
        if position.lon < self.fail_west_of {
            return Err(RenderError::Render("no tiles for this area".to_string()));
        }
        Ok(MapArtifact {
            png: b"\x89PNG placeholder".to_vec(),
            width: 256,
            height: 128,
            bbox: viewport.bbox,
            position,
        })
    }
}

fn fast_config(max_ticks: u64) -> LiveLoopConfig {
    let readiness = ReadinessConfig {
        poll_interval: Duration::from_millis(10),
        deadline: Duration::from_secs(2),
    };
    LiveLoopConfig {
        startup: readiness.clone(),
        check: readiness,
        tick_interval: Duration::from_millis(20),
        render_timeout: Duration::from_secs(2),
        max_ticks: Some(max_ticks),
        ..LiveLoopConfig::default()
    }
}

struct Rig {
    dir: TempDir,
    store: Arc<RegionStore>,
}

impl Rig {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("regions.geojson");
        fs::write(&dataset, DATASET).unwrap();
        let store = Arc::new(RegionStore::new(RegionStoreConfig::new(
            dataset,
            dir.path().join("region_index.cache"),
        )));
        Self { dir, store }
    }

    fn controller(
        &self,
        config: LiveLoopConfig,
        feed: LocationFeed,
        fail_west_of: f64,
    ) -> LiveLoopController {
        let frames = FrameDirDisplay::new(self.dir.path().join("frames")).unwrap();
        let tracker = ViewportTracker::new(
            TrackerConfig::default(),
            Arc::new(PlaceholderRenderer { fail_west_of }),
        )
        .unwrap();
        LiveLoopController::new(
            config,
            Arc::clone(&self.store),
            feed,
            Arc::new(tracker),
            Display::new(Arc::new(frames)),
        )
        .unwrap()
    }

    fn startup(
        &self,
        feed: &LocationFeed,
        lines: &'static str,
        token: &CancellationToken,
    ) -> Vec<Arc<dyn Subsystem>> {
        let source = LineSource::new(BufReader::new(lines.as_bytes()));
        vec![
            Arc::new(RegionStoreSubsystem::new(Arc::clone(&self.store), false)),
            Arc::new(LocationFeedSubsystem::new(
                feed.clone(),
                Box::new(source),
                token.clone(),
            )),
        ]
    }

    fn status(&self) -> serde_json::Value {
        let bytes = fs::read(self.dir.path().join("frames").join(STATUS_FILENAME)).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[tokio::test]
async fn streams_frames_and_closes_display() {
    let rig = Rig::new();
    let feed = LocationFeed::new();
    let token = CancellationToken::new();
    let startup = rig.startup(&feed, "44.5,8.5,42.0\n", &token);
    let controller = rig.controller(fast_config(3), feed, -180.0);

    let outcome = controller.run(startup, token).await.unwrap();

    assert_eq!(outcome.exit, ExitReason::Completed);
    assert_eq!(outcome.stats.ticks, 3);
    assert_eq!(outcome.stats.renders, 3);
    assert_eq!(outcome.stats.transient_errors, 0);
    assert!(outcome.final_bbox.contains(GeoPoint::new(44.5, 8.5)));
    assert_eq!(controller.state(), LoopState::Terminated);

    // Closing removes the last map and marks the status record
    assert!(!rig.dir.path().join("frames").join(MAP_FILENAME).exists());
    assert_eq!(rig.status()["closed"], true);
    assert!(rig.store.has_cached_index());
}

#[tokio::test]
async fn render_failures_are_counted_and_shown() {
    let rig = Rig::new();
    let feed = LocationFeed::new();
    let token = CancellationToken::new();
    // Every point is west of 100°E, so each render fails
    let startup = rig.startup(&feed, "# demo\n44.5,8.5,0\n", &token);
    let controller = rig.controller(fast_config(4), feed, 100.0);

    let outcome = controller.run(startup, token).await.unwrap();

    assert_eq!(outcome.exit, ExitReason::Completed);
    assert_eq!(outcome.stats.ticks, 4);
    assert_eq!(outcome.stats.renders, 0);
    assert_eq!(outcome.stats.transient_errors, 4);
    assert_eq!(outcome.stats.region_changes, 1);
    assert!(outcome.final_bbox.is_degenerate());
    assert_eq!(rig.status()["closed"], true);
}

#[tokio::test]
async fn source_without_valid_fix_fails_startup() {
    let rig = Rig::new();
    let feed = LocationFeed::new();
    let token = CancellationToken::new();
    let startup = rig.startup(&feed, "not a fix\n95.0,8.0\n", &token);
    let mut config = fast_config(1);
    config.check.deadline = Duration::from_millis(300);
    let controller = rig.controller(config, feed, -180.0);

    let err = controller.run(startup, token).await.unwrap_err();

    // The feed may be seen Ready before the source reaches EOF; the missing
    // fix then surfaces in the check instead
    match err {
        LiveLoopError::NotReady { phase: "Startup", diagnostic } => {
            assert!(diagnostic.contains("location-feed (failed"), "{diagnostic}");
        }
        LiveLoopError::NotReady { phase: "Checking", diagnostic } => {
            assert!(diagnostic.contains("location-fix (timed out)"), "{diagnostic}");
        }
        other => panic!("unexpected error: {other}"),
    }
    let status = rig.status();
    assert_eq!(status["closed"], true);
}

#[tokio::test]
async fn cancelled_during_startup_is_graceful() {
    let rig = Rig::new();
    let feed = LocationFeed::new();
    let token = CancellationToken::new();
    let startup = rig.startup(&feed, "44.5,8.5,0\n", &token);
    let controller = rig.controller(fast_config(10), feed, -180.0);
    token.cancel();

    let outcome = controller.run(startup, token).await.unwrap();

    assert_eq!(outcome.exit, ExitReason::Interrupted);
    assert_eq!(outcome.stats.ticks, 0);
    assert_eq!(controller.state(), LoopState::Terminated);
}
