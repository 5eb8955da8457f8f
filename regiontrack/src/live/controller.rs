//! LiveLoopController - the startup state machine and streaming loop.
//!
//! ```text
//! AwaitingReadiness ──all Ready──► Checking ──fix + cache──► Streaming
//!        │                            │                          │
//!        └── not ready / cancel ──────┴──────── cancel / done ───┴──► Terminated
//! ```
//!
//! Every path ends in Terminated, which closes the display exactly once.
//! While streaming, per-tick failures are counted and shown on the display
//! and the loop keeps the last good bounding box.
//!
//! A tick never waits on a render. It starts one on the blocking pool and a
//! later tick collects the result; ticks in between report the render as busy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::{LiveLoopError, TickError};
use super::stats::{log_summary, LoopStats, LoopStatsSnapshot};
use super::subsystems::{checking_subsystems, INDEX_CACHE, LOCATION_FIX};
use crate::display::{spawn_status_updater, Display, TextMessage, STATUS_FONT_SIZE};
use crate::location::{LocationFeed, LocationReading, LocationSample};
use crate::readiness::{
    ReadinessConfig, ReadinessCoordinator, ReadinessError, ReadinessReport, ReadinessState,
    Subsystem,
};
use crate::region::{RegionLookup, RegionStore};
use crate::viewport::{
    BoundingBox, GeoPoint, MapArtifact, ViewportError, ViewportTracker, DEFAULT_DPI, DEFAULT_ZOOM,
};

/// Default time between streaming ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Default age after which a render's result is discarded.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Default loading animation frame duration.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(100);

const OVERLAY_FONT_SIZE: u32 = 9;
const ERROR_FONT_SIZE: u32 = 10;
const ERROR_HOLD: Duration = Duration::from_secs(3);

/// Controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingReadiness,
    Checking,
    Streaming,
    Terminated,
}

impl LoopState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopState::AwaitingReadiness => "awaiting_readiness",
            LoopState::Checking => "checking",
            LoopState::Streaming => "streaming",
            LoopState::Terminated => "terminated",
        }
    }
}

/// Live loop settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveLoopConfig {
    /// Readiness bounds for the startup subsystems.
    pub startup: ReadinessConfig,
    /// Readiness bounds for the fix/cache check.
    pub check: ReadinessConfig,
    pub tick_interval: Duration,
    /// Half extent of a recentred viewport, in degrees.
    pub zoom: f64,
    pub dpi: u32,
    /// Renders older than this are abandoned and their result discarded.
    pub render_timeout: Duration,
    /// Animation shown between checking and streaming.
    pub loading_sequence: Option<PathBuf>,
    pub frame_duration: Duration,
    /// Stop after this many ticks; `None` streams until cancelled.
    pub max_ticks: Option<u64>,
}

impl Default for LiveLoopConfig {
    fn default() -> Self {
        Self {
            startup: ReadinessConfig::default(),
            check: ReadinessConfig::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            zoom: DEFAULT_ZOOM,
            dpi: DEFAULT_DPI,
            render_timeout: DEFAULT_RENDER_TIMEOUT,
            loading_sequence: None,
            frame_duration: DEFAULT_FRAME_DURATION,
            max_ticks: None,
        }
    }
}

impl LiveLoopConfig {
    fn validate(&self) -> Result<(), LiveLoopError> {
        let invalid = |msg: String| Err(LiveLoopError::InvalidConfig(msg));
        if self.tick_interval.is_zero() {
            return invalid("tick interval must be non-zero".to_string());
        }
        if self.startup.poll_interval.is_zero() || self.check.poll_interval.is_zero() {
            return invalid("poll interval must be non-zero".to_string());
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return invalid(format!("zoom {} must be positive", self.zoom));
        }
        if self.dpi == 0 {
            return invalid("dpi must be positive".to_string());
        }
        if self.render_timeout.is_zero() {
            return invalid("render timeout must be non-zero".to_string());
        }
        Ok(())
    }
}

/// How the loop ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The cancellation token fired (Ctrl-C, SIGTERM).
    Interrupted,
    /// `max_ticks` ticks were streamed.
    Completed,
}

/// Result of a loop run that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub exit: ExitReason,
    pub stats: LoopStatsSnapshot,
    /// Viewport shown when the loop stopped.
    pub final_bbox: BoundingBox,
}

/// Why readiness stopped short of streaming.
enum Halt {
    Cancelled,
    Failed(LiveLoopError),
}

impl From<ReadinessError> for Halt {
    fn from(_: ReadinessError) -> Self {
        Halt::Cancelled
    }
}

type RenderResult = Result<(MapArtifact, BoundingBox), ViewportError>;

/// A render started by an earlier tick.
struct InFlight {
    handle: JoinHandle<RenderResult>,
    started: Instant,
    sample: LocationSample,
    region: RegionLookup,
    timed_out: bool,
}

/// Per-run streaming state.
struct Streaming {
    bbox: BoundingBox,
    region: Option<RegionLookup>,
    in_flight: Option<InFlight>,
}

impl Streaming {
    fn new() -> Self {
        Self {
            bbox: BoundingBox::EMPTY,
            region: None,
            in_flight: None,
        }
    }
}

/// Sequences Location Feed → Region Store → Viewport Tracker → Display.
pub struct LiveLoopController {
    config: LiveLoopConfig,
    store: Arc<RegionStore>,
    feed: LocationFeed,
    tracker: Arc<ViewportTracker>,
    display: Display,
    stats: LoopStats,
    state_tx: watch::Sender<LoopState>,
}

impl LiveLoopController {
    pub fn new(
        config: LiveLoopConfig,
        store: Arc<RegionStore>,
        feed: LocationFeed,
        tracker: Arc<ViewportTracker>,
        display: Display,
    ) -> Result<Self, LiveLoopError> {
        config.validate()?;
        let (state_tx, _) = watch::channel(LoopState::AwaitingReadiness);
        Ok(Self {
            config,
            store,
            feed,
            tracker,
            display,
            stats: LoopStats::new(),
            state_tx,
        })
    }

    pub fn state(&self) -> LoopState {
        *self.state_tx.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    pub fn stats(&self) -> LoopStatsSnapshot {
        self.stats.snapshot(self.display.failures())
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    fn transition(&self, next: LoopState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            info!(from = previous.as_str(), to = next.as_str(), "Live loop state");
        }
    }

    /// Run to completion. The display is closed on every return path.
    pub async fn run(
        &self,
        startup: Vec<Arc<dyn Subsystem>>,
        cancellation_token: CancellationToken,
    ) -> Result<LoopOutcome, LiveLoopError> {
        let result = self.run_states(startup, &cancellation_token).await;

        self.transition(LoopState::Terminated);
        self.display.close();
        log_summary(&self.stats());

        result
    }

    async fn run_states(
        &self,
        startup: Vec<Arc<dyn Subsystem>>,
        cancellation_token: &CancellationToken,
    ) -> Result<LoopOutcome, LiveLoopError> {
        let (status_tx, status_rx) = watch::channel(String::new());
        let status_updater = spawn_status_updater(
            self.display.clone(),
            status_rx,
            cancellation_token.child_token(),
        );

        let ready = self
            .await_readiness(startup, &status_tx, cancellation_token)
            .await;
        // Dropping the sender lets the updater flush the last line and exit
        drop(status_tx);
        let _ = status_updater.await;

        let halt = match ready {
            Ok(checks) => match self.finish_checks(&checks) {
                Ok(()) => return self.stream(cancellation_token).await,
                Err(e) => Halt::Failed(e),
            },
            Err(halt) => halt,
        };

        match halt {
            Halt::Cancelled => {
                info!("Live loop interrupted before streaming");
                Ok(self.outcome(ExitReason::Interrupted, BoundingBox::EMPTY))
            }
            Halt::Failed(e) => {
                warn!(error = %e, "Live loop not ready");
                self.display.show_text(
                    &TextMessage::new(e.to_string())
                        .with_font_size(ERROR_FONT_SIZE)
                        .with_hold(ERROR_HOLD),
                );
                Err(e)
            }
        }
    }

    /// Show the check results, then the loading sequence if all passed.
    fn finish_checks(&self, checks: &ReadinessReport) -> Result<(), LiveLoopError> {
        let label = |name: &str| match checks.state(name) {
            Some(ReadinessState::Ready) => "OK",
            _ => "Error",
        };
        self.display.show_text(
            &TextMessage::new(format!(
                "Check GEO: {}\nCheck GPS: {}",
                label(INDEX_CACHE),
                label(LOCATION_FIX)
            ))
            .with_font_size(STATUS_FONT_SIZE),
        );

        if !checks.is_ready() {
            return Err(LiveLoopError::NotReady {
                phase: "Checking",
                diagnostic: checks.diagnostic(),
            });
        }

        self.display
            .show_text(&TextMessage::new("Checks passed").with_font_size(STATUS_FONT_SIZE));
        if let Some(path) = &self.config.loading_sequence {
            self.display
                .display_loading_sequence(path, self.config.frame_duration);
        }
        Ok(())
    }

    /// AwaitingReadiness, then the Checking probes.
    async fn await_readiness(
        &self,
        startup: Vec<Arc<dyn Subsystem>>,
        status_tx: &watch::Sender<String>,
        cancellation_token: &CancellationToken,
    ) -> Result<ReadinessReport, Halt> {
        self.transition(LoopState::AwaitingReadiness);
        self.display.show_text(
            &TextMessage::new("Initializing...\nLoading regions...\nLoading GPS...")
                .with_font_size(STATUS_FONT_SIZE),
        );

        let coordinator = ReadinessCoordinator::new(self.config.startup.clone());
        let report = coordinator
            .run("Startup", &startup, status_tx, cancellation_token)
            .await?;
        // An interrupt wins over subsystems it brought down
        if cancellation_token.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        if !report.is_ready() {
            return Err(Halt::Failed(LiveLoopError::NotReady {
                phase: "Startup",
                diagnostic: report.diagnostic(),
            }));
        }

        self.transition(LoopState::Checking);
        let coordinator = ReadinessCoordinator::new(self.config.check.clone());
        let checks = checking_subsystems(&self.store, &self.feed);
        let report = coordinator
            .run("Checking", &checks, status_tx, cancellation_token)
            .await?;
        if cancellation_token.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        Ok(report)
    }

    async fn stream(
        &self,
        cancellation_token: &CancellationToken,
    ) -> Result<LoopOutcome, LiveLoopError> {
        self.transition(LoopState::Streaming);
        self.stats.streaming_started();

        let mut state = Streaming::new();

        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let exit = loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    info!("Live loop interrupted");
                    break ExitReason::Interrupted;
                }

                _ = interval.tick() => {
                    if let Err(e) = self.tick(&mut state).await {
                        self.report_transient(&e);
                    }
                    if self
                        .config
                        .max_ticks
                        .is_some_and(|max| self.stats.snapshot(0).ticks >= max)
                    {
                        break ExitReason::Completed;
                    }
                }
            }
        };

        if exit == ExitReason::Completed {
            self.finish_last_render(&mut state).await;
        }

        Ok(self.outcome(exit, state.bbox))
    }

    /// Give the render started by the last tick up to `render_timeout` to land.
    async fn finish_last_render(&self, state: &mut Streaming) {
        let Some(mut in_flight) = state.in_flight.take() else {
            return;
        };
        if in_flight.timed_out {
            return;
        }
        let remaining = self
            .config
            .render_timeout
            .saturating_sub(in_flight.started.elapsed());
        match tokio::time::timeout(remaining, &mut in_flight.handle).await {
            Ok(joined) => {
                if let Err(e) = self.apply_render(state, in_flight, joined) {
                    self.report_transient(&e);
                }
            }
            Err(_) => debug!("Abandoning unfinished render at shutdown"),
        }
    }

    /// One streaming step. The bounding box changes only when a finished
    /// render is collected.
    async fn tick(&self, state: &mut Streaming) -> Result<(), TickError> {
        self.stats.tick();

        let running = state
            .in_flight
            .as_mut()
            .filter(|in_flight| !in_flight.handle.is_finished());
        if let Some(in_flight) = running {
            self.stats.render_busy();
            if !in_flight.timed_out && in_flight.started.elapsed() >= self.config.render_timeout {
                in_flight.timed_out = true;
                return Err(TickError::RenderTimeout(self.config.render_timeout));
            }
            return Err(TickError::RenderBusy);
        }

        if let Some(mut finished) = state.in_flight.take() {
            let joined = (&mut finished.handle).await;
            if let Err(e) = self.apply_render(state, finished, joined) {
                self.report_transient(&e);
            }
        }

        let sample = match self.feed.latest() {
            LocationReading::Sample(sample) => sample,
            LocationReading::NoDataYet => return Err(TickError::NoData),
        };

        let region = self.store.resolve_region(sample.longitude, sample.latitude)?;
        if state.region.as_ref() != Some(&region) {
            self.stats.region_changed();
            info!(region = %region, "Region changed");
            state.region = Some(region.clone());
        }

        let point = GeoPoint::new(sample.latitude, sample.longitude);
        let tracker = Arc::clone(&self.tracker);
        let previous = state.bbox;
        let (dpi, zoom) = (self.config.dpi, self.config.zoom);
        let handle =
            tokio::task::spawn_blocking(move || tracker.advance(point, previous, dpi, zoom));

        state.in_flight = Some(InFlight {
            handle,
            started: Instant::now(),
            sample,
            region,
            timed_out: false,
        });
        Ok(())
    }

    /// Apply a finished render. A render that outlived `render_timeout` is
    /// stale and its result is dropped.
    fn apply_render(
        &self,
        state: &mut Streaming,
        in_flight: InFlight,
        joined: Result<RenderResult, JoinError>,
    ) -> Result<(), TickError> {
        let result = joined.map_err(|e| TickError::RenderTask(e.to_string()))?;
        if in_flight.timed_out {
            debug!(
                age_ms = in_flight.started.elapsed().as_millis() as u64,
                "Discarding stale render"
            );
            return Ok(());
        }

        let (artifact, bbox) = result?;
        state.bbox = bbox;
        self.stats.render();
        debug!(bbox = %bbox, "Viewport advanced");

        let sample = in_flight.sample;
        self.display.show_map(&artifact);
        self.display.show_text(
            &TextMessage::new(format!(
                "Lat: {:.6}\nLon: {:.6}\nKmh: {:.2}\nReg: {}",
                sample.latitude, sample.longitude, sample.speed, in_flight.region
            ))
            .with_font_size(OVERLAY_FONT_SIZE),
        );
        Ok(())
    }

    fn report_transient(&self, error: &TickError) {
        let total = self.stats.transient_error();
        warn!(error = %error, transient_errors = total, "Tick failed");
        self.display.show_text(
            &TextMessage::new(error.to_string())
                .with_font_size(ERROR_FONT_SIZE)
                .with_hold(ERROR_HOLD),
        );
    }

    fn outcome(&self, exit: ExitReason, final_bbox: BoundingBox) -> LoopOutcome {
        LoopOutcome {
            exit,
            stats: self.stats(),
            final_bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayError, DisplaySink};
    use crate::location::RawFix;
    use crate::readiness::ProbeFn;
    use crate::readiness::ProbeStatus;
    use crate::region::RegionStoreConfig;
    use crate::viewport::{MapRenderer, RenderError, TrackerConfig, Viewport};
    use crate::live::RegionStoreSubsystem;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const DATASET: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "R1"},
             "geometry": {"type": "Polygon",
                          "coordinates": [[[8.0, 44.0], [9.0, 44.0], [9.0, 45.0], [8.0, 45.0], [8.0, 44.0]]]}}
        ]
    }"#;

    #[derive(Default)]
    struct RecordingDisplay {
        texts: Mutex<Vec<String>>,
        maps: AtomicUsize,
        closes: AtomicUsize,
    }

    impl RecordingDisplay {
        fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }
    }

    impl DisplaySink for RecordingDisplay {
        fn show_text(&self, message: &TextMessage) -> Result<(), DisplayError> {
            self.texts.lock().unwrap().push(message.text.clone());
            Ok(())
        }
        fn show_map(&self, _artifact: &MapArtifact) -> Result<(), DisplayError> {
            self.maps.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn display_loading_sequence(&self, _path: &Path, _frame: Duration) -> Result<(), DisplayError> {
            Ok(())
        }
        fn close(&self) -> Result<(), DisplayError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BlankRenderer {
        fail: bool,
    }

    impl MapRenderer for BlankRenderer {
        fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError> {
            if self.fail {
                return Err(RenderError::Render("tile server unreachable".to_string()));
            }
            Ok(MapArtifact {
                png: vec![0x89, b'P', b'N', b'G'],
                width: 4,
                height: 2,
                bbox: viewport.bbox,
                position,
            })
        }
    }

    /// Blocks the render thread for `delay` before producing a map.
    struct SlowRenderer {
        delay: Duration,
    }

    impl MapRenderer for SlowRenderer {
        fn render(&self, viewport: &Viewport, position: GeoPoint) -> Result<MapArtifact, RenderError> {
            std::thread::sleep(self.delay);
            BlankRenderer { fail: false }.render(viewport, position)
        }
    }

    fn fast_config() -> LiveLoopConfig {
        let readiness = ReadinessConfig {
            poll_interval: Duration::from_millis(10),
            deadline: Duration::from_millis(300),
        };
        LiveLoopConfig {
            startup: readiness.clone(),
            check: readiness,
            tick_interval: Duration::from_millis(10),
            max_ticks: Some(3),
            ..LiveLoopConfig::default()
        }
    }

    fn loaded_store(dir: &TempDir) -> Arc<RegionStore> {
        let dataset = dir.path().join("regions.geojson");
        std::fs::write(&dataset, DATASET).unwrap();
        let store = Arc::new(RegionStore::new(RegionStoreConfig::new(
            dataset,
            dir.path().join("region_index.cache"),
        )));
        store.load_blocking(false).unwrap();
        store
    }

    fn controller(
        config: LiveLoopConfig,
        store: Arc<RegionStore>,
        feed: LocationFeed,
        fail_render: bool,
    ) -> (LiveLoopController, Arc<RecordingDisplay>) {
        let renderer = Arc::new(BlankRenderer { fail: fail_render });
        controller_with_renderer(config, store, feed, renderer)
    }

    fn controller_with_renderer(
        config: LiveLoopConfig,
        store: Arc<RegionStore>,
        feed: LocationFeed,
        renderer: Arc<dyn MapRenderer>,
    ) -> (LiveLoopController, Arc<RecordingDisplay>) {
        let sink = Arc::new(RecordingDisplay::default());
        let tracker = ViewportTracker::new(TrackerConfig::default(), renderer).unwrap();
        let controller = LiveLoopController::new(
            config,
            store,
            feed,
            Arc::new(tracker),
            Display::new(sink.clone()),
        )
        .unwrap();
        (controller, sink)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RegionStore::new(RegionStoreConfig::new(
            dir.path().join("none.geojson"),
            dir.path().join("none.cache"),
        )));
        let tracker = ViewportTracker::new(
            TrackerConfig::default(),
            Arc::new(BlankRenderer { fail: false }),
        )
        .unwrap();
        let config = LiveLoopConfig {
            zoom: 0.0,
            ..LiveLoopConfig::default()
        };
        let result = LiveLoopController::new(
            config,
            store,
            LocationFeed::new(),
            Arc::new(tracker),
            Display::new(Arc::new(RecordingDisplay::default())),
        );
        assert!(matches!(result, Err(LiveLoopError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_streams_until_max_ticks() {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let feed = LocationFeed::new();
        assert!(feed.ingest(RawFix::new(44.5, 8.5, 30.0)));

        let (controller, sink) = controller(fast_config(), Arc::clone(&store), feed, false);
        let startup: Vec<Arc<dyn Subsystem>> =
            vec![Arc::new(RegionStoreSubsystem::new(store, false))];

        let outcome = controller
            .run(startup, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.exit, ExitReason::Completed);
        assert_eq!(outcome.stats.ticks, 3);
        assert_eq!(outcome.stats.renders, 3);
        assert_eq!(outcome.stats.region_changes, 1);
        assert!(outcome.final_bbox.contains(GeoPoint::new(44.5, 8.5)));
        assert_eq!(sink.maps.load(Ordering::SeqCst), 3);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
        assert_eq!(controller.state(), LoopState::Terminated);

        let texts = sink.texts();
        assert!(texts.iter().any(|t| t == "Check GEO: OK\nCheck GPS: OK"));
        assert!(texts.iter().any(|t| t.ends_with("Reg: R1")));
    }

    #[tokio::test]
    async fn test_render_failures_are_transient() {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let feed = LocationFeed::new();
        feed.ingest(RawFix::new(44.5, 8.5, 0.0));

        let (controller, sink) = controller(fast_config(), store, feed, true);
        let outcome = controller
            .run(Vec::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.exit, ExitReason::Completed);
        assert_eq!(outcome.stats.renders, 0);
        assert_eq!(outcome.stats.transient_errors, 3);
        assert_eq!(outcome.final_bbox, BoundingBox::EMPTY);
        assert!(sink.texts().iter().any(|t| t.starts_with("Map unavailable")));
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_startup_timeout_is_fatal_and_closes_display() {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let (controller, sink) = controller(fast_config(), store, LocationFeed::new(), false);
        let stuck: Vec<Arc<dyn Subsystem>> =
            vec![Arc::new(ProbeFn::new("stuck", || ProbeStatus::Pending))];

        let err = controller
            .run(stuck, CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            LiveLoopError::NotReady { phase, diagnostic } => {
                assert_eq!(phase, "Startup");
                assert!(diagnostic.contains("stuck (timed out)"), "{diagnostic}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sink.maps.load(Ordering::SeqCst), 0);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_fix_fails_checking() {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let (controller, sink) = controller(fast_config(), store, LocationFeed::new(), false);

        let err = controller
            .run(Vec::new(), CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LiveLoopError::NotReady { phase: "Checking", .. }));
        assert!(sink.texts().iter().any(|t| t == "Check GEO: OK\nCheck GPS: Error"));
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_streaming() {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let feed = LocationFeed::new();
        feed.ingest(RawFix::new(44.5, 8.5, 0.0));
        let config = LiveLoopConfig {
            max_ticks: None,
            ..fast_config()
        };
        let (controller, sink) = controller(config, store, feed, false);
        let mut state = controller.subscribe_state();
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            async move {
                while *state.borrow_and_update() != LoopState::Streaming {
                    if state.changed().await.is_err() {
                        return;
                    }
                }
                tokio::time::sleep(Duration::from_millis(30)).await;
                token.cancel();
            }
        };

        let (outcome, _) = tokio::join!(controller.run(Vec::new(), token), canceller);
        let outcome = outcome.unwrap();

        assert_eq!(outcome.exit, ExitReason::Interrupted);
        assert!(outcome.stats.ticks >= 1);
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    fn slow_controller(
        render_delay: Duration,
        render_timeout: Duration,
    ) -> (TempDir, LiveLoopController, Arc<RecordingDisplay>) {
        let dir = TempDir::new().unwrap();
        let store = loaded_store(&dir);
        let feed = LocationFeed::new();
        feed.ingest(RawFix::new(44.5, 8.5, 20.0));
        let config = LiveLoopConfig {
            render_timeout,
            ..fast_config()
        };
        let renderer = Arc::new(SlowRenderer {
            delay: render_delay,
        });
        let (controller, sink) = controller_with_renderer(config, store, feed, renderer);
        (dir, controller, sink)
    }

    #[tokio::test]
    async fn test_tick_returns_while_render_runs() {
        let (_dir, controller, sink) =
            slow_controller(Duration::from_millis(200), Duration::from_secs(5));
        let mut state = Streaming::new();

        let started = Instant::now();
        controller.tick(&mut state).await.unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
        assert!(state.in_flight.is_some());
        assert_eq!(state.bbox, BoundingBox::EMPTY);

        let busy = controller.tick(&mut state).await;
        assert!(matches!(busy, Err(TickError::RenderBusy)));
        assert_eq!(state.bbox, BoundingBox::EMPTY);
        assert_eq!(controller.stats().busy_ticks, 1);
        assert_eq!(sink.maps.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        controller.tick(&mut state).await.unwrap();

        assert!(state.bbox.contains(GeoPoint::new(44.5, 8.5)));
        assert_eq!(controller.stats().renders, 1);
        assert_eq!(sink.maps.load(Ordering::SeqCst), 1);
        assert!(sink.texts().iter().any(|t| t.ends_with("Reg: R1")));
        // The collecting tick starts the next render
        assert!(state.in_flight.is_some());
    }

    #[tokio::test]
    async fn test_render_past_timeout_is_discarded() {
        let (_dir, controller, sink) =
            slow_controller(Duration::from_millis(200), Duration::from_millis(50));
        let mut state = Streaming::new();

        controller.tick(&mut state).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;

        let timed_out = controller.tick(&mut state).await;
        assert!(matches!(timed_out, Err(TickError::RenderTimeout(_))));
        let busy = controller.tick(&mut state).await;
        assert!(matches!(busy, Err(TickError::RenderBusy)));

        tokio::time::sleep(Duration::from_millis(250)).await;
        controller.tick(&mut state).await.unwrap();

        assert_eq!(state.bbox, BoundingBox::EMPTY);
        assert_eq!(controller.stats().renders, 0);
        assert_eq!(controller.stats().busy_ticks, 2);
        assert_eq!(sink.maps.load(Ordering::SeqCst), 0);
        assert!(state.in_flight.is_some());
    }

    #[tokio::test]
    async fn test_slow_renders_do_not_stall_ticks() {
        let (_dir, controller, sink) =
            slow_controller(Duration::from_millis(150), Duration::from_secs(1));
        let config_ticks = 6;
        let mut controller = controller;
        controller.config.max_ticks = Some(config_ticks);
        controller.config.tick_interval = Duration::from_millis(20);

        let outcome = controller
            .run(Vec::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.exit, ExitReason::Completed);
        assert_eq!(outcome.stats.ticks, config_ticks);
        assert!(outcome.stats.busy_ticks >= 1, "{:?}", outcome.stats);
        assert!(outcome.stats.renders >= 1, "{:?}", outcome.stats);
        // Six blocking renders in sequence would take at least 900ms
        assert!(
            outcome.stats.streaming_for < Duration::from_millis(600),
            "{:?}",
            outcome.stats
        );
        assert!(sink
            .texts()
            .iter()
            .any(|t| t == "Map render still in progress"));
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }
}
