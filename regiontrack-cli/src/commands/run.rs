//! Run command - bring up the subsystems and stream the live display.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use regiontrack::config::{ConfigFile, DisplayKind, FeedSourceKind};
use regiontrack::display::{Display, DisplaySink, FrameDirDisplay, NoOpDisplay, TracingDisplay};
use regiontrack::live::{
    ExitReason, LiveLoopController, LocationFeedSubsystem, LoopOutcome, RegionStoreSubsystem,
};
use regiontrack::location::{FixSource, LineSource, LocationError, LocationFeed, ReplaySource};
use regiontrack::panic as panic_handler;
use regiontrack::readiness::Subsystem;
use regiontrack::region::RegionStore;
use regiontrack::viewport::{StaticMapRenderer, ViewportTracker};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Time allowed for background work to stop after the loop ends.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Keeps the display registered with the panic hook. Dropping it
/// unregisters and closes the display, so setup errors release it too.
struct DisplayRegistration {
    display: Display,
}

impl DisplayRegistration {
    fn register(display: Display) -> Self {
        panic_handler::register_display(display.clone());
        Self { display }
    }
}

impl Drop for DisplayRegistration {
    fn drop(&mut self) {
        panic_handler::unregister_display();
        self.display.close();
    }
}

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub debug: bool,
    /// Use the built-in demo route regardless of `[feed] source`
    pub replay: bool,
    /// Stop after this many streaming ticks
    pub ticks: Option<u64>,
}

/// Run the run command.
pub fn run(config_path: Option<&Path>, args: RunArgs) -> Result<(), CliError> {
    // Initialize panic handler early so the display is closed on crash
    panic_handler::init();

    let runner = CliRunner::new(config_path, args.debug)?;
    runner.log_startup("run");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let result = runtime.block_on(run_live(runner.config(), &args));
    // A render abandoned after its timeout may still hold a blocking thread
    runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);

    print_summary(&result?);
    Ok(())
}

async fn run_live(config: &ConfigFile, args: &RunArgs) -> Result<LoopOutcome, CliError> {
    let display = Display::new(create_display_sink(config)?);
    let _registration = DisplayRegistration::register(display.clone());

    let cancellation_token = CancellationToken::new();
    let handler_token = cancellation_token.clone();
    ctrlc::set_handler(move || {
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let store = Arc::new(RegionStore::new(config.region_store_config()));
    let feed = LocationFeed::new();
    let source = create_fix_source(config, args.replay).await?;

    let renderer = Arc::new(StaticMapRenderer::new(config.static_map_config()));
    let tracker = ViewportTracker::new(config.tracker_config(), renderer)
        .map_err(|e| CliError::Config(e.to_string()))?;

    let mut loop_config = config.live_loop_config();
    loop_config.max_ticks = args.ticks;

    let controller = Arc::new(LiveLoopController::new(
        loop_config,
        Arc::clone(&store),
        feed.clone(),
        Arc::new(tracker),
        display,
    )?);
    {
        let controller = Arc::clone(&controller);
        panic_handler::set_stats_callback(move || controller.stats());
    }

    let startup: Vec<Arc<dyn Subsystem>> = vec![
        Arc::new(RegionStoreSubsystem::new(store, args.debug)),
        Arc::new(LocationFeedSubsystem::new(
            feed,
            source,
            cancellation_token.clone(),
        )),
    ];

    let result = controller.run(startup, cancellation_token.clone()).await;

    // Stops the fix source and ingester
    cancellation_token.cancel();
    info!("Live loop finished");

    Ok(result?)
}

fn create_display_sink(config: &ConfigFile) -> Result<Arc<dyn DisplaySink>, CliError> {
    let sink: Arc<dyn DisplaySink> = match config.display.kind {
        DisplayKind::Log => Arc::new(TracingDisplay),
        DisplayKind::Frames => Arc::new(
            FrameDirDisplay::new(config.display.output_dir.clone()).map_err(CliError::Display)?,
        ),
        DisplayKind::None => Arc::new(NoOpDisplay),
    };
    info!(kind = %config.display.kind, "Display sink created");
    Ok(sink)
}

async fn create_fix_source(
    config: &ConfigFile,
    force_replay: bool,
) -> Result<Box<dyn FixSource>, CliError> {
    let kind = if force_replay {
        FeedSourceKind::Replay
    } else {
        config.feed.source
    };

    let source: Box<dyn FixSource> = match kind {
        FeedSourceKind::Replay => Box::new(ReplaySource::demo(
            Duration::from_millis(config.feed.replay_interval_ms),
            config.feed.replay_loop,
        )),
        FeedSourceKind::Stdin => Box::new(LineSource::new(BufReader::new(tokio::io::stdin()))),
        FeedSourceKind::File => {
            let path = config.feed.path.clone().ok_or_else(|| {
                CliError::Config("[feed] path is required when source = file".to_string())
            })?;
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| CliError::FixSource {
                    path: path.clone(),
                    error: LocationError::from(e),
                })?;
            Box::new(LineSource::new(BufReader::new(file)))
        }
    };
    info!(source = source.name(), "Fix source created");
    Ok(source)
}

fn print_summary(outcome: &LoopOutcome) {
    let reason = match outcome.exit {
        ExitReason::Interrupted => "interrupted",
        ExitReason::Completed => "completed",
    };
    let stats = &outcome.stats;

    println!();
    println!("Session {}", reason);
    println!("  Streaming:        {:.1}s", stats.streaming_for.as_secs_f64());
    println!("  Ticks:            {}", stats.ticks);
    println!(
        "  Maps rendered:    {} ({:.0}%)",
        stats.renders,
        stats.render_rate() * 100.0
    );
    println!("  Region changes:   {}", stats.region_changes);
    println!("  Transient errors: {}", stats.transient_errors);
    println!("  Busy ticks:       {}", stats.busy_ticks);
    println!("  Display failures: {}", stats.display_failures);
}
