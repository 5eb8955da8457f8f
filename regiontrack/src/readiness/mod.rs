//! Readiness Coordinator: gate startup on subsystem probes.
//!
//! ```text
//! start() all ──► poll probes ──► all required Ready? ── yes ──► report (ready)
//!                    ▲     │               │ no
//!                    │     │      required Failed? ── yes ──► report (not ready)
//!                    │     │               │ no
//!                    │     │      deadline passed? ── yes ──► Pending → TimedOut
//!                    └─ sleep(min(interval, time to deadline))
//! ```
//!
//! While polling, the coordinator publishes a status line on a
//! `tokio::sync::watch` channel; [`spawn_status_updater`](crate::display::spawn_status_updater)
//! forwards it to the display.
//!
//! A report that is not ready is fatal for the caller: there is no partial
//! continuation.

mod coordinator;
mod state;
mod subsystem;

pub use coordinator::{
    ReadinessConfig, ReadinessCoordinator, ReadinessError, DEFAULT_DEADLINE, DEFAULT_POLL_INTERVAL,
};
pub use state::{ProbeStatus, ReadinessReport, ReadinessState, SubsystemReport};
pub use subsystem::{flag_probe, ProbeFn, Subsystem};
