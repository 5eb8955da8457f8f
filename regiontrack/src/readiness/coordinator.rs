//! ReadinessCoordinator - bounded poll over subsystem probes.
//!
//! Every subsystem is started, then all probes are polled at `poll_interval`
//! until every required subsystem is Ready, a required subsystem Failed, or
//! the deadline passes. The last poll is scheduled exactly at the deadline, so
//! a subsystem that never becomes ready is declared TimedOut at the deadline,
//! never earlier.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{ProbeStatus, ReadinessReport, ReadinessState, SubsystemReport};
use super::subsystem::Subsystem;

/// Default interval between probe rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default global deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// Poll interval and deadline for one readiness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Time between probe rounds. Must be non-zero.
    pub poll_interval: Duration,
    /// Time after which Pending subsystems become TimedOut.
    pub deadline: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadinessError {
    /// The cancellation token fired while waiting.
    #[error("readiness wait cancelled")]
    Cancelled,
}

/// Runs the start-then-poll readiness protocol.
#[derive(Debug, Clone, Default)]
pub struct ReadinessCoordinator {
    config: ReadinessConfig,
}

impl ReadinessCoordinator {
    pub fn new(config: ReadinessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Start all subsystems and poll them until settled.
    ///
    /// `phase` labels log lines and the status text published on `status`.
    pub async fn run(
        &self,
        phase: &str,
        subsystems: &[Arc<dyn Subsystem>],
        status: &watch::Sender<String>,
        cancellation_token: &CancellationToken,
    ) -> Result<ReadinessReport, ReadinessError> {
        let start = Instant::now();
        let deadline = start + self.config.deadline;

        info!(
            phase,
            subsystems = subsystems.len(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            deadline_ms = self.config.deadline.as_millis() as u64,
            "Waiting for readiness"
        );

        for subsystem in subsystems {
            debug!(phase, subsystem = subsystem.name(), "Starting subsystem");
            subsystem.start();
        }

        let mut states = vec![ReadinessState::Pending; subsystems.len()];
        let mut reasons: Vec<Option<String>> = vec![None; subsystems.len()];

        loop {
            let now = Instant::now();
            let elapsed = now - start;

            for (i, subsystem) in subsystems.iter().enumerate() {
                if states[i].is_terminal() {
                    continue;
                }
                match subsystem.probe() {
                    ProbeStatus::Pending => {}
                    ProbeStatus::Ready => {
                        info!(
                            phase,
                            subsystem = subsystem.name(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Subsystem ready"
                        );
                        states[i] = ReadinessState::Ready;
                    }
                    ProbeStatus::Failed(reason) => {
                        warn!(
                            phase,
                            subsystem = subsystem.name(),
                            reason = %reason,
                            "Subsystem failed"
                        );
                        states[i] = ReadinessState::Failed;
                        reasons[i] = Some(reason);
                    }
                }
            }

            let required = || {
                subsystems
                    .iter()
                    .zip(states.iter())
                    .filter(|(s, _)| s.required())
                    .map(|(_, state)| *state)
            };
            let all_ready = required().all(|s| s == ReadinessState::Ready);
            let any_failed = required().any(|s| s == ReadinessState::Failed);
            let expired = now >= deadline;

            if expired && !all_ready {
                for (i, subsystem) in subsystems.iter().enumerate() {
                    if states[i] == ReadinessState::Pending {
                        warn!(phase, subsystem = subsystem.name(), "Subsystem timed out");
                        states[i] = ReadinessState::TimedOut;
                    }
                }
            }

            publish_status(status, &format_status(phase, elapsed, subsystems, &states));

            if all_ready || any_failed || expired {
                let report = ReadinessReport {
                    subsystems: subsystems
                        .iter()
                        .zip(states)
                        .zip(reasons)
                        .map(|((s, state), reason)| SubsystemReport {
                            name: s.name().to_string(),
                            required: s.required(),
                            state,
                            reason,
                        })
                        .collect(),
                    elapsed,
                };
                if report.is_ready() {
                    info!(phase, elapsed_ms = elapsed.as_millis() as u64, "Readiness reached");
                } else {
                    warn!(phase, diagnostic = %report.diagnostic(), "Readiness not reached");
                }
                return Ok(report);
            }

            let next_poll = (now + self.config.poll_interval).min(deadline);
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    info!(phase, "Readiness wait cancelled");
                    return Err(ReadinessError::Cancelled);
                }

                _ = tokio::time::sleep_until(next_poll) => {}
            }
        }
    }
}

/// Status text for the display, one subsystem per line.
fn format_status(
    phase: &str,
    elapsed: Duration,
    subsystems: &[Arc<dyn Subsystem>],
    states: &[ReadinessState],
) -> String {
    let mut text = format!("{}... {}s", phase, elapsed.as_secs());
    for (subsystem, state) in subsystems.iter().zip(states) {
        let label = match state {
            ReadinessState::Ready => "OK",
            ReadinessState::Pending => "...",
            ReadinessState::Failed => "Error",
            ReadinessState::TimedOut => "Timeout",
        };
        text.push_str(&format!("\n{}: {}", subsystem.name(), label));
    }
    text
}

fn publish_status(status: &watch::Sender<String>, line: &str) {
    status.send_if_modified(|current| {
        if current == line {
            false
        } else {
            line.clone_into(current);
            true
        }
    });
}
