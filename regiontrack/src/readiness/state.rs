//! Readiness state types.

use std::fmt;
use std::time::Duration;

/// Per-subsystem readiness.
///
/// `Ready`, `Failed` and `TimedOut` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Pending,
    Ready,
    Failed,
    TimedOut,
}

impl ReadinessState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReadinessState::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessState::Pending => "pending",
            ReadinessState::Ready => "ready",
            ReadinessState::Failed => "failed",
            ReadinessState::TimedOut => "timed out",
        }
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single non-blocking probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Pending,
    Ready,
    /// Unrecoverable initialization error.
    Failed(String),
}

/// Final state of one subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsystemReport {
    pub name: String,
    pub required: bool,
    pub state: ReadinessState,
    /// Failure reason reported by the probe.
    pub reason: Option<String>,
}

/// Outcome of a readiness run, in subsystem order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessReport {
    pub subsystems: Vec<SubsystemReport>,
    /// Time from start until the run settled.
    pub elapsed: Duration,
}

impl ReadinessReport {
    /// True when every required subsystem is Ready.
    pub fn is_ready(&self) -> bool {
        self.subsystems
            .iter()
            .filter(|s| s.required)
            .all(|s| s.state == ReadinessState::Ready)
    }

    /// Names of required subsystems that did not reach Ready.
    pub fn not_ready(&self) -> Vec<&str> {
        self.subsystems
            .iter()
            .filter(|s| s.required && s.state != ReadinessState::Ready)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// State of a subsystem by name.
    pub fn state(&self, name: &str) -> Option<ReadinessState> {
        self.subsystems
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.state)
    }

    /// Human-readable summary listing failed subsystems.
    pub fn diagnostic(&self) -> String {
        if self.is_ready() {
            return format!("All subsystems ready after {:.1}s", self.elapsed.as_secs_f64());
        }

        let failures: Vec<String> = self
            .subsystems
            .iter()
            .filter(|s| s.required && s.state != ReadinessState::Ready)
            .map(|s| match &s.reason {
                Some(reason) => format!("{} ({}: {})", s.name, s.state, reason),
                None => format!("{} ({})", s.name, s.state),
            })
            .collect();

        format!(
            "Subsystems not ready after {:.1}s: {}",
            self.elapsed.as_secs_f64(),
            failures.join(", ")
        )
    }
}
