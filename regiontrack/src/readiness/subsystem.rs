//! The subsystem seam polled by the coordinator.

use std::sync::Arc;

use super::state::ProbeStatus;

/// A unit of startup work with a readiness probe.
///
/// `start` kicks off initialization without blocking (typically by spawning a
/// task) and `probe` reports progress without blocking.
pub trait Subsystem: Send + Sync {
    /// Name used in reports and status lines.
    fn name(&self) -> &str;

    /// Whether readiness depends on this subsystem.
    fn required(&self) -> bool {
        true
    }

    /// Begin initialization. Called once, before the first probe.
    fn start(&self) {}

    /// Report current progress.
    fn probe(&self) -> ProbeStatus;
}

/// A subsystem defined by a probe closure, with nothing to start.
pub struct ProbeFn<F> {
    name: String,
    required: bool,
    probe: F,
}

impl<F> ProbeFn<F>
where
    F: Fn() -> ProbeStatus + Send + Sync,
{
    pub fn new(name: impl Into<String>, probe: F) -> Self {
        Self {
            name: name.into(),
            required: true,
            probe,
        }
    }

    /// Mark this probe as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

impl<F> Subsystem for ProbeFn<F>
where
    F: Fn() -> ProbeStatus + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required(&self) -> bool {
        self.required
    }

    fn probe(&self) -> ProbeStatus {
        (self.probe)()
    }
}

/// A required subsystem that is Ready whenever `predicate` holds.
pub fn flag_probe<P>(name: impl Into<String>, predicate: P) -> Arc<dyn Subsystem>
where
    P: Fn() -> bool + Send + Sync + 'static,
{
    Arc::new(ProbeFn::new(name, move || {
        if predicate() {
            ProbeStatus::Ready
        } else {
            ProbeStatus::Pending
        }
    }))
}
