//! Best-effort wrapper around a display sink.
//!
//! Display failures never change control flow: each one is logged and
//! counted, and the call reports `false`. Closing is idempotent; only the
//! first [`Display::close`] reaches the sink, and nothing is forwarded after
//! it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::error::DisplayError;
use super::r#trait::{DisplaySink, TextMessage};
use crate::viewport::MapArtifact;

#[derive(Debug, Default)]
struct DisplayState {
    failures: AtomicU64,
    closed: AtomicBool,
}

/// Cloneable best-effort handle to the shared display sink.
#[derive(Clone)]
pub struct Display {
    sink: Arc<dyn DisplaySink>,
    state: Arc<DisplayState>,
}

impl Display {
    pub fn new(sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            sink,
            state: Arc::new(DisplayState::default()),
        }
    }

    pub fn show_text(&self, message: &TextMessage) -> bool {
        self.deliver("show_text", |sink| sink.show_text(message))
    }

    pub fn show_map(&self, artifact: &MapArtifact) -> bool {
        self.deliver("show_map", |sink| sink.show_map(artifact))
    }

    pub fn display_loading_sequence(&self, path: &Path, frame_duration: Duration) -> bool {
        self.deliver("display_loading_sequence", |sink| {
            sink.display_loading_sequence(path, frame_duration)
        })
    }

    /// Close the sink. Returns true only for the call that actually closed it.
    pub fn close(&self) -> bool {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            debug!("Display already closed");
            return false;
        }
        if let Err(e) = self.sink.close() {
            self.record_failure("close", &e);
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Number of failed sink calls.
    pub fn failures(&self) -> u64 {
        self.state.failures.load(Ordering::Relaxed)
    }

    fn deliver(
        &self,
        operation: &'static str,
        call: impl FnOnce(&dyn DisplaySink) -> Result<(), DisplayError>,
    ) -> bool {
        if self.is_closed() {
            return false;
        }
        match call(self.sink.as_ref()) {
            Ok(()) => true,
            Err(e) => {
                self.record_failure(operation, &e);
                false
            }
        }
    }

    fn record_failure(&self, operation: &'static str, error: &DisplayError) {
        let failures = self.state.failures.fetch_add(1, Ordering::Relaxed) + 1;
        warn!(operation, error = %error, failures, "Display call failed");
    }
}

impl std::fmt::Debug for Display {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Display")
            .field("failures", &self.failures())
            .field("closed", &self.is_closed())
            .finish()
    }
}
