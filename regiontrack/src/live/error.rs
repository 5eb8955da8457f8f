//! Live loop error types.

use std::time::Duration;

use thiserror::Error;

use crate::region::RegionError;
use crate::viewport::ViewportError;

/// Fatal errors that end the loop.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LiveLoopError {
    /// A readiness phase ended without every required subsystem Ready.
    #[error("{phase} failed: {diagnostic}")]
    NotReady {
        phase: &'static str,
        diagnostic: String,
    },

    /// A loop setting is unusable.
    #[error("invalid live loop configuration: {0}")]
    InvalidConfig(String),
}

/// Per-tick errors: reported to the display and counted, never fatal.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("No GPS data")]
    NoData,

    #[error("Region lookup failed: {0}")]
    Region(#[from] RegionError),

    #[error("Map unavailable: {0}")]
    Viewport(#[from] ViewportError),

    #[error("Map render timed out after {0:?}")]
    RenderTimeout(Duration),

    #[error("Map render still in progress")]
    RenderBusy,

    #[error("Map render task failed: {0}")]
    RenderTask(String),
}
