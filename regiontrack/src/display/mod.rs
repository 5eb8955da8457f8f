//! Display sink abstraction.
//!
//! The core never talks to screen hardware. It calls a [`DisplaySink`]
//! through the best-effort [`Display`] handle, which logs and counts failures
//! instead of returning them.
//!
//! # Architecture
//!
//! - `DisplaySink` trait: the collaborator interface
//! - `TracingDisplay`: writes every call to the log (headless default)
//! - `FrameDirDisplay`: writes frames into a directory a screen driver watches
//! - `NoOpDisplay`: discards everything, for tests and benchmarks
//!
//! # Usage
//!
//! ```
//! use regiontrack::display::{Display, NoOpDisplay, TextMessage};
//! use std::sync::Arc;
//!
//! let display = Display::new(Arc::new(NoOpDisplay));
//! display.show_text(&TextMessage::new("Checks passed"));
//! assert!(display.close());
//! assert!(!display.close());
//! ```

mod error;
mod frames;
mod handle;
mod noop;
mod status;
mod tracing_display;
mod r#trait;

pub use error::DisplayError;
pub use frames::{FrameDirDisplay, LOADING_FILENAME, MAP_FILENAME, STATUS_FILENAME};
pub use handle::Display;
pub use noop::NoOpDisplay;
pub use r#trait::{DisplaySink, TextMessage, DEFAULT_FONT_SIZE};
pub use status::{spawn_status_updater, STATUS_FONT_SIZE};
pub use tracing_display::TracingDisplay;
