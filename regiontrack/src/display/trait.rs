//! Display sink trait definition.

use std::path::Path;
use std::time::Duration;

use super::error::DisplayError;
use crate::viewport::MapArtifact;

/// Default font size for status text.
pub const DEFAULT_FONT_SIZE: u32 = 12;

/// A text message for the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub text: String,
    pub font_size: u32,
    /// How long the message should stay up before the next update may replace it.
    pub hold: Duration,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: DEFAULT_FONT_SIZE,
            hold: Duration::ZERO,
        }
    }

    pub fn with_font_size(mut self, font_size: u32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }
}

/// The physical screen, or whatever stands in for it.
///
/// Calls must not block for long: the live loop calls them every tick.
/// Callers treat every failure as best-effort (see
/// [`Display`](super::Display)).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the status updater and the live loop
/// share one sink.
pub trait DisplaySink: Send + Sync {
    fn show_text(&self, message: &TextMessage) -> Result<(), DisplayError>;

    fn show_map(&self, artifact: &MapArtifact) -> Result<(), DisplayError>;

    /// Play an animation file (e.g. a loading GIF) with the given frame duration.
    fn display_loading_sequence(&self, path: &Path, frame_duration: Duration) -> Result<(), DisplayError>;

    /// Release the screen.
    fn close(&self) -> Result<(), DisplayError>;
}
