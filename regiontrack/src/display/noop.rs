//! No-operation display sink.

use std::path::Path;
use std::time::Duration;

use super::error::DisplayError;
use super::r#trait::{DisplaySink, TextMessage};
use crate::viewport::MapArtifact;

/// A display that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDisplay;

impl DisplaySink for NoOpDisplay {
    #[inline]
    fn show_text(&self, _message: &TextMessage) -> Result<(), DisplayError> {
        Ok(())
    }

    #[inline]
    fn show_map(&self, _artifact: &MapArtifact) -> Result<(), DisplayError> {
        Ok(())
    }

    #[inline]
    fn display_loading_sequence(&self, _path: &Path, _frame_duration: Duration) -> Result<(), DisplayError> {
        Ok(())
    }

    #[inline]
    fn close(&self) -> Result<(), DisplayError> {
        Ok(())
    }
}
