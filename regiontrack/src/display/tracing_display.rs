//! Display sink that writes everything to the log.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use super::error::DisplayError;
use super::r#trait::{DisplaySink, TextMessage};
use crate::viewport::MapArtifact;

/// Logs every display call at info level.
///
/// Useful headless, and as the default when no screen driver is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDisplay;

impl DisplaySink for TracingDisplay {
    fn show_text(&self, message: &TextMessage) -> Result<(), DisplayError> {
        info!(
            target: "regiontrack::display",
            font_size = message.font_size,
            hold_ms = message.hold.as_millis() as u64,
            "{}",
            message.text.replace('\n', " | ")
        );
        Ok(())
    }

    fn show_map(&self, artifact: &MapArtifact) -> Result<(), DisplayError> {
        info!(
            target: "regiontrack::display",
            lat = format!("{:.6}", artifact.position.lat),
            lon = format!("{:.6}", artifact.position.lon),
            bbox = %artifact.bbox,
            width = artifact.width,
            height = artifact.height,
            bytes = artifact.png.len(),
            "Map frame"
        );
        Ok(())
    }

    fn display_loading_sequence(&self, path: &Path, frame_duration: Duration) -> Result<(), DisplayError> {
        info!(
            target: "regiontrack::display",
            path = %path.display(),
            frame_ms = frame_duration.as_millis() as u64,
            "Loading sequence"
        );
        Ok(())
    }

    fn close(&self) -> Result<(), DisplayError> {
        info!(target: "regiontrack::display", "Display closed");
        Ok(())
    }
}
