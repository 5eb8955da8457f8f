//! Display sink that writes frames into a directory.
//!
//! A screen driver process watches the directory and pushes whatever it finds
//! to the panel. Every file is written to a temporary sibling and renamed into
//! place, so the driver never reads a half-written frame.
//!
//! ```text
//! <output_dir>/
//! ├── map.png        latest map frame
//! ├── status.json    latest text message
//! └── loading.json   loading animation request
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::error::DisplayError;
use super::r#trait::{DisplaySink, TextMessage};
use crate::viewport::MapArtifact;

pub const MAP_FILENAME: &str = "map.png";
pub const STATUS_FILENAME: &str = "status.json";
pub const LOADING_FILENAME: &str = "loading.json";

#[derive(Serialize)]
struct StatusRecord<'a> {
    text: &'a str,
    font_size: u32,
    hold_ms: u64,
    closed: bool,
}

#[derive(Serialize)]
struct LoadingRecord<'a> {
    path: &'a Path,
    frame_ms: u64,
}

/// Writes the latest map and status into `output_dir`.
#[derive(Debug, Clone)]
pub struct FrameDirDisplay {
    output_dir: PathBuf,
}

impl FrameDirDisplay {
    /// Create the sink, creating `output_dir` if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, DisplayError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|source| DisplayError::Write {
            path: output_dir.clone(),
            source,
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_atomic(&self, filename: &str, contents: &[u8]) -> Result<(), DisplayError> {
        let path = self.output_dir.join(filename);
        let tmp = self.output_dir.join(format!(".{}.tmp", filename));

        fs::write(&tmp, contents)
            .and_then(|()| fs::rename(&tmp, &path))
            .map_err(|source| DisplayError::Write {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = contents.len(), "Frame written");
        Ok(())
    }

    fn write_status(&self, message: &TextMessage, closed: bool) -> Result<(), DisplayError> {
        let record = StatusRecord {
            text: &message.text,
            font_size: message.font_size,
            hold_ms: message.hold.as_millis() as u64,
            closed,
        };
        self.write_atomic(STATUS_FILENAME, &to_json(&record))
    }
}

fn to_json<T: Serialize>(value: &T) -> Vec<u8> {
    // Serializing these plain records cannot fail
    serde_json::to_vec_pretty(value).unwrap_or_default()
}

impl DisplaySink for FrameDirDisplay {
    fn show_text(&self, message: &TextMessage) -> Result<(), DisplayError> {
        self.write_status(message, false)
    }

    fn show_map(&self, artifact: &MapArtifact) -> Result<(), DisplayError> {
        self.write_atomic(MAP_FILENAME, &artifact.png)
    }

    fn display_loading_sequence(&self, path: &Path, frame_duration: Duration) -> Result<(), DisplayError> {
        fs::metadata(path).map_err(|source| DisplayError::LoadingSequence {
            path: path.to_path_buf(),
            source,
        })?;

        let record = LoadingRecord {
            path,
            frame_ms: frame_duration.as_millis() as u64,
        };
        self.write_atomic(LOADING_FILENAME, &to_json(&record))
    }

    fn close(&self) -> Result<(), DisplayError> {
        let map = self.output_dir.join(MAP_FILENAME);
        if map.exists() {
            fs::remove_file(&map).map_err(|source| DisplayError::Write { path: map, source })?;
        }
        self.write_status(&TextMessage::new(""), true)
    }
}
