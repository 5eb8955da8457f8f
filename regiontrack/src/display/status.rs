//! Background task forwarding status lines to the display.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::handle::Display;
use super::r#trait::TextMessage;

/// Font size used for startup status text.
pub const STATUS_FONT_SIZE: u32 = 14;

/// Forward every new status line to the display until cancelled or the
/// sender is dropped.
pub fn spawn_status_updater(
    display: Display,
    mut status_rx: watch::Receiver<String>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let line = status_rx.borrow_and_update().clone();
            if !line.is_empty() {
                display.show_text(
                    &TextMessage::new(line)
                        .with_font_size(STATUS_FONT_SIZE)
                        .with_hold(Duration::ZERO),
                );
            }

            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => break,

                changed = status_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Status updater stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayError, DisplaySink};
    use crate::viewport::MapArtifact;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl DisplaySink for Recorder {
        fn show_text(&self, message: &TextMessage) -> Result<(), DisplayError> {
            self.0.lock().unwrap().push(message.text.clone());
            Ok(())
        }
        fn show_map(&self, _artifact: &MapArtifact) -> Result<(), DisplayError> {
            Ok(())
        }
        fn display_loading_sequence(&self, _path: &Path, _frame: Duration) -> Result<(), DisplayError> {
            Ok(())
        }
        fn close(&self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_forwards_changes_until_sender_dropped() {
        let recorder = Arc::new(Recorder::default());
        let (tx, rx) = watch::channel(String::new());
        let handle = spawn_status_updater(
            Display::new(recorder.clone()),
            rx,
            CancellationToken::new(),
        );

        tx.send_replace("Startup... 0s".to_string());
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send_replace("Startup... 1s".to_string());
        drop(tx);
        handle.await.unwrap();

        let shown = recorder.0.lock().unwrap().clone();
        assert_eq!(shown.last().map(String::as_str), Some("Startup... 1s"));
        assert!(!shown.iter().any(|s| s.is_empty()));
    }
}
