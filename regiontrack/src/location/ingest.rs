//! Background ingester draining a fix channel into the feed.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::feed::LocationFeed;
use super::sample::RawFix;

/// Spawn a task that ingests every fix from `fix_rx` into `feed`.
///
/// Stops when cancelled or when every sender has been dropped.
pub fn spawn_ingester(
    feed: LocationFeed,
    mut fix_rx: mpsc::Receiver<RawFix>,
    cancellation_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Location ingester started");

        loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    debug!("Location ingester cancelled");
                    break;
                }

                fix = fix_rx.recv() => match fix {
                    Some(fix) => {
                        feed.ingest(fix);
                    }
                    None => {
                        debug!("Fix channel closed, stopping ingester");
                        break;
                    }
                }
            }
        }

        let stats = feed.stats();
        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            "Location ingester stopped"
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationReading;

    #[tokio::test]
    async fn test_ingests_until_channel_closed() {
        let feed = LocationFeed::new();
        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_ingester(feed.clone(), rx, CancellationToken::new());

        tx.send(RawFix::new(44.0, 8.0, 0.0)).await.unwrap();
        tx.send(RawFix::default()).await.unwrap();
        tx.send(RawFix::new(45.0, 9.0, 5.0)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let sample = feed.latest().sample().unwrap();
        assert_eq!((sample.latitude, sample.longitude), (45.0, 9.0));
        assert_eq!(feed.stats().accepted, 2);
        assert_eq!(feed.stats().rejected, 1);
    }

    #[tokio::test]
    async fn test_stops_on_cancel() {
        let feed = LocationFeed::new();
        let (_tx, rx) = mpsc::channel::<RawFix>(8);
        let token = CancellationToken::new();
        let handle = spawn_ingester(feed.clone(), rx, token.clone());

        token.cancel();
        handle.await.unwrap();
        assert_eq!(feed.latest(), LocationReading::NoDataYet);
    }
}
