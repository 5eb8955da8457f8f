//! Fix sources feeding the ingester channel.
//!
//! Sources deliver already decoded fixes; no hardware protocol decoding
//! happens here.
//!
//! - [`ReplaySource`] - replays a fixed route, for bench testing without a receiver
//! - [`LineSource`] - reads `lat,lon[,speed]` lines from any async reader

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::LocationError;
use super::sample::RawFix;

/// Default interval between replayed fixes.
pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Demo drive used for bench testing, as (lat, lon) pairs.
pub const DEMO_ROUTE: [(f64, f64); 31] = [
    (44.979213842916465, 8.566036475980964),
    (44.979299995924585, 8.566131204721652),
    (44.97960312626724, 8.566455991134188),
    (44.979887111683865, 8.566428926334977),
    (44.980218959668356, 8.565973318027964),
    (44.98068800591733, 8.565580867755388),
    (44.98102941744561, 8.565301191847253),
    (44.98135806962276, 8.56508917299625),
    (44.98158460408342, 8.56467416966037),
    (44.981855816779316, 8.564299753622562),
    (44.98148568662383, 8.564177964377313),
    (44.98101026156943, 8.564078733548387),
    (44.98072308894788, 8.563411119401687),
    (44.98051248967389, 8.562901391646172),
    (44.98023171140059, 8.562175124169936),
    (44.97993177003429, 8.561430825951726),
    (44.979717990393254, 8.560862451367381),
    (44.979497811876534, 8.559915165021108),
    (44.97943400040123, 8.55910770427052),
    (44.97920426094329, 8.558137858271923),
    (44.97857566342873, 8.557001103972572),
    (44.9781672244454, 8.556216208311506),
    (44.97758009901368, 8.555598206892364),
    (44.97683979351433, 8.555061414024719),
    (44.976511120282055, 8.554935101206594),
    (44.97588886973584, 8.554948633825195),
    (44.97531128852977, 8.554957652985971),
    (44.97451032234257, 8.554899014419266),
    (44.97388166833287, 8.554452431775037),
    (44.97296260787555, 8.5533066583467),
    (44.972467964985206, 8.552661605705975),
];

/// A producer of raw fixes.
///
/// The boxed future return type allows runtime selection of the source.
pub trait FixSource: Send {
    /// Send fixes into `fix_tx` until exhausted, cancelled, or the channel closes.
    fn run(
        self: Box<Self>,
        fix_tx: mpsc::Sender<RawFix>,
        cancellation_token: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LocationError>> + Send>>;

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}

/// Replays a route of waypoints at a fixed interval.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    route: Vec<RawFix>,
    interval: Duration,
    looping: bool,
}

impl ReplaySource {
    pub fn new(route: Vec<RawFix>, interval: Duration, looping: bool) -> Self {
        Self {
            route,
            interval,
            looping,
        }
    }

    /// The built-in demo drive at walking pace.
    pub fn demo(interval: Duration, looping: bool) -> Self {
        let route = DEMO_ROUTE
            .iter()
            .map(|&(lat, lon)| RawFix::new(lat, lon, 0.0))
            .collect();
        Self::new(route, interval, looping)
    }

    pub fn len(&self) -> usize {
        self.route.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route.is_empty()
    }

    async fn replay(
        self,
        fix_tx: mpsc::Sender<RawFix>,
        cancellation_token: CancellationToken,
    ) -> Result<(), LocationError> {
        if self.route.is_empty() {
            return Err(LocationError::EmptyRoute);
        }

        info!(
            waypoints = self.route.len(),
            interval_ms = self.interval.as_millis() as u64,
            looping = self.looping,
            "Replay source started"
        );

        let mut sent: u64 = 0;
        'outer: loop {
            for fix in &self.route {
                if fix_tx.send(*fix).await.is_err() {
                    debug!("Fix channel closed, stopping replay");
                    break 'outer;
                }
                sent += 1;
                trace!(sent, "Replayed fix");

                tokio::select! {
                    _ = cancellation_token.cancelled() => break 'outer,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            if !self.looping {
                break;
            }
        }

        info!(sent, "Replay source stopped");
        Ok(())
    }
}

impl FixSource for ReplaySource {
    fn run(
        self: Box<Self>,
        fix_tx: mpsc::Sender<RawFix>,
        cancellation_token: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LocationError>> + Send>> {
        Box::pin((*self).replay(fix_tx, cancellation_token))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

/// Reads `lat,lon[,speed]` text lines.
///
/// Blank lines and lines starting with `#` are ignored. A field that is
/// missing or not a number becomes `None`, and the feed rejects the fix.
pub struct LineSource<R> {
    reader: R,
}

impl<R> LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    async fn read_lines(
        self,
        fix_tx: mpsc::Sender<RawFix>,
        cancellation_token: CancellationToken,
    ) -> Result<(), LocationError> {
        let mut lines = self.reader.lines();
        let mut read: u64 = 0;

        loop {
            let line = tokio::select! {
                _ = cancellation_token.cancelled() => break,
                line = lines.next_line() => line?,
            };

            let Some(line) = line else {
                debug!("Fix stream ended");
                break;
            };

            let Some(fix) = parse_fix_line(&line) else {
                continue;
            };
            read += 1;
            if fix_tx.send(fix).await.is_err() {
                debug!("Fix channel closed, stopping line reader");
                break;
            }
        }

        info!(fixes = read, "Line source stopped");
        Ok(())
    }
}

impl<R> FixSource for LineSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn run(
        self: Box<Self>,
        fix_tx: mpsc::Sender<RawFix>,
        cancellation_token: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<(), LocationError>> + Send>> {
        Box::pin((*self).read_lines(fix_tx, cancellation_token))
    }

    fn name(&self) -> &'static str {
        "lines"
    }
}

/// Parse one `lat,lon[,speed]` line. Returns `None` for blank and comment lines.
///
/// Missing or unparseable fields are left as `None`; the feed rejects such
/// fixes.
pub fn parse_fix_line(line: &str) -> Option<RawFix> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut fields = line.split(',').map(str::trim);
    let mut next_number = || {
        fields
            .next()
            .filter(|f| !f.is_empty())
            .and_then(|f| f.parse::<f64>().ok())
    };

    let latitude = next_number();
    let longitude = next_number();
    let speed = next_number();

    let fix = RawFix {
        latitude,
        longitude,
        speed,
    };
    if !fix.is_complete() {
        warn!(line = %line, "Incomplete fix line");
    }
    Some(fix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fix_line() {
        assert_eq!(
            parse_fix_line("44.98, 8.56, 30.5"),
            Some(RawFix::new(44.98, 8.56, 30.5))
        );
        assert_eq!(
            parse_fix_line("44.98,8.56"),
            Some(RawFix {
                latitude: Some(44.98),
                longitude: Some(8.56),
                speed: None,
            })
        );
        assert_eq!(parse_fix_line("   "), None);
        assert_eq!(parse_fix_line("# header"), None);
    }

    #[test]
    fn test_parse_fix_line_missing_fields() {
        let fix = parse_fix_line("44.98,,12").unwrap();
        assert_eq!(fix.latitude, Some(44.98));
        assert_eq!(fix.longitude, None);

        let fix = parse_fix_line("44.98,8.56,fast").unwrap();
        assert_eq!(fix.speed, None);

        let fix = parse_fix_line("garbage").unwrap();
        assert_eq!(fix.latitude, None);
    }

    #[test]
    fn test_demo_route_starts_at_first_waypoint() {
        let source = ReplaySource::demo(DEFAULT_REPLAY_INTERVAL, false);
        assert_eq!(source.len(), 31);
        assert_eq!(
            source.route[0],
            RawFix::new(44.979213842916465, 8.566036475980964, 0.0)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_sends_every_waypoint_once() {
        let (tx, mut rx) = mpsc::channel(64);
        let source = Box::new(ReplaySource::demo(Duration::from_millis(100), false));
        let handle = tokio::spawn(source.run(tx, CancellationToken::new()));

        let mut received = Vec::new();
        while let Some(fix) = rx.recv().await {
            received.push(fix);
        }
        handle.await.unwrap().unwrap();

        assert_eq!(received.len(), DEMO_ROUTE.len());
        assert_eq!(received[30].latitude, Some(DEMO_ROUTE[30].0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_looping_replay_stops_on_cancel() {
        let (tx, mut rx) = mpsc::channel(64);
        let token = CancellationToken::new();
        let route = vec![RawFix::new(1.0, 1.0, 0.0), RawFix::new(2.0, 2.0, 0.0)];
        let source = Box::new(ReplaySource::new(route, Duration::from_millis(10), true));
        let handle = tokio::spawn(source.run(tx, token.clone()));

        for _ in 0..5 {
            rx.recv().await.unwrap();
        }
        token.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_empty_route_is_error() {
        let (tx, _rx) = mpsc::channel(1);
        let source = Box::new(ReplaySource::new(Vec::new(), DEFAULT_REPLAY_INTERVAL, false));
        assert!(matches!(
            source.run(tx, CancellationToken::new()).await,
            Err(LocationError::EmptyRoute)
        ));
    }

    #[tokio::test]
    async fn test_line_source_reads_until_eof() {
        let input: &[u8] = b"# lat,lon,speed\n44.5,8.5,10\n\n45.0,9.0\n";
        let (tx, mut rx) = mpsc::channel(8);
        let source = Box::new(LineSource::new(tokio::io::BufReader::new(input)));
        source.run(tx, CancellationToken::new()).await.unwrap();

        assert_eq!(rx.recv().await, Some(RawFix::new(44.5, 8.5, 10.0)));
        assert_eq!(rx.recv().await.map(|fix| fix.speed), Some(None));
        assert_eq!(rx.recv().await, None);
    }
}
