//! GPS track file provider
//!
//! Reads `lat,lon` fixes, one per line, from a text file and follows it as
//! new lines are appended (a GPS logger, `gpspipe`, or a hand-edited file
//! during development). Blank lines and lines starting with `#` are ignored.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::clock::SharedClock;
use crate::geo::GeoPosition;

use super::error::{LocationError, TrackFileError};
use super::provider::{LocationProvider, PositionOptions, PositionUpdates};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Parse one `lat,lon` line; extra comma-separated columns are ignored
pub fn parse_fix(line: &str) -> Option<GeoPosition> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut fields = line.split(',').map(str::trim);
    let lat = fields.next()?.parse::<f64>().ok()?;
    let lon = fields.next()?.parse::<f64>().ok()?;
    GeoPosition::new(lat, lon)
}

#[derive(Debug, Clone, Copy)]
struct LastFix {
    position: GeoPosition,
    read_at: i64,
}

pub struct TrackFileLocation {
    path: PathBuf,
    clock: SharedClock,
    last_fix: Arc<Mutex<Option<LastFix>>>,
}

impl TrackFileLocation {
    pub fn new(path: impl Into<PathBuf>, clock: SharedClock) -> Self {
        Self {
            path: path.into(),
            clock,
            last_fix: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cached_fix(&self, maximum_age: Duration) -> Option<GeoPosition> {
        let last = *self.last_fix.lock().unwrap_or_else(|e| e.into_inner());
        let last = last?;
        let age = self.clock.now_millis() - last.read_at;
        (age <= maximum_age.as_millis() as i64).then_some(last.position)
    }

    async fn read_latest(&self) -> Result<GeoPosition, LocationError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TrackFileError::Read {
                path: self.path.clone(),
                source,
            })?;

        let position = contents
            .lines()
            .rev()
            .find_map(parse_fix)
            .ok_or(LocationError::PositionUnavailable)?;

        record_fix(&self.last_fix, position, self.clock.now_millis());
        Ok(position)
    }
}

fn record_fix(slot: &Mutex<Option<LastFix>>, position: GeoPosition, now: i64) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(LastFix {
        position,
        read_at: now,
    });
}

impl LocationProvider for TrackFileLocation {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, options: PositionOptions) -> Result<GeoPosition, LocationError> {
        if let Some(position) = self.cached_fix(options.maximum_age) {
            return Ok(position);
        }
        timeout(options.timeout, self.read_latest())
            .await
            .map_err(|_| LocationError::Timeout)?
    }

    fn watch_position(&self, _options: PositionOptions) -> PositionUpdates {
        let (tx, rx) = mpsc::channel(16);
        let path = self.path.clone();
        let clock = Arc::clone(&self.clock);
        let last_fix = Arc::clone(&self.last_fix);

        tokio::spawn(async move {
            if let Err(err) = tail_track_file(&path, &tx, &clock, &last_fix).await {
                tracing::warn!(path = %path.display(), error = %err, "Track file watch stopped");
                let _ = tx.send(Err(err.into())).await;
            }
        });

        rx
    }
}

/// Follow the file until the receiver goes away
///
/// Lines already in the file are history: only the newest valid fix among
/// them is sent, then every appended fix is sent as it arrives.
async fn tail_track_file(
    path: &Path,
    tx: &mpsc::Sender<Result<GeoPosition, LocationError>>,
    clock: &SharedClock,
    last_fix: &Mutex<Option<LastFix>>,
) -> Result<(), TrackFileError> {
    let file = File::open(path).await.map_err(|source| TrackFileError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let mut line_number = 0u64;
    let mut caught_up = false;
    let mut newest_existing: Option<GeoPosition> = None;

    loop {
        if tx.is_closed() {
            return Ok(());
        }
        let read = reader.read_line(&mut line).await.map_err(|source| TrackFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // End of data, or a partial line still being written
        if read == 0 || !line.ends_with('\n') {
            if !caught_up {
                caught_up = true;
                tracing::debug!(lines = line_number, "Track file history read");
                if let Some(position) = newest_existing.take() {
                    if tx.send(Ok(position)).await.is_err() {
                        return Ok(());
                    }
                }
            }
            sleep(POLL_INTERVAL).await;
            continue;
        }

        line_number += 1;
        match parse_fix(&line) {
            Some(position) => {
                record_fix(last_fix, position, clock.now_millis());
                if !caught_up {
                    newest_existing = Some(position);
                } else if tx.send(Ok(position)).await.is_err() {
                    return Ok(());
                }
            }
            None => {
                tracing::debug!(line_number, line = line.trim(), "Skipping track line");
            }
        }
        line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn provider_for(file: &NamedTempFile, clock: &ManualClock) -> TrackFileLocation {
        TrackFileLocation::new(file.path(), Arc::new(clock.clone()))
    }

    #[test]
    fn test_parse_fix() {
        let fix = parse_fix(" 4.6097, -74.0817 \n").unwrap();
        assert_eq!(fix.lat, 4.6097);
        assert_eq!(fix.lon, -74.0817);

        assert!(parse_fix("4.6,-74.0,2600,gps").is_some());
        assert!(parse_fix("# header").is_none());
        assert!(parse_fix("").is_none());
        assert!(parse_fix("4.6").is_none());
        assert!(parse_fix("north,west").is_none());
        assert!(parse_fix("91.0,0.0").is_none());
    }

    #[tokio::test]
    async fn test_current_position_reads_last_valid_fix() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# lat,lon").unwrap();
        writeln!(file, "4.60,-74.08").unwrap();
        writeln!(file, "6.25,-75.56").unwrap();
        writeln!(file, "garbage").unwrap();
        file.flush().unwrap();

        let provider = provider_for(&file, &ManualClock::new(0));
        let fix = provider.current_position(PositionOptions::QUICK).await.unwrap();
        assert_eq!(fix, GeoPosition::new(6.25, -75.56).unwrap());
    }

    #[tokio::test]
    async fn test_current_position_honors_maximum_age() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "4.60,-74.08").unwrap();
        file.flush().unwrap();

        let clock = ManualClock::new(0);
        let provider = provider_for(&file, &clock);
        provider.current_position(PositionOptions::QUICK).await.unwrap();

        writeln!(file, "6.25,-75.56").unwrap();
        file.flush().unwrap();

        // Within maximum age the cached reading is reused
        clock.advance(Duration::from_secs(30));
        let cached = provider.current_position(PositionOptions::QUICK).await.unwrap();
        assert_eq!(cached, GeoPosition::new(4.60, -74.08).unwrap());

        clock.advance(Duration::from_secs(31));
        let fresh = provider.current_position(PositionOptions::QUICK).await.unwrap();
        assert_eq!(fresh, GeoPosition::new(6.25, -75.56).unwrap());
    }

    #[tokio::test]
    async fn test_empty_file_is_unavailable() {
        let file = NamedTempFile::new().unwrap();
        let provider = provider_for(&file, &ManualClock::new(0));
        assert_eq!(
            provider.current_position(PositionOptions::QUICK).await,
            Err(LocationError::PositionUnavailable)
        );
    }

    #[tokio::test]
    async fn test_watch_follows_appended_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "4.60,-74.08").unwrap();
        file.flush().unwrap();

        let provider = provider_for(&file, &ManualClock::new(0));
        let mut updates = provider.watch_position(PositionOptions::WATCH);

        let first = timeout(Duration::from_secs(2), updates.recv()).await.unwrap();
        assert_eq!(first, Some(Ok(GeoPosition::new(4.60, -74.08).unwrap())));

        writeln!(file, "not a fix").unwrap();
        writeln!(file, "4.61,-74.09").unwrap();
        file.flush().unwrap();

        let second = timeout(Duration::from_secs(2), updates.recv()).await.unwrap();
        assert_eq!(second, Some(Ok(GeoPosition::new(4.61, -74.09).unwrap())));
    }

    #[tokio::test]
    async fn test_watch_sends_only_newest_existing_fix() {
        let mut file = NamedTempFile::new().unwrap();
        for step in 0..30 {
            writeln!(file, "{},-74.08", 4.0 + f64::from(step) * 0.01).unwrap();
        }
        writeln!(file, "# trailing comment").unwrap();
        file.flush().unwrap();

        let provider = provider_for(&file, &ManualClock::new(0));
        let mut updates = provider.watch_position(PositionOptions::WATCH);

        let first = timeout(Duration::from_secs(2), updates.recv()).await.unwrap();
        assert_eq!(first, Some(Ok(GeoPosition::new(4.0 + 29.0 * 0.01, -74.08).unwrap())));

        // History is not replayed after the initial fix
        let replay = timeout(Duration::from_millis(300), updates.recv()).await;
        assert!(replay.is_err(), "unexpected update: {replay:?}");

        writeln!(file, "4.50,-74.10").unwrap();
        file.flush().unwrap();
        let appended = timeout(Duration::from_secs(2), updates.recv()).await.unwrap();
        assert_eq!(appended, Some(Ok(GeoPosition::new(4.50, -74.10).unwrap())));
    }

    #[tokio::test]
    async fn test_watch_missing_file_reports_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TrackFileLocation::new(
            dir.path().join("missing.csv"),
            Arc::new(ManualClock::new(0)),
        );
        let mut updates = provider.watch_position(PositionOptions::WATCH);
        let update = timeout(Duration::from_secs(2), updates.recv()).await.unwrap();
        assert_eq!(update, Some(Err(LocationError::PositionUnavailable)));
    }
}
