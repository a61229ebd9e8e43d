//! Selection of the most recent extract among timestamp-named objects.
//!
//! Upstream drops files named `<prefix>_<YYYYMMDDHHmm>.csv`; the timestamp
//! component between the final underscore and the extension orders them.

use chrono::NaiveDateTime;
use thiserror::Error;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("no candidate snapshot files to select from")]
    NoCandidates,
    #[error("malformed snapshot filename '{name}': {reason}")]
    MalformedFilename { name: String, reason: String },
}

/// Parse the capture timestamp out of a snapshot filename.
pub fn capture_timestamp(name: &str) -> Result<NaiveDateTime, SnapshotError> {
    let malformed = |reason: &str| SnapshotError::MalformedFilename {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let (stem, _extension) = name
        .rsplit_once('.')
        .ok_or_else(|| malformed("missing extension"))?;
    let (_prefix, timestamp) = stem
        .rsplit_once('_')
        .ok_or_else(|| malformed("missing '_<timestamp>' component"))?;

    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .map_err(|_| malformed("timestamp is not in YYYYMMDDHHmm form"))
}

/// Pick the candidate with the greatest embedded timestamp. Every candidate
/// must parse; equal timestamps resolve to whichever sorts later in the
/// input (not expected from the minute-granularity upstream scheduler).
pub fn latest_snapshot(names: &[String]) -> Result<String, SnapshotError> {
    let mut latest: Option<(NaiveDateTime, &str)> = None;

    for name in names {
        let timestamp = capture_timestamp(name)?;
        match &latest {
            Some((best, _)) if *best > timestamp => {}
            _ => latest = Some((timestamp, name)),
        }
    }

    latest
        .map(|(_, name)| name.to_string())
        .ok_or(SnapshotError::NoCandidates)
}
