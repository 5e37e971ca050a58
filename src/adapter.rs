use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::EngineError;
use crate::model::{PunchBatch, RawPunch};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reads a biometric terminal CSV export (`subject_id,timestamp` with a
/// header row). An unreadable file is fatal; malformed rows are skipped
/// and reported through `PunchBatch::errors`.
pub fn read_punch_csv(path: impl AsRef<Path>) -> Result<PunchBatch, EngineError> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| EngineError::Source(format!("{}: {e}", path.display())))?;
    Ok(parse_punches(file))
}

/// Parses punch rows from any reader.
pub fn parse_punches(input: impl Read) -> PunchBatch {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut batch = PunchBatch::default();
    for (idx, record) in reader.records().enumerate() {
        // Header occupies line 1.
        let line = idx + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                batch.errors.push(format!("line {line}: {e}"));
                continue;
            }
        };
        match parse_record(&record) {
            Ok(punch) => batch.punches.push(punch),
            Err(reason) => batch.errors.push(format!("line {line}: {reason}")),
        }
    }
    if !batch.errors.is_empty() {
        warn!(skipped = batch.errors.len(), "skipped malformed punch rows");
    }
    batch
}

fn parse_record(record: &csv::StringRecord) -> Result<RawPunch, String> {
    let subject_id = record
        .get(0)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing subject id".to_string())?;
    let raw_ts = record
        .get(1)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "missing timestamp".to_string())?;
    let timestamp = NaiveDateTime::parse_from_str(raw_ts, TIMESTAMP_FORMAT)
        .map_err(|e| format!("bad timestamp {raw_ts:?}: {e}"))?;
    Ok(RawPunch {
        subject_id: subject_id.to_string(),
        timestamp,
    })
}
