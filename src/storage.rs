use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::entry::TimeEntry;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse entry on line {line}: {source}")]
    JsonDecode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a JSON Lines snapshot, one entry per line. A missing file is an
/// empty snapshot.
pub fn load_entries(path: &Path) -> Result<Vec<TimeEntry>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    let entries = parse_entries(&raw)?;
    debug!("loaded {} entries from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn parse_entries(raw: &str) -> Result<Vec<TimeEntry>, StorageError> {
    let mut entries = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let entry: TimeEntry =
            serde_json::from_str(line).map_err(|source| StorageError::JsonDecode {
                line: index + 1,
                source,
            })?;
        entries.push(entry);
    }

    Ok(entries)
}

/// Orders a snapshot by day, start time and id so that ranking ties break
/// the same way for value-identical snapshots.
pub fn sort_for_reporting(entries: &mut [TimeEntry]) {
    entries.sort_by(|left, right| {
        left.calendar_date
            .cmp(&right.calendar_date)
            .then_with(|| left.started_at.cmp(&right.started_at))
            .then_with(|| left.id.cmp(&right.id))
    });
}
