use std::fmt;
use std::time::Duration;

use rep_schema::Direction;
use serde::Serialize;
use thiserror::Error;

use crate::table::TableError;

/// What a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "missing", rename_all = "snake_case")]
pub enum Missing {
    Character { name: String },
    Faction { name: String },
    /// Both keys resolved but the cell is blank or non-numeric.
    Value { character: String, faction: String },
    BandTable { faction: String },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Character { name } => write!(f, "character '{}'", name),
            Missing::Faction { name } => write!(f, "faction '{}'", name),
            Missing::Value { character, faction } => {
                write!(f, "reputation value for '{}' with '{}'", character, faction)
            }
            Missing::BandTable { faction } => write!(f, "band table for '{}'", faction),
        }
    }
}

/// Flat discriminant of [`StoreError`] for front ends that branch on outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    NoBandMatch,
    EndOfRange,
    MalformedBandTable,
    BackendRead,
    BackendWrite,
    WriteUnconfirmed,
    Overflow,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(Missing),
    #[error("no band covers reputation {value}")]
    NoBandMatch { value: i64 },
    #[error("no further tiers {direction} of the current band")]
    EndOfRange { direction: Direction },
    #[error("band table '{sheet}' row {row} is malformed: {reason}")]
    MalformedBandTable {
        sheet: String,
        row: usize,
        reason: String,
    },
    #[error("failed to read {range}: {source}")]
    BackendRead {
        range: String,
        #[source]
        source: TableError,
    },
    #[error("failed to write {cell}: {source}")]
    BackendWrite {
        cell: String,
        #[source]
        source: TableError,
    },
    /// The write timed out and was left running; the cell may or may not
    /// hold the new value.
    #[error("write to {cell} not confirmed after {after:?}; it may still land")]
    WriteUnconfirmed { cell: String, after: Duration },
    #[error("adding {delta} to {current} overflows")]
    Overflow { current: i64, delta: i64 },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::NoBandMatch { .. } => ErrorKind::NoBandMatch,
            StoreError::EndOfRange { .. } => ErrorKind::EndOfRange,
            StoreError::MalformedBandTable { .. } => ErrorKind::MalformedBandTable,
            StoreError::BackendRead { .. } => ErrorKind::BackendRead,
            StoreError::BackendWrite { .. } => ErrorKind::BackendWrite,
            StoreError::WriteUnconfirmed { .. } => ErrorKind::WriteUnconfirmed,
            StoreError::Overflow { .. } => ErrorKind::Overflow,
        }
    }

    /// Negative results a caller should report rather than treat as faults.
    pub fn is_expected(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::NoBandMatch | ErrorKind::EndOfRange
        )
    }

    pub fn missing(&self) -> Option<&Missing> {
        match self {
            StoreError::NotFound(missing) => Some(missing),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_results_are_expected_but_backend_faults_are_not() {
        let missing = StoreError::NotFound(Missing::Faction {
            name: "Crown".into(),
        });
        assert!(missing.is_expected());
        assert_eq!(missing.to_string(), "faction 'Crown' not found");

        let range = StoreError::EndOfRange {
            direction: Direction::Up,
        };
        assert!(range.is_expected());

        let read = StoreError::BackendRead {
            range: "REP".into(),
            source: TableError::Disconnected,
        };
        assert!(!read.is_expected());
        assert_eq!(read.kind(), ErrorKind::BackendRead);
    }
}
