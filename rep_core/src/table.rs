//! The seam between the store and whatever holds the reputation workbook.
//!
//! A backend is a sheet-like key/value table: reads return a fresh grid for a
//! range, writes replace a single cell. Nothing here is transactional.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rep_schema::{CellAddress, Grid, RangeSpec, SpanParseError};
use thiserror::Error;

use crate::timeout::PendingWrite;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    /// The write outlived its limit and is still running. It may land later;
    /// `pending` settles once it has.
    #[error("write not confirmed after {after:?}; it may still land")]
    WriteUnconfirmed {
        after: Duration,
        pending: PendingWrite,
    },
    #[error("sheet '{0}' does not exist")]
    SheetMissing(String),
    #[error("invalid range '{range}': {source}")]
    InvalidRange {
        range: String,
        #[source]
        source: SpanParseError,
    },
    #[error("backend call ended without a response")]
    Disconnected,
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("failed to access workbook at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("workbook is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote table collaborator.
///
/// Implementations must be safe to call from several threads at once; the
/// store holds no lock over the backend.
pub trait TableClient: Send + Sync {
    /// Rows top-to-bottom, columns left-to-right. Trailing blank cells may be
    /// absent.
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError>;

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError>;
}

impl<T: TableClient + ?Sized> TableClient for Arc<T> {
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError> {
        (**self).read(range)
    }

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError> {
        (**self).write(cell, value)
    }
}

impl<T: TableClient + ?Sized> TableClient for Box<T> {
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError> {
        (**self).read(range)
    }

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError> {
        (**self).write(cell, value)
    }
}
