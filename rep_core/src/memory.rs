use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use rep_schema::{CellAddress, Grid, RangeSpec};

use crate::table::{TableClient, TableError};

/// In-process workbook keyed by sheet name.
///
/// Reads and writes are counted so callers can assert how many remote round
/// trips an operation would have cost.
#[derive(Debug, Default)]
pub struct MemoryTable {
    sheets: RwLock<HashMap<String, Grid>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(self, name: impl Into<String>, grid: Grid) -> Self {
        self.insert_sheet(name, grid);
        self
    }

    pub fn insert_sheet(&self, name: impl Into<String>, grid: Grid) {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), grid);
    }

    /// Current contents of a sheet, bypassing the read counter.
    pub fn sheet(&self, name: &str) -> Option<Grid> {
        self.sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl TableClient for MemoryTable {
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let bounds = range.bounds().map_err(|source| TableError::InvalidRange {
            range: range.to_string(),
            source,
        })?;
        let sheets = self.sheets.read().unwrap_or_else(PoisonError::into_inner);
        let grid = sheets
            .get(&range.sheet)
            .ok_or_else(|| TableError::SheetMissing(range.sheet.clone()))?;
        Ok(grid.slice(&bounds))
    }

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut sheets = self.sheets.write().unwrap_or_else(PoisonError::into_inner);
        let grid = sheets
            .get_mut(&cell.sheet)
            .ok_or_else(|| TableError::SheetMissing(cell.sheet.clone()))?;
        grid.set_cell(cell.row, cell.col, value.to_string());
        Ok(())
    }
}
