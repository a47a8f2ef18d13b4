//! JSON workbook on disk, shaped like an exported spreadsheet:
//!
//! ```json
//! { "sheets": { "REP": [["", "Alice"], ["Crown", "10"]], "Crown": [["Min", "Max", "Title", "Rewards"]] } }
//! ```
//!
//! Every read goes back to disk. Writes rewrite the whole file through a
//! sibling temp file and a rename.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use rep_schema::{CellAddress, Grid, RangeSpec};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::table::{TableClient, TableError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: BTreeMap<String, Grid>,
}

impl Workbook {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub struct JsonWorkbookTable {
    path: PathBuf,
    // Serializes file rewrites from this process only.
    write_guard: Mutex<()>,
}

impl JsonWorkbookTable {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TableError> {
        let table = Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        };
        table.load()?;
        Ok(table)
    }

    /// Create (or overwrite) the file with `workbook` and open it.
    pub fn create(path: impl Into<PathBuf>, workbook: &Workbook) -> Result<Self, TableError> {
        let path = path.into();
        store(&path, workbook)?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Workbook, TableError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| TableError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Workbook::from_json_str(&contents)?)
    }
}

fn store(path: &Path, workbook: &Workbook) -> Result<(), TableError> {
    let json = workbook.to_json_pretty()?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    fs::write(&staging, json).map_err(|source| TableError::Io {
        path: staging.clone(),
        source,
    })?;
    fs::rename(&staging, path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl TableClient for JsonWorkbookTable {
    fn read(&self, range: &RangeSpec) -> Result<Grid, TableError> {
        let bounds = range.bounds().map_err(|source| TableError::InvalidRange {
            range: range.to_string(),
            source,
        })?;
        let workbook = self.load()?;
        let grid = workbook
            .sheets
            .get(&range.sheet)
            .ok_or_else(|| TableError::SheetMissing(range.sheet.clone()))?;
        debug!(
            target: "reputation::table",
            path = %self.path.display(),
            range = %range,
            "workbook.read"
        );
        Ok(grid.slice(&bounds))
    }

    fn write(&self, cell: &CellAddress, value: i64) -> Result<(), TableError> {
        let _guard = self.write_guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut workbook = self.load()?;
        let grid = workbook
            .sheets
            .get_mut(&cell.sheet)
            .ok_or_else(|| TableError::SheetMissing(cell.sheet.clone()))?;
        grid.set_cell(cell.row, cell.col, value.to_string());
        store(&self.path, &workbook)?;
        info!(
            target: "reputation::table",
            path = %self.path.display(),
            %cell,
            value,
            "workbook.written"
        );
        Ok(())
    }
}
