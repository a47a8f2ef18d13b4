//! Read-modify-write delta updates against a non-transactional table.
//!
//! A delta is applied by fetching the matrix, adding to one cell, and writing
//! that cell back. Fetch and write are separate remote calls, so two updates
//! of the same cell that overlap can both read the same starting value and
//! the later write erases the earlier delta.
//!
//! [`WriteStrategy::Serialized`] closes that window for updates issued
//! through one [`UpdateEngine`] by holding a per-cell lock across the whole
//! fetch-compute-write. It does nothing about writers in other processes or
//! people editing the sheet by hand. [`WriteStrategy::Unguarded`] keeps the
//! legacy behaviour where overlapping updates race and the last write wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rep_schema::{CellAddress, CellValue, RangeSpec};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::StoreError;
use crate::grid_index::{cell_address, locate};
use crate::table::{TableClient, TableError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteStrategy {
    /// One in-flight update per (faction, character) cell.
    #[default]
    Serialized,
    /// No coordination; overlapping updates of a cell may lose deltas.
    Unguarded,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellKey {
    pub faction: String,
    pub character: String,
}

impl CellKey {
    pub fn new(character: &str, faction: &str) -> Self {
        Self {
            faction: faction.to_string(),
            character: character.to_string(),
        }
    }
}

/// Lock registry keyed by cell. Entries are dropped once nobody waits on them.
#[derive(Debug, Default)]
pub struct CellLocks {
    slots: Mutex<HashMap<CellKey, Arc<Mutex<()>>>>,
}

impl CellLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`. The slot is released even
    /// if `f` panics.
    pub fn with_cell<R>(&self, key: &CellKey, f: impl FnOnce() -> R) -> R {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        let _release = SlotRelease {
            locks: self,
            key,
            slot: &slot,
        };
        let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of cells with an update in flight or queued.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Prunes a cell's slot on drop once only the registry and the dropping
/// caller still reference it.
struct SlotRelease<'a> {
    locks: &'a CellLocks,
    key: &'a CellKey,
    slot: &'a Arc<Mutex<()>>,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        let mut slots = self
            .locks
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(self.slot) == 2 {
            slots.remove(self.key);
        }
    }
}

/// Result of a successful delta write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaOutcome {
    pub cell: CellAddress,
    pub previous: i64,
    pub value: i64,
}

#[derive(Debug, Default)]
pub struct UpdateEngine {
    strategy: WriteStrategy,
    locks: CellLocks,
}

impl UpdateEngine {
    pub fn new(strategy: WriteStrategy) -> Self {
        Self {
            strategy,
            locks: CellLocks::new(),
        }
    }

    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    pub fn locks(&self) -> &CellLocks {
        &self.locks
    }

    /// Add `delta` to the cell of `character` × `faction` within `range`.
    ///
    /// Blank or non-numeric cells start from zero. On a failed write nothing
    /// has changed in the table. A write that outlives the backend's time
    /// limit is waited out under the cell lock when serialized, and reported
    /// as [`StoreError::WriteUnconfirmed`] when unguarded.
    pub fn apply(
        &self,
        table: &dyn TableClient,
        range: &RangeSpec,
        character: &str,
        faction: &str,
        delta: i64,
    ) -> Result<DeltaOutcome, StoreError> {
        match self.strategy {
            WriteStrategy::Serialized => {
                let key = CellKey::new(character, faction);
                self.locks.with_cell(&key, || {
                    fetch_compute_write(table, range, character, faction, delta, true)
                })
            }
            WriteStrategy::Unguarded => {
                fetch_compute_write(table, range, character, faction, delta, false)
            }
        }
    }
}

fn fetch_compute_write(
    table: &dyn TableClient,
    range: &RangeSpec,
    character: &str,
    faction: &str,
    delta: i64,
    settle_pending: bool,
) -> Result<DeltaOutcome, StoreError> {
    let read_error = |source: TableError| {
        warn!(
            target: "reputation::update",
            range = %range,
            error = %source,
            "delta.read_failed"
        );
        StoreError::BackendRead {
            range: range.to_string(),
            source,
        }
    };
    let origin = range.bounds().map_err(|source| {
        read_error(TableError::InvalidRange {
            range: range.to_string(),
            source,
        })
    })?;
    let grid = table.read(range).map_err(read_error)?;

    let location = locate(&grid, character, faction).map_err(StoreError::NotFound)?;
    let previous = CellValue::parse(grid.cell(location.row, location.col)).coerce();
    let value = previous
        .checked_add(delta)
        .ok_or(StoreError::Overflow {
            current: previous,
            delta,
        })?;

    let cell = cell_address(&range.sheet, &origin, location);
    let written = match table.write(&cell, value) {
        Err(TableError::WriteUnconfirmed { after, pending }) if settle_pending => {
            warn!(
                target: "reputation::update",
                %cell,
                after_ms = after.as_millis() as u64,
                "delta.write_settling"
            );
            pending.wait()
        }
        Err(TableError::WriteUnconfirmed { after, .. }) => {
            warn!(
                target: "reputation::update",
                %cell,
                character,
                faction,
                delta,
                after_ms = after.as_millis() as u64,
                "delta.write_unconfirmed"
            );
            return Err(StoreError::WriteUnconfirmed {
                cell: cell.to_string(),
                after,
            });
        }
        other => other,
    };
    if let Err(source) = written {
        warn!(
            target: "reputation::update",
            %cell,
            character,
            faction,
            delta,
            error = %source,
            "delta.write_failed"
        );
        return Err(StoreError::BackendWrite {
            cell: cell.to_string(),
            source,
        });
    }

    info!(
        target: "reputation::update",
        %cell,
        character,
        faction,
        previous,
        delta,
        value,
        "delta.applied"
    );
    Ok(DeltaOutcome {
        cell,
        previous,
        value,
    })
}
