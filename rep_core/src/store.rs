//! Front-end facing operations over the reputation workbook.
//!
//! Every operation fetches what it needs fresh from the table; nothing is
//! cached between calls. Lookup misses come back as the expected variants of
//! [`StoreError`] so a caller can tell "no such faction" apart from a backend
//! failure.

use std::collections::HashSet;
use std::sync::Arc;

use rep_schema::{Band, BandTable, CellValue, Direction, Grid, RangeSpec};
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::{self, FactionTotal};
use crate::config::StoreConfig;
use crate::error::{Missing, StoreError};
use crate::grid_index::{self, locate};
use crate::table::{TableClient, TableError};
use crate::tiers::{self, NextBand};
use crate::timeout::TimeoutTable;
use crate::update::{DeltaOutcome, UpdateEngine};

/// A value together with the band it falls in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Standing {
    pub value: i64,
    pub band: Band,
}

/// The neighbouring band and the reputation needed to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStep {
    pub value: i64,
    pub direction: Direction,
    pub current: Band,
    pub next: Band,
    pub required: i64,
}

/// One faction's cell for a character, uncoerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionValue {
    pub faction: String,
    pub value: CellValue,
}

pub struct ReputationStore {
    table: Arc<dyn TableClient>,
    config: Arc<StoreConfig>,
    updates: UpdateEngine,
}

impl ReputationStore {
    /// Wraps `table` in a [`TimeoutTable`] when the config sets a limit.
    pub fn new<T: TableClient + 'static>(table: T, config: Arc<StoreConfig>) -> Self {
        Self::from_shared(Arc::new(table), config)
    }

    pub fn from_shared<T: TableClient + 'static>(table: Arc<T>, config: Arc<StoreConfig>) -> Self {
        let table: Arc<dyn TableClient> = match config.table_timeout() {
            Some(limit) => Arc::new(TimeoutTable::new(table, limit)),
            None => table,
        };
        Self {
            table,
            updates: UpdateEngine::new(config.write_strategy),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn update_engine(&self) -> &UpdateEngine {
        &self.updates
    }

    fn fetch(&self, range: &RangeSpec) -> Result<Grid, StoreError> {
        match self.table.read(range) {
            Ok(grid) => {
                debug!(
                    target: "reputation::store",
                    range = %range,
                    rows = grid.height(),
                    "grid.fetched"
                );
                Ok(grid)
            }
            Err(source) => {
                warn!(
                    target: "reputation::store",
                    range = %range,
                    error = %source,
                    "grid.fetch_failed"
                );
                Err(StoreError::BackendRead {
                    range: range.to_string(),
                    source,
                })
            }
        }
    }

    fn fetch_matrix(&self) -> Result<Grid, StoreError> {
        self.fetch(&self.config.reputation_range())
    }

    /// Raw cell for `character` with `faction`.
    pub fn lookup_cell(&self, character: &str, faction: &str) -> Result<CellValue, StoreError> {
        let grid = self.fetch_matrix()?;
        let location = locate(&grid, character, faction).map_err(StoreError::NotFound)?;
        Ok(CellValue::parse(grid.cell(location.row, location.col)))
    }

    /// Numeric reputation of `character` with `faction`. A blank or
    /// non-numeric cell is reported as a missing value, not as zero.
    pub fn lookup_value(&self, character: &str, faction: &str) -> Result<i64, StoreError> {
        self.lookup_cell(character, faction)?
            .as_integer()
            .ok_or_else(|| {
                StoreError::NotFound(Missing::Value {
                    character: character.to_string(),
                    faction: faction.to_string(),
                })
            })
    }

    /// Every faction's cell for `character`, in table order.
    pub fn lookup_all_values(&self, character: &str) -> Result<Vec<FactionValue>, StoreError> {
        let grid = self.fetch_matrix()?;
        let col = grid_index::find_character_column(&grid, character).ok_or_else(|| {
            StoreError::NotFound(Missing::Character {
                name: character.to_string(),
            })
        })?;
        let mut values: Vec<FactionValue> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (_, row) in grid.body() {
            let Some(faction) = row.first().filter(|name| !name.trim().is_empty()) else {
                continue;
            };
            if !seen.insert(faction.as_str()) {
                continue;
            }
            values.push(FactionValue {
                faction: faction.clone(),
                value: CellValue::parse(row.get(col).map(String::as_str)),
            });
        }
        Ok(values)
    }

    /// Factions where `character` holds a present, non-zero value. Non-numeric
    /// text counts as present.
    pub fn active_factions(&self, character: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lookup_all_values(character)?
            .into_iter()
            .filter(|entry| match &entry.value {
                CellValue::Blank => false,
                CellValue::Integer(value) => *value != 0,
                CellValue::Text(_) => true,
            })
            .map(|entry| entry.faction)
            .collect())
    }

    pub fn list_factions(&self) -> Result<Vec<String>, StoreError> {
        Ok(grid_index::faction_names(&self.fetch_matrix()?))
    }

    pub fn list_characters(&self) -> Result<Vec<String>, StoreError> {
        Ok(grid_index::character_names(&self.fetch_matrix()?))
    }

    /// Band table stored on the sheet named after `faction`.
    pub fn lookup_band_table(&self, faction: &str) -> Result<BandTable, StoreError> {
        let range = self.config.band_range(faction);
        let grid = match self.table.read(&range) {
            Ok(grid) => grid,
            Err(TableError::SheetMissing(_)) => {
                return Err(StoreError::NotFound(Missing::BandTable {
                    faction: faction.to_string(),
                }))
            }
            Err(source) => {
                warn!(
                    target: "reputation::store",
                    range = %range,
                    error = %source,
                    "band_table.fetch_failed"
                );
                return Err(StoreError::BackendRead {
                    range: range.to_string(),
                    source,
                });
            }
        };
        tiers::parse_band_table(
            faction,
            &grid,
            self.config.band_header_rows,
            self.config.band_validation,
        )
        .map_err(|malformed| {
            let first_row = range
                .bounds()
                .ok()
                .and_then(|bounds| bounds.first_row)
                .unwrap_or(0);
            StoreError::MalformedBandTable {
                sheet: faction.to_string(),
                row: first_row + malformed.row + 1,
                reason: malformed.reason,
            }
        })
    }

    fn classify_in(&self, table_name: &str, value: i64) -> Result<Standing, StoreError> {
        let table = self.lookup_band_table(table_name)?;
        let band = tiers::band_for(&table, value)
            .cloned()
            .ok_or(StoreError::NoBandMatch { value })?;
        Ok(Standing { value, band })
    }

    /// Current tier of `character` with `faction`.
    pub fn standing(&self, character: &str, faction: &str) -> Result<Standing, StoreError> {
        let value = self.lookup_value(character, faction)?;
        self.classify_in(faction, value)
    }

    /// The tier above or below the current one. `NoBandMatch` means there is
    /// no current tier; `EndOfRange` means there is nothing further that way.
    pub fn next_tier(
        &self,
        character: &str,
        faction: &str,
        direction: Direction,
    ) -> Result<TierStep, StoreError> {
        let value = self.lookup_value(character, faction)?;
        let table = self.lookup_band_table(faction)?;
        let index = tiers::classify(&table, value).ok_or(StoreError::NoBandMatch { value })?;
        match tiers::next_band(&table, index, value, direction) {
            NextBand::Found {
                band,
                required_delta,
            } => Ok(TierStep {
                value,
                direction,
                current: table.bands[index].clone(),
                next: band.clone(),
                required: required_delta,
            }),
            NextBand::EndOfRange => Err(StoreError::EndOfRange { direction }),
        }
    }

    /// Sum of `faction` across every character.
    pub fn combined_value(&self, faction: &str) -> Result<i64, StoreError> {
        let grid = self.fetch_matrix()?;
        aggregate::combined_value(&grid, faction).ok_or_else(|| {
            StoreError::NotFound(Missing::Faction {
                name: faction.to_string(),
            })
        })
    }

    /// Combined value classified against the diplomacy band table.
    pub fn combined_standing(&self, faction: &str) -> Result<Standing, StoreError> {
        let value = self.combined_value(faction)?;
        self.classify_in(&self.config.diplomacy_table, value)
    }

    /// Totals for every faction from a single fetch.
    pub fn faction_totals(&self) -> Result<Vec<FactionTotal>, StoreError> {
        Ok(aggregate::faction_totals(&self.fetch_matrix()?))
    }

    /// Factions passing both thresholds, evaluated against one snapshot.
    pub fn filter_factions(
        &self,
        magnitude_threshold: u64,
        min_participants: usize,
    ) -> Result<Vec<String>, StoreError> {
        let grid = self.fetch_matrix()?;
        Ok(aggregate::filter_factions(
            &grid,
            magnitude_threshold,
            min_participants,
        ))
    }

    /// [`Self::filter_factions`] with the configured thresholds.
    pub fn notable_factions(&self) -> Result<Vec<String>, StoreError> {
        let notable = self.config.notable;
        self.filter_factions(notable.magnitude_threshold, notable.min_participants)
    }

    /// Add `delta` to `character`'s reputation with `faction` and return the
    /// new value.
    pub fn apply_delta(
        &self,
        character: &str,
        faction: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        self.apply_delta_detailed(character, faction, delta)
            .map(|outcome| outcome.value)
    }

    pub fn apply_delta_detailed(
        &self,
        character: &str,
        faction: &str,
        delta: i64,
    ) -> Result<DeltaOutcome, StoreError> {
        let range = self.config.reputation_range();
        self.updates
            .apply(self.table.as_ref(), &range, character, faction, delta)
    }
}
