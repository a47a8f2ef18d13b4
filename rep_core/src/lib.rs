//! Reputation store and classification engine.
//!
//! Reputation lives in a remote, sheet-like table (rows are factions, columns
//! are characters). [`ReputationStore`] resolves cells by name, classifies
//! values into tiers using per-faction band tables, aggregates a faction's
//! standing across characters, and applies delta updates.

pub mod aggregate;
pub mod config;
mod error;
pub mod grid_index;
mod memory;
mod store;
mod table;
pub mod tiers;
mod timeout;
pub mod update;
mod workbook;

pub use aggregate::FactionTotal;
pub use config::{
    load_store_config_from_env, NotableConfig, StoreConfig, StoreConfigError, StoreConfigSource,
    CONFIG_PATH_ENV,
};
pub use error::{ErrorKind, Missing, StoreError};
pub use memory::MemoryTable;
pub use store::{FactionValue, ReputationStore, Standing, TierStep};
pub use table::{TableClient, TableError};
pub use tiers::{BandValidation, NextBand};
pub use timeout::{PendingWrite, TimeoutTable};
pub use update::{CellKey, CellLocks, DeltaOutcome, UpdateEngine, WriteStrategy};
pub use workbook::{JsonWorkbookTable, Workbook};

pub use rep_schema::{
    column_label, Band, BandTable, CellAddress, CellValue, Direction, Grid, RangeSpec,
};
