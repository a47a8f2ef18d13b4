//! Store configuration.
//!
//! Loaded from `store_config.json` with support for an environment variable
//! override. Every field has a default so partial files are accepted.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use rep_schema::RangeSpec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tiers::BandValidation;
use crate::update::WriteStrategy;

pub const BUILTIN_STORE_CONFIG: &str = include_str!("data/store_config.json");
pub const CONFIG_PATH_ENV: &str = "REPUTATION_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Sheet holding the faction × character matrix.
    pub reputation_sheet: String,
    /// Span of the matrix within its sheet; the whole sheet when absent.
    pub reputation_span: Option<String>,
    /// Span of each faction's band sheet.
    pub band_span: Option<String>,
    pub band_header_rows: usize,
    /// Band sheet used to classify combined standings.
    pub diplomacy_table: String,
    pub notable: NotableConfig,
    pub write_strategy: WriteStrategy,
    pub table_timeout_ms: Option<u64>,
    pub band_validation: BandValidation,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reputation_sheet: "REP".to_string(),
            reputation_span: None,
            band_span: Some("A:D".to_string()),
            band_header_rows: 1,
            diplomacy_table: "DIPLOMACY".to_string(),
            notable: NotableConfig::default(),
            write_strategy: WriteStrategy::Serialized,
            table_timeout_ms: Some(10_000),
            band_validation: BandValidation::Tolerant,
        }
    }
}

/// Thresholds for [`crate::ReputationStore::notable_factions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotableConfig {
    /// Combined value must exceed this in absolute terms.
    pub magnitude_threshold: u64,
    /// Non-zero participants must exceed this count.
    pub min_participants: usize,
}

impl Default for NotableConfig {
    fn default() -> Self {
        Self {
            magnitude_threshold: 500,
            min_participants: 0,
        }
    }
}

impl StoreConfig {
    pub fn builtin() -> Result<Self, StoreConfigError> {
        Ok(Self::from_json_str(BUILTIN_STORE_CONFIG)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_file(path: &Path) -> Result<Self, StoreConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| StoreConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = StoreConfig::from_json_str(&contents)?;
        Ok(config)
    }

    pub fn reputation_range(&self) -> RangeSpec {
        RangeSpec {
            sheet: self.reputation_sheet.clone(),
            span: self.reputation_span.clone(),
        }
    }

    /// Band tables live on a sheet named after the faction.
    pub fn band_range(&self, faction: &str) -> RangeSpec {
        RangeSpec {
            sheet: faction.to_string(),
            span: self.band_span.clone(),
        }
    }

    pub fn table_timeout(&self) -> Option<Duration> {
        self.table_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[derive(Debug, Error)]
pub enum StoreConfigError {
    #[error("failed to parse store config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read store config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfigSource {
    File(PathBuf),
    Builtin,
}

/// Load configuration from `REPUTATION_CONFIG_PATH`, falling back to the
/// builtin copy when the variable is unset or the file is unusable.
pub fn load_store_config_from_env() -> (Arc<StoreConfig>, StoreConfigSource) {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from) {
        match StoreConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "reputation::config",
                    path = %path.display(),
                    "store_config.loaded=file"
                );
                return (Arc::new(config), StoreConfigSource::File(path));
            }
            Err(err) => {
                tracing::warn!(
                    target: "reputation::config",
                    path = %path.display(),
                    error = %err,
                    "store_config.load_failed"
                );
            }
        }
    }

    let config = match StoreConfig::builtin() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                target: "reputation::config",
                error = %err,
                "store_config.builtin_invalid"
            );
            StoreConfig::default()
        }
    };
    tracing::info!(target: "reputation::config", "store_config.loaded=builtin");
    (Arc::new(config), StoreConfigSource::Builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_matches_defaults() {
        let builtin = StoreConfig::builtin().expect("builtin store config should parse");
        assert_eq!(builtin, StoreConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = StoreConfig::from_json_str(
            r#"{ "write_strategy": "unguarded", "notable": { "min_participants": 4 } }"#,
        )
        .expect("parse");
        assert_eq!(config.write_strategy, WriteStrategy::Unguarded);
        assert_eq!(config.notable.min_participants, 4);
        assert_eq!(config.notable.magnitude_threshold, 500);
        assert_eq!(config.reputation_sheet, "REP");
    }

    #[test]
    fn ranges_follow_config() {
        let mut config = StoreConfig::default();
        assert_eq!(config.reputation_range().to_string(), "REP");
        assert_eq!(config.band_range("Crown").to_string(), "Crown!A:D");
        config.reputation_span = Some("A:AZ".to_string());
        assert_eq!(config.reputation_range().to_string(), "REP!A:AZ");
    }

    #[test]
    fn zero_timeout_disables_limit() {
        let mut config = StoreConfig::default();
        assert_eq!(config.table_timeout(), Some(Duration::from_secs(10)));
        config.table_timeout_ms = Some(0);
        assert_eq!(config.table_timeout(), None);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let err = StoreConfig::from_file(Path::new("/definitely/not/here.json"))
            .expect_err("missing file");
        assert!(matches!(err, StoreConfigError::Read { .. }));
    }
}
