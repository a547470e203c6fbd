//! ## Runtime settings
//!
//! Settings used by the binaries and by callers that load datasets from disk.
//! The preprocessing core never reads them: tables and rules are always passed explicitly.
//!
//! | Variable                     | Default | Meaning                                        |
//! |------------------------------|---------|------------------------------------------------|
//! | `PREPROC_DATA_DIR`           | `data`  | Directory holding `<dataset>.csv` / `.parquet` |
//! | `PREPROC_TARGET_PARTITIONS`  | `1`     | DataFusion target partitions                   |
//! | `PREPROC_BATCH_SIZE`         | `8192`  | DataFusion record batch size                   |

use crate::exceptions::{PreprocError, PreprocResult};
use datafusion::prelude::{SessionConfig, SessionContext};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "PREPROC_DATA_DIR";
pub const TARGET_PARTITIONS_ENV: &str = "PREPROC_TARGET_PARTITIONS";
pub const BATCH_SIZE_ENV: &str = "PREPROC_BATCH_SIZE";

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// A single partition keeps the row order of the input through filters and projections.
    pub target_partitions: usize,
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            target_partitions: 1,
            batch_size: 8192,
        }
    }
}

impl Settings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> PreprocResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the settings from an arbitrary key lookup, falling back to defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> PreprocResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let target_partitions =
            parse_positive(TARGET_PARTITIONS_ENV, lookup(TARGET_PARTITIONS_ENV))?
                .unwrap_or(defaults.target_partitions);
        let batch_size = parse_positive(BATCH_SIZE_ENV, lookup(BATCH_SIZE_ENV))?
            .unwrap_or(defaults.batch_size);
        Ok(Self {
            data_dir,
            target_partitions,
            batch_size,
        })
    }

    /// Creates a DataFusion session configured with these settings.
    pub fn session_context(&self) -> SessionContext {
        let config = SessionConfig::new()
            .with_target_partitions(self.target_partitions)
            .with_batch_size(self.batch_size);
        SessionContext::new_with_config(config)
    }
}

fn parse_positive(key: &str, value: Option<String>) -> PreprocResult<Option<usize>> {
    match value {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(PreprocError::InvalidParameter(format!(
                "{} must be a positive integer, got '{}'",
                key, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (DATA_DIR_ENV, "/srv/datasets"),
            (TARGET_PARTITIONS_ENV, "4"),
            (BATCH_SIZE_ENV, "1024"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/srv/datasets"));
        assert_eq!(settings.target_partitions, 4);
        assert_eq!(settings.batch_size, 1024);
    }

    #[test]
    fn test_rejects_zero_partitions() {
        let result = Settings::from_lookup(|k| {
            (k == TARGET_PARTITIONS_ENV).then(|| "0".to_string())
        });
        assert!(matches!(result, Err(PreprocError::InvalidParameter(_))));
    }
}
