//! ## Dataset Source
//!
//! Loads the raw table of a dataset from a data directory. A dataset `<id>` is stored either as
//! `<id>.csv` (with a header row) or as `<id>.parquet`; the CSV file wins when both exist.

use crate::exceptions::{PreprocError, PreprocResult};
use crate::registry::Dataset;
use datafusion::prelude::{CsvReadOptions, DataFrame, ParquetReadOptions, SessionContext};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a CSV or Parquet file, picking the reader from the file extension.
pub async fn load_file(ctx: &SessionContext, path: &Path) -> PreprocResult<DataFrame> {
    let path_str = path.to_str().ok_or_else(|| {
        PreprocError::InvalidParameter(format!("Path {} is not valid UTF-8", path.display()))
    })?;
    let df = match path.extension().and_then(|ext| ext.to_str()) {
        Some("csv") => ctx.read_csv(path_str, CsvReadOptions::new()).await?,
        Some("parquet") => {
            ctx.read_parquet(path_str, ParquetReadOptions::default())
                .await?
        }
        _ => {
            return Err(PreprocError::UnsupportedFormat(format!(
                "{} (expected a .csv or .parquet file)",
                path.display()
            )))
        }
    };
    debug!(path = %path.display(), "loaded table");
    Ok(df)
}

/// Finds the file holding `dataset` in `data_dir`.
pub fn dataset_path(data_dir: &Path, dataset: Dataset) -> PreprocResult<PathBuf> {
    ["csv", "parquet"]
        .iter()
        .map(|ext| data_dir.join(format!("{}.{}", dataset.as_str(), ext)))
        .find(|p| p.is_file())
        .ok_or_else(|| {
            PreprocError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "no {}.csv or {}.parquet in {}",
                    dataset,
                    dataset,
                    data_dir.display()
                ),
            ))
        })
}

/// Loads the raw table of the dataset named `dataset_id` from `data_dir`.
pub async fn load_dataset(
    ctx: &SessionContext,
    data_dir: &Path,
    dataset_id: &str,
) -> PreprocResult<DataFrame> {
    let dataset: Dataset = dataset_id.parse()?;
    let path = dataset_path(data_dir, dataset)?;
    load_file(ctx, &path).await
}
