//! Reading a snapshot directory into a [`Dataset`].
//!
//! Each table lives in `<dir>/<table>.json` as a JSON array of row objects,
//! or in `<dir>/<table>.csv` with a header row naming the columns. The JSON
//! file wins when both exist. A missing table is empty and a malformed one is
//! an error. A directory with none of the tables is an error too.

use std::path::Path;

use kechita_core::load::Dataset;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Read every table file under `dir`.
pub async fn read_dataset(dir: &Path) -> Result<Dataset> {
  if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
    return Err(Error::MissingDirectory(dir.to_path_buf()));
  }

  let mut found = 0;
  let dataset = Dataset {
    branches:            read_table(dir, "branches", &mut found).await?,
    officers:            read_table(dir, "officers", &mut found).await?,
    customers:           read_table(dir, "customers", &mut found).await?,
    loans:               read_table(dir, "loans", &mut found).await?,
    repayments:          read_table(dir, "repayments", &mut found).await?,
    daily_performance:   read_table(dir, "daily_branch_performance", &mut found).await?,
    monthly_summaries:   read_table(dir, "monthly_branch_summary", &mut found).await?,
    officer_performance: read_table(dir, "officer_performance", &mut found).await?,
    fraud_signals:       read_table(dir, "fraud_signals", &mut found).await?,
    ai_features:         read_table(dir, "ai_customer_features", &mut found).await?,
  };

  if found == 0 {
    return Err(Error::NoTables(dir.to_path_buf()));
  }
  Ok(dataset)
}

async fn read_table<T: DeserializeOwned>(
  dir: &Path,
  table: &str,
  found: &mut usize,
) -> Result<Vec<T>> {
  let path = dir.join(format!("{table}.json"));
  if let Some(bytes) = read_optional(&path).await? {
    *found += 1;
    let rows: Vec<T> =
      serde_json::from_slice(&bytes).map_err(|source| Error::Parse { path, source })?;
    tracing::debug!(table, rows = rows.len(), "read json table");
    return Ok(rows);
  }

  let path = dir.join(format!("{table}.csv"));
  if let Some(bytes) = read_optional(&path).await? {
    *found += 1;
    let rows = csv::Reader::from_reader(bytes.as_slice())
      .deserialize()
      .collect::<Result<Vec<T>, _>>()
      .map_err(|source| Error::Csv { path, source })?;
    tracing::debug!(table, rows = rows.len(), "read csv table");
    return Ok(rows);
  }

  tracing::warn!(table, "no {table}.json or {table}.csv in dataset; treating as empty");
  Ok(Vec::new())
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
  match tokio::fs::read(path).await {
    Ok(bytes) => Ok(Some(bytes)),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
    Err(source) => Err(Error::Read {
      path: path.to_path_buf(),
      source,
    }),
  }
}
