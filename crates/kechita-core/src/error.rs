//! Error types for `kechita-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown risk band: {0:?} (expected all, high, medium or low)")]
  UnknownRiskBand(String),

  #[error("invalid branch scope: {0:?}")]
  InvalidScope(String),

  #[error("invalid date window: {from} is after {to}")]
  InvalidWindow {
    from: chrono::NaiveDate,
    to:   chrono::NaiveDate,
  },

  #[error("unknown trend bucket: {0:?} (expected day, week or month)")]
  UnknownBucket(String),

  #[error("unknown loan status: {0:?}")]
  UnknownLoanStatus(String),

  #[error("unknown repayment status: {0:?}")]
  UnknownRepaymentStatus(String),

  #[error("batch size must be at least 1")]
  ZeroBatchSize,

  #[error("dataset has no rows; refusing to replace the store's contents")]
  EmptyDataset,

  /// A loader batch was rejected by the store; later batches of the same
  /// table were not attempted.
  #[error("loading {table} failed at batch {batch} after {rows_written} rows: {source}")]
  Load {
    table:        &'static str,
    batch:        usize,
    rows_written: usize,
    #[source]
    source:       Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
