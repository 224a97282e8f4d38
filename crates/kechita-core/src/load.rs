//! Bulk loading policy.
//!
//! A [`Dataset`] is written table by table, parents before children, in
//! fixed-size batches. Each batch is one [`EntityStore::insert_batch`] call.
//! The first batch the store rejects ends the load: later batches of that
//! table are not attempted, and nothing already written is rolled back.
//!
//! A dataset with no rows at all is refused before the store is cleared,
//! unless [`LoadOptions::allow_empty`] is set.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  entity::{Branch, Customer, Officer},
  loan::{Loan, Repayment},
  metrics::rollup_monthly,
  performance::{DailyBranchPerformance, MonthlyBranchSummary, OfficerPerformance},
  risk::{AiCustomerFeatures, FraudSignal},
  store::{EntityStore, RowBatch},
};

pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Every table of a snapshot, as parsed from the source files. A table
/// missing from the input is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
  pub branches:            Vec<Branch>,
  pub officers:            Vec<Officer>,
  pub customers:           Vec<Customer>,
  pub loans:               Vec<Loan>,
  pub repayments:          Vec<Repayment>,
  pub daily_performance:   Vec<DailyBranchPerformance>,
  pub monthly_summaries:   Vec<MonthlyBranchSummary>,
  pub officer_performance: Vec<OfficerPerformance>,
  pub fraud_signals:       Vec<FraudSignal>,
  pub ai_features:         Vec<AiCustomerFeatures>,
}

impl Dataset {
  pub fn total_rows(&self) -> usize {
    self.branches.len()
      + self.officers.len()
      + self.customers.len()
      + self.loans.len()
      + self.repayments.len()
      + self.daily_performance.len()
      + self.monthly_summaries.len()
      + self.officer_performance.len()
      + self.fraud_signals.len()
      + self.ai_features.len()
  }

  pub fn is_empty(&self) -> bool { self.total_rows() == 0 }
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
  pub batch_size:     usize,
  /// Replace the monthly summaries with a rollup of the daily rows.
  pub derive_monthly: bool,
  /// Clear the store even when the dataset has no rows.
  pub allow_empty:    bool,
}

impl Default for LoadOptions {
  fn default() -> Self {
    Self {
      batch_size:     DEFAULT_BATCH_SIZE,
      derive_monthly: false,
      allow_empty:    false,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLoad {
  pub table:   &'static str,
  pub rows:    usize,
  pub batches: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  pub tables: Vec<TableLoad>,
}

impl LoadReport {
  pub fn total_rows(&self) -> usize { self.tables.iter().map(|t| t.rows).sum() }
}

/// Split `rows` into consecutive chunks of at most `batch_size`.
pub fn split<T>(rows: Vec<T>, batch_size: usize) -> Result<Vec<Vec<T>>> {
  if batch_size == 0 {
    return Err(Error::ZeroBatchSize);
  }
  let mut batches = Vec::with_capacity(rows.len().div_ceil(batch_size));
  let mut rows = rows.into_iter().peekable();
  while rows.peek().is_some() {
    batches.push(rows.by_ref().take(batch_size).collect());
  }
  Ok(batches)
}

/// Replace the store's contents with `dataset`.
pub async fn load_dataset<S: EntityStore>(
  store: &S,
  mut dataset: Dataset,
  options: LoadOptions,
) -> Result<LoadReport> {
  if options.batch_size == 0 {
    return Err(Error::ZeroBatchSize);
  }
  if options.derive_monthly {
    dataset.monthly_summaries = rollup_monthly(&dataset.branches, &dataset.daily_performance);
    tracing::info!(
      months = dataset.monthly_summaries.len(),
      "derived monthly summaries from daily rows"
    );
  }

  if dataset.is_empty() && !options.allow_empty {
    tracing::error!("dataset has no rows; refusing to clear the store");
    return Err(Error::EmptyDataset);
  }

  store
    .clear()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let size = options.batch_size;
  let tables = vec![
    load_table(store, dataset.branches, size, RowBatch::Branches).await?,
    load_table(store, dataset.officers, size, RowBatch::Officers).await?,
    load_table(store, dataset.customers, size, RowBatch::Customers).await?,
    load_table(store, dataset.loans, size, RowBatch::Loans).await?,
    load_table(store, dataset.repayments, size, RowBatch::Repayments).await?,
    load_table(store, dataset.daily_performance, size, RowBatch::DailyPerformance).await?,
    load_table(store, dataset.monthly_summaries, size, RowBatch::MonthlySummaries).await?,
    load_table(store, dataset.officer_performance, size, RowBatch::OfficerPerformance).await?,
    load_table(store, dataset.fraud_signals, size, RowBatch::FraudSignals).await?,
    load_table(store, dataset.ai_features, size, RowBatch::AiFeatures).await?,
  ];

  let report = LoadReport { tables };
  tracing::info!(rows = report.total_rows(), "dataset loaded");
  Ok(report)
}

async fn load_table<S, T>(
  store: &S,
  rows: Vec<T>,
  batch_size: usize,
  wrap: impl Fn(Vec<T>) -> RowBatch,
) -> Result<TableLoad>
where
  S: EntityStore,
{
  let table = wrap(Vec::new()).table();
  let total = rows.len();
  let batches = split(rows, batch_size)?;
  let count = batches.len();

  let mut written = 0;
  for (index, chunk) in batches.into_iter().enumerate() {
    let batch = wrap(chunk);
    let len = batch.len();
    if let Err(e) = store.insert_batch(batch).await {
      tracing::error!(table, batch = index + 1, error = %e, "batch rejected");
      return Err(Error::Load {
        table,
        batch: index + 1,
        rows_written: written,
        source: Box::new(e),
      });
    }
    written += len;
    tracing::info!(table, batch = index + 1, of = count, rows = len, "batch written");
  }

  Ok(TableLoad {
    table,
    rows: total,
    batches: count,
  })
}
