//! The `EntityStore` trait and supporting query types.
//!
//! Storage backends (e.g. `kechita-store-sqlite`) implement the trait; the
//! query façade and the bulk loader depend only on this abstraction.

use std::future::Future;

use crate::{
  entity::{Branch, BranchId, Customer, CustomerId, Officer},
  loan::{Loan, LoanStatus, Repayment},
  metrics::DateWindow,
  performance::{DailyBranchPerformance, MonthlyBranchSummary, OfficerPerformance},
  risk::{AiCustomerFeatures, FraudSignal},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`EntityStore::list_customers`].
#[derive(Debug, Clone, Default)]
pub struct CustomerQuery {
  pub branch_id: Option<BranchId>,
  pub region:    Option<String>,
  /// Case-insensitive substring over id, names, phone and national id.
  pub text:      Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// Parameters for [`EntityStore::list_loans`].
#[derive(Debug, Clone, Default)]
pub struct LoanQuery {
  pub customer_id: Option<CustomerId>,
  pub branch_id:   Option<BranchId>,
  pub status:      Option<LoanStatus>,
}

/// Parameters for [`EntityStore::list_daily_performance`].
#[derive(Debug, Clone, Default)]
pub struct PerformanceQuery {
  pub branch_id: Option<BranchId>,
  pub window:    DateWindow,
}

// ─── Batches ─────────────────────────────────────────────────────────────────

/// A homogeneous chunk of rows handed to [`EntityStore::insert_batch`].
#[derive(Debug, Clone)]
pub enum RowBatch {
  Branches(Vec<Branch>),
  Officers(Vec<Officer>),
  Customers(Vec<Customer>),
  Loans(Vec<Loan>),
  Repayments(Vec<Repayment>),
  DailyPerformance(Vec<DailyBranchPerformance>),
  MonthlySummaries(Vec<MonthlyBranchSummary>),
  OfficerPerformance(Vec<OfficerPerformance>),
  FraudSignals(Vec<FraudSignal>),
  AiFeatures(Vec<AiCustomerFeatures>),
}

impl RowBatch {
  /// Name of the table this batch is written to.
  pub fn table(&self) -> &'static str {
    match self {
      Self::Branches(_) => "branches",
      Self::Officers(_) => "officers",
      Self::Customers(_) => "customers",
      Self::Loans(_) => "loans",
      Self::Repayments(_) => "repayments",
      Self::DailyPerformance(_) => "daily_branch_performance",
      Self::MonthlySummaries(_) => "monthly_branch_summary",
      Self::OfficerPerformance(_) => "officer_performance",
      Self::FraudSignals(_) => "fraud_signals",
      Self::AiFeatures(_) => "ai_customer_features",
    }
  }

  pub fn len(&self) -> usize {
    match self {
      Self::Branches(rows) => rows.len(),
      Self::Officers(rows) => rows.len(),
      Self::Customers(rows) => rows.len(),
      Self::Loans(rows) => rows.len(),
      Self::Repayments(rows) => rows.len(),
      Self::DailyPerformance(rows) => rows.len(),
      Self::MonthlySummaries(rows) => rows.len(),
      Self::OfficerPerformance(rows) => rows.len(),
      Self::FraudSignals(rows) => rows.len(),
      Self::AiFeatures(rows) => rows.len(),
    }
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Kechita entity store backend.
///
/// Reads return rows in primary-key order so that everything computed from
/// them is deterministic. Missing entities are `Ok(None)`, never an error.
///
/// All methods return `Send` futures so the trait can be used from `axum`
/// handlers on a multi-threaded runtime.
pub trait EntityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  fn list_branches(
    &self,
  ) -> impl Future<Output = Result<Vec<Branch>, Self::Error>> + Send + '_;

  fn get_branch<'a>(
    &'a self,
    branch_id: &'a str,
  ) -> impl Future<Output = Result<Option<Branch>, Self::Error>> + Send + 'a;

  /// All officers, or only those attached to `branch_id`.
  fn list_officers<'a>(
    &'a self,
    branch_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<Officer>, Self::Error>> + Send + 'a;

  fn list_customers<'a>(
    &'a self,
    query: &'a CustomerQuery,
  ) -> impl Future<Output = Result<Vec<Customer>, Self::Error>> + Send + 'a;

  fn get_customer<'a>(
    &'a self,
    customer_id: &'a str,
  ) -> impl Future<Output = Result<Option<Customer>, Self::Error>> + Send + 'a;

  // ── Loans ─────────────────────────────────────────────────────────────

  fn list_loans<'a>(
    &'a self,
    query: &'a LoanQuery,
  ) -> impl Future<Output = Result<Vec<Loan>, Self::Error>> + Send + 'a;

  fn get_loan<'a>(
    &'a self,
    loan_id: &'a str,
  ) -> impl Future<Output = Result<Option<Loan>, Self::Error>> + Send + 'a;

  /// Repayments against one loan, oldest first.
  fn list_repayments<'a>(
    &'a self,
    loan_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Repayment>, Self::Error>> + Send + 'a;

  // ── Performance snapshots ─────────────────────────────────────────────

  /// Daily rows inside the query's window, ordered by date then branch.
  fn list_daily_performance<'a>(
    &'a self,
    query: &'a PerformanceQuery,
  ) -> impl Future<Output = Result<Vec<DailyBranchPerformance>, Self::Error>> + Send + 'a;

  fn list_monthly_summaries<'a>(
    &'a self,
    branch_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<MonthlyBranchSummary>, Self::Error>> + Send + 'a;

  fn list_officer_performance<'a>(
    &'a self,
    branch_id: Option<&'a str>,
  ) -> impl Future<Output = Result<Vec<OfficerPerformance>, Self::Error>> + Send + 'a;

  // ── Risk ──────────────────────────────────────────────────────────────

  fn list_ai_features(
    &self,
  ) -> impl Future<Output = Result<Vec<AiCustomerFeatures>, Self::Error>> + Send + '_;

  fn get_ai_features<'a>(
    &'a self,
    customer_id: &'a str,
  ) -> impl Future<Output = Result<Option<AiCustomerFeatures>, Self::Error>> + Send + 'a;

  fn get_fraud_signal<'a>(
    &'a self,
    customer_id: &'a str,
  ) -> impl Future<Output = Result<Option<FraudSignal>, Self::Error>> + Send + 'a;

  // ── Loading ───────────────────────────────────────────────────────────

  /// Remove every row from every table.
  fn clear(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Write one batch atomically: either every row lands or none does.
  fn insert_batch(
    &self,
    batch: RowBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
