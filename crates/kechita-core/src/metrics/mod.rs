//! The aggregation engine.
//!
//! Every function here is a pure, deterministic function of the rows it is
//! given: no I/O, no clock, no shared state. Groupings use ordered maps so
//! two calls over the same snapshot serialise byte-identically.
//!
//! Monetary sums stay in [`Decimal`]; ratios and averages are `f64` at full
//! precision. Rounding is the consumer's concern.
//!
//! Empty input never errors: a group with no rows aggregates to zero.

mod branch;
mod dashboard;
mod fraud;
mod officer;
mod regional;
mod rollup;
mod trend;

pub use branch::{
  BranchPerformance, BranchRanking, aggregate_branch_performance,
  rank_branches_by_collection_rate,
};
pub use dashboard::{
  ALERT_LIMIT, DashboardSummary, RiskAlert, TOP_BRANCH_LIMIT, dashboard_summary,
};
pub use fraud::{FRAUD_CASE_LIMIT, FraudCase, filter_fraud_cases};
pub use officer::{OfficerStanding, officer_leaderboard};
pub use regional::{RegionalMetrics, aggregate_regional};
pub use rollup::{DriftKind, MonthlyDrift, monthly_drift, rollup_monthly};
pub use trend::{TrendBucket, TrendPoint, collection_trend};

use std::{
  collections::{BTreeMap, BTreeSet},
  str::FromStr,
};

use chrono::NaiveDate;
use rust_decimal::{Decimal, prelude::ToPrimitive as _};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  entity::{Branch, BranchId},
  performance::DailyBranchPerformance,
};

// ─── Ratios ──────────────────────────────────────────────────────────────────

/// `collected / dues * 100`, or `0` when `dues` is not positive.
pub fn collection_rate(total_dues: Decimal, total_collected: Decimal) -> f64 {
  if total_dues <= Decimal::ZERO {
    return 0.0;
  }
  let dues = total_dues.to_f64().unwrap_or(0.0);
  let collected = total_collected.to_f64().unwrap_or(0.0);
  if dues <= 0.0 {
    return 0.0;
  }
  collected * 100.0 / dues
}

/// Arithmetic mean; `0` for an empty input.
pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
  let (sum, count) = values
    .into_iter()
    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
  if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Decimal mean; `0` for an empty input.
pub(crate) fn mean_decimal(sum: Decimal, count: usize) -> Decimal {
  if count == 0 {
    Decimal::ZERO
  } else {
    sum / Decimal::from(count as u64)
  }
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// An inclusive date range. Either bound may be open; the default window is
/// all-time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
  pub from: Option<NaiveDate>,
  pub to:   Option<NaiveDate>,
}

impl DateWindow {
  pub const ALL_TIME: Self = Self { from: None, to: None };

  /// Build a window, rejecting `from > to`.
  pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, Error> {
    if let (Some(from), Some(to)) = (from, to)
      && from > to
    {
      return Err(Error::InvalidWindow { from, to });
    }
    Ok(Self { from, to })
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
  }
}

/// Which branches an operation covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
  All,
  Branch(BranchId),
}

impl BranchScope {
  pub fn includes(&self, branch_id: &str) -> bool {
    match self {
      Self::All => true,
      Self::Branch(id) => id == branch_id,
    }
  }

  pub fn branch_id(&self) -> Option<&str> {
    match self {
      Self::All => None,
      Self::Branch(id) => Some(id),
    }
  }
}

impl FromStr for BranchScope {
  type Err = Error;

  /// `all` (any case) or a branch code made of ASCII letters and digits.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
      return Ok(Self::All);
    }
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
      return Err(Error::InvalidScope(s.to_owned()));
    }
    Ok(Self::Branch(s.to_owned()))
  }
}

// ─── Row grouping ────────────────────────────────────────────────────────────

/// Daily rows grouped under the branch they belong to.
pub struct BranchRows<'a> {
  /// Every known branch appears here, with an empty list if it has no rows.
  pub by_branch: BTreeMap<&'a str, Vec<&'a DailyBranchPerformance>>,
  /// Rows citing a branch absent from the branch set. Skipped.
  pub orphans:   usize,
}

/// Group `rows` inside `window` by branch. Rows whose branch is not in
/// `branches` are counted as orphans and dropped.
pub fn group_by_branch<'a>(
  branches: &'a [Branch],
  rows: &'a [DailyBranchPerformance],
  window: &DateWindow,
) -> BranchRows<'a> {
  let mut by_branch: BTreeMap<&'a str, Vec<&'a DailyBranchPerformance>> = branches
    .iter()
    .map(|b| (b.branch_id.as_str(), Vec::new()))
    .collect();
  let mut orphans = 0;

  for row in rows.iter().filter(|r| window.contains(r.date)) {
    match by_branch.get_mut(row.branch_id.as_str()) {
      Some(list) => list.push(row),
      None => orphans += 1,
    }
  }

  warn_orphans(orphans);
  BranchRows { by_branch, orphans }
}

/// Rows whose branch is in `branches`, in input order. Orphans are dropped
/// and logged as in [`group_by_branch`].
pub fn known_branch_rows<'a>(
  branches: &[Branch],
  rows: &'a [DailyBranchPerformance],
) -> Vec<&'a DailyBranchPerformance> {
  let known: BTreeSet<&str> = branches.iter().map(|b| b.branch_id.as_str()).collect();
  let (kept, orphans): (Vec<_>, Vec<_>) = rows
    .iter()
    .partition(|r| known.contains(r.branch_id.as_str()));
  warn_orphans(orphans.len());
  kept
}

fn warn_orphans(orphans: usize) {
  if orphans > 0 {
    tracing::warn!(orphans, "skipped performance rows citing unknown branches");
  }
}

/// Running sums over a set of daily rows.
#[derive(Debug, Clone, Default)]
pub(crate) struct Totals {
  pub rows:      usize,
  pub recruited: u64,
  pub disbursed: Decimal,
  pub dues:      Decimal,
  pub collected: Decimal,
  pub arrears:   Decimal,
  pub target:    Decimal,
  pub par_sum:   f64,
}

impl Totals {
  pub fn add(&mut self, row: &DailyBranchPerformance) {
    self.rows += 1;
    self.recruited += u64::from(row.recruited_today);
    self.disbursed += row.disbursed_amount_ksh;
    self.dues += row.daily_dues_ksh;
    self.collected += row.collected_ksh;
    self.arrears += row.arrears_new_ksh;
    self.target += row.daily_target_ksh;
    self.par_sum += row.par_percent;
  }

  pub fn of<'r>(rows: impl IntoIterator<Item = &'r DailyBranchPerformance>) -> Self {
    let mut totals = Self::default();
    for row in rows {
      totals.add(row);
    }
    totals
  }

  pub fn collection_rate(&self) -> f64 { collection_rate(self.dues, self.collected) }

  /// Unweighted mean of the rows' PAR percentages.
  pub fn avg_par(&self) -> f64 {
    if self.rows == 0 { 0.0 } else { self.par_sum / self.rows as f64 }
  }
}

// ─── Test fixtures ───────────────────────────────────────────────────────────
