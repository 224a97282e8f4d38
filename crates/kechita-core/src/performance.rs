//! Branch and officer performance snapshots.
//!
//! [`DailyBranchPerformance`] is the unit of truth for every time-windowed
//! metric. [`MonthlyBranchSummary`] and [`OfficerPerformance`] are coarser
//! rollups populated by a batch process and consumed read-only.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{BranchId, OfficerId};

/// One snapshot per (date, branch). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBranchPerformance {
  pub date:                 NaiveDate,
  pub branch_id:            BranchId,
  pub region:               String,
  pub recruited_today:      u32,
  pub disbursed_amount_ksh: Decimal,
  pub daily_dues_ksh:       Decimal,
  pub collected_ksh:        Decimal,
  pub missed_calls:         u32,
  pub arrears_new_ksh:      Decimal,
  pub par_percent:          f64,
  pub daily_target_ksh:     Decimal,
}

impl DailyBranchPerformance {
  /// The `YYYY-MM` key of the month this row falls in, as used by monthly
  /// rollups.
  pub fn month(&self) -> String { format!("{:04}-{:02}", self.date.year(), self.date.month()) }
}

/// Pre-aggregated monthly rollup of a branch's daily rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBranchSummary {
  pub branch_id:             BranchId,
  /// `YYYY-MM`.
  pub month:                 String,
  pub recruited_monthly:     u64,
  pub disbursed_monthly_ksh: Decimal,
  pub dues_monthly_ksh:      Decimal,
  pub collected_monthly_ksh: Decimal,
  pub arrears_monthly_ksh:   Decimal,
  /// Plain mean of the daily `par_percent` values.
  pub avg_par_percent:       f64,
}

/// Pre-aggregated monthly rollup for one loan officer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerPerformance {
  pub officer_id:           OfficerId,
  pub branch_id:            BranchId,
  /// `YYYY-MM`.
  pub month:                String,
  pub loans_disbursed:      u32,
  pub amount_disbursed_ksh: Decimal,
  pub collected_ksh:        Decimal,
  pub dues_ksh:             Decimal,
  pub par_percent:          f64,
}
