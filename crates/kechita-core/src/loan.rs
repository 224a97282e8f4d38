//! Loans and repayments.
//!
//! A loan row is created at disbursement; its status and flags move as the
//! loan progresses but the row is never deleted. Repayments are immutable
//! once written.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  Error,
  entity::{BranchId, CustomerId, OfficerId},
};

/// Loan identifier, e.g. `L00000001`.
pub type LoanId = String;

// ─── LoanStatus ──────────────────────────────────────────────────────────────

/// Lifecycle state of a loan. Parsed case-insensitively, so both `Active` and
/// `active` are accepted from input rows.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LoanStatus {
  Active,
  Completed,
  Defaulted,
  #[strum(to_string = "written_off", serialize = "writtenoff")]
  WrittenOff,
}

impl LoanStatus {
  pub fn is_active(self) -> bool { matches!(self, Self::Active) }
}

impl TryFrom<String> for LoanStatus {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    s.trim().parse().map_err(|_| Error::UnknownLoanStatus(s))
  }
}

// ─── Loan ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
  pub loan_id:           LoanId,
  pub customer_id:       CustomerId,
  pub branch_id:         BranchId,
  pub officer_id:        OfficerId,
  pub disbursement_date: NaiveDate,
  pub due_date:          NaiveDate,
  /// Principal in KSh.
  pub amount:            Decimal,
  pub tenor_weeks:       u32,
  pub daily_installment: Decimal,
  /// Fraction of scheduled installments missed, in `[0, 1]`.
  pub miss_rate:         f64,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub rescheduled:       bool,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub default_flag:      bool,
  #[serde(alias = "loan_status")]
  pub status:            LoanStatus,
}

// ─── Repayments ──────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  EnumString,
  IntoStaticStr,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(try_from = "String", into = "&'static str")]
pub enum RepaymentStatus {
  Paid,
  Partial,
  Missed,
}

impl TryFrom<String> for RepaymentStatus {
  type Error = Error;

  fn try_from(s: String) -> Result<Self, Self::Error> {
    s.trim().parse().map_err(|_| Error::UnknownRepaymentStatus(s))
  }
}

/// A single scheduled payment event. Source rows carry no identifier, so one
/// is assigned on deserialisation when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repayment {
  #[serde(default = "Uuid::new_v4")]
  pub repayment_id: Uuid,
  pub loan_id:      LoanId,
  pub customer_id:  CustomerId,
  pub branch_id:    BranchId,
  pub payment_date: NaiveDate,
  pub amount_paid:  Decimal,
  pub status:       RepaymentStatus,
}
