//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Decimals are stored as their canonical string form, dates as `YYYY-MM-DD`,
//! UUIDs as hyphenated lowercase strings, and enums as their snake_case
//! names. Rows come back as `Raw*` structs of plain column values and are
//! decoded outside the database thread.

use std::str::FromStr;

use chrono::NaiveDate;
use kechita_core::{
  entity::{Branch, Customer, Officer},
  loan::{Loan, LoanStatus, Repayment, RepaymentStatus},
  performance::{DailyBranchPerformance, MonthlyBranchSummary, OfficerPerformance},
  risk::{AiCustomerFeatures, FraudSignal},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_loan_status(s: LoanStatus) -> &'static str { s.into() }

pub fn decode_loan_status(s: &str) -> Result<LoanStatus> {
  Ok(LoanStatus::try_from(s.to_owned())?)
}

pub fn encode_repayment_status(s: RepaymentStatus) -> &'static str { s.into() }

pub fn decode_repayment_status(s: &str) -> Result<RepaymentStatus> {
  Ok(RepaymentStatus::try_from(s.to_owned())?)
}

// ─── Column lists ────────────────────────────────────────────────────────────

pub const BRANCH_COLUMNS: &str = "branch_id, branch_name, region, urban_rural, staff_count, \
                                  target_tier, latitude, longitude";

pub const OFFICER_COLUMNS: &str = "officer_id, name, branch_id, role";

pub const CUSTOMER_COLUMNS: &str = "customer_id, first_name, last_name, gender, birth_year, \
                                    national_id, phone, primary_branch, region, business_type, \
                                    income_band, historical_cycles, avg_weekly_cash, \
                                    fraud_flag_initial";

pub const LOAN_COLUMNS: &str = "loan_id, customer_id, branch_id, officer_id, disbursement_date, \
                                due_date, amount, tenor_weeks, daily_installment, miss_rate, \
                                rescheduled, default_flag, status";

pub const REPAYMENT_COLUMNS: &str = "repayment_id, loan_id, customer_id, branch_id, \
                                     payment_date, amount_paid, status";

pub const DAILY_COLUMNS: &str = "date, branch_id, region, recruited_today, disbursed_amount_ksh, \
                                 daily_dues_ksh, collected_ksh, missed_calls, arrears_new_ksh, \
                                 par_percent, daily_target_ksh";

pub const MONTHLY_COLUMNS: &str = "branch_id, month, recruited_monthly, disbursed_monthly_ksh, \
                                   dues_monthly_ksh, collected_monthly_ksh, \
                                   arrears_monthly_ksh, avg_par_percent";

pub const OFFICER_PERF_COLUMNS: &str = "officer_id, branch_id, month, loans_disbursed, \
                                        amount_disbursed_ksh, collected_ksh, dues_ksh, \
                                        par_percent";

pub const FRAUD_COLUMNS: &str = "customer_id, national_id_mismatch, shared_phone_number, \
                                 distance_anomaly, suspicious_repayment_pattern, \
                                 synthetic_customer_score";

pub const FEATURE_COLUMNS: &str = "customer_id, primary_branch, avg_weekly_cash, \
                                   historical_cycles, risk_score, default_prob, churn_prob, \
                                   recommended_limit_ksh";

// ─── Rows without encoded columns ────────────────────────────────────────────

pub fn branch_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Branch> {
  Ok(Branch {
    branch_id:   row.get(0)?,
    branch_name: row.get(1)?,
    region:      row.get(2)?,
    urban_rural: row.get(3)?,
    staff_count: row.get(4)?,
    target_tier: row.get(5)?,
    latitude:    row.get(6)?,
    longitude:   row.get(7)?,
  })
}

pub fn officer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Officer> {
  Ok(Officer {
    officer_id: row.get(0)?,
    name:       row.get(1)?,
    branch_id:  row.get(2)?,
    role:       row.get(3)?,
  })
}

pub fn fraud_signal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FraudSignal> {
  Ok(FraudSignal {
    customer_id:                  row.get(0)?,
    national_id_mismatch:         row.get(1)?,
    shared_phone_number:          row.get(2)?,
    distance_anomaly:             row.get(3)?,
    suspicious_repayment_pattern: row.get(4)?,
    synthetic_customer_score:     row.get(5)?,
  })
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Raw values read directly from a `customers` row.
pub struct RawCustomer {
  pub customer_id:        String,
  pub first_name:         String,
  pub last_name:          String,
  pub gender:             String,
  pub birth_year:         i32,
  pub national_id:        String,
  pub phone:              String,
  pub primary_branch:     String,
  pub region:             String,
  pub business_type:      String,
  pub income_band:        String,
  pub historical_cycles:  u32,
  pub avg_weekly_cash:    String,
  pub fraud_flag_initial: bool,
}

impl RawCustomer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      customer_id:        row.get(0)?,
      first_name:         row.get(1)?,
      last_name:          row.get(2)?,
      gender:             row.get(3)?,
      birth_year:         row.get(4)?,
      national_id:        row.get(5)?,
      phone:              row.get(6)?,
      primary_branch:     row.get(7)?,
      region:             row.get(8)?,
      business_type:      row.get(9)?,
      income_band:        row.get(10)?,
      historical_cycles:  row.get(11)?,
      avg_weekly_cash:    row.get(12)?,
      fraud_flag_initial: row.get(13)?,
    })
  }

  pub fn into_customer(self) -> Result<Customer> {
    Ok(Customer {
      customer_id:        self.customer_id,
      first_name:         self.first_name,
      last_name:          self.last_name,
      gender:             self.gender,
      birth_year:         self.birth_year,
      national_id:        self.national_id,
      phone:              self.phone,
      primary_branch:     self.primary_branch,
      region:             self.region,
      business_type:      self.business_type,
      income_band:        self.income_band,
      historical_cycles:  self.historical_cycles,
      avg_weekly_cash:    decode_decimal(&self.avg_weekly_cash)?,
      fraud_flag_initial: self.fraud_flag_initial,
    })
  }
}

/// Raw values read directly from a `loans` row.
pub struct RawLoan {
  pub loan_id:           String,
  pub customer_id:       String,
  pub branch_id:         String,
  pub officer_id:        String,
  pub disbursement_date: String,
  pub due_date:          String,
  pub amount:            String,
  pub tenor_weeks:       u32,
  pub daily_installment: String,
  pub miss_rate:         f64,
  pub rescheduled:       bool,
  pub default_flag:      bool,
  pub status:            String,
}

impl RawLoan {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      loan_id:           row.get(0)?,
      customer_id:       row.get(1)?,
      branch_id:         row.get(2)?,
      officer_id:        row.get(3)?,
      disbursement_date: row.get(4)?,
      due_date:          row.get(5)?,
      amount:            row.get(6)?,
      tenor_weeks:       row.get(7)?,
      daily_installment: row.get(8)?,
      miss_rate:         row.get(9)?,
      rescheduled:       row.get(10)?,
      default_flag:      row.get(11)?,
      status:            row.get(12)?,
    })
  }

  pub fn into_loan(self) -> Result<Loan> {
    Ok(Loan {
      loan_id:           self.loan_id,
      customer_id:       self.customer_id,
      branch_id:         self.branch_id,
      officer_id:        self.officer_id,
      disbursement_date: decode_date(&self.disbursement_date)?,
      due_date:          decode_date(&self.due_date)?,
      amount:            decode_decimal(&self.amount)?,
      tenor_weeks:       self.tenor_weeks,
      daily_installment: decode_decimal(&self.daily_installment)?,
      miss_rate:         self.miss_rate,
      rescheduled:       self.rescheduled,
      default_flag:      self.default_flag,
      status:            decode_loan_status(&self.status)?,
    })
  }
}

/// Raw values read directly from a `repayments` row.
pub struct RawRepayment {
  pub repayment_id: String,
  pub loan_id:      String,
  pub customer_id:  String,
  pub branch_id:    String,
  pub payment_date: String,
  pub amount_paid:  String,
  pub status:       String,
}

impl RawRepayment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      repayment_id: row.get(0)?,
      loan_id:      row.get(1)?,
      customer_id:  row.get(2)?,
      branch_id:    row.get(3)?,
      payment_date: row.get(4)?,
      amount_paid:  row.get(5)?,
      status:       row.get(6)?,
    })
  }

  pub fn into_repayment(self) -> Result<Repayment> {
    Ok(Repayment {
      repayment_id: decode_uuid(&self.repayment_id)?,
      loan_id:      self.loan_id,
      customer_id:  self.customer_id,
      branch_id:    self.branch_id,
      payment_date: decode_date(&self.payment_date)?,
      amount_paid:  decode_decimal(&self.amount_paid)?,
      status:       decode_repayment_status(&self.status)?,
    })
  }
}

/// Raw values read directly from a `daily_branch_performance` row.
pub struct RawDaily {
  pub date:                 String,
  pub branch_id:            String,
  pub region:               String,
  pub recruited_today:      u32,
  pub disbursed_amount_ksh: String,
  pub daily_dues_ksh:       String,
  pub collected_ksh:        String,
  pub missed_calls:         u32,
  pub arrears_new_ksh:      String,
  pub par_percent:          f64,
  pub daily_target_ksh:     String,
}

impl RawDaily {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:                 row.get(0)?,
      branch_id:            row.get(1)?,
      region:               row.get(2)?,
      recruited_today:      row.get(3)?,
      disbursed_amount_ksh: row.get(4)?,
      daily_dues_ksh:       row.get(5)?,
      collected_ksh:        row.get(6)?,
      missed_calls:         row.get(7)?,
      arrears_new_ksh:      row.get(8)?,
      par_percent:          row.get(9)?,
      daily_target_ksh:     row.get(10)?,
    })
  }

  pub fn into_daily(self) -> Result<DailyBranchPerformance> {
    Ok(DailyBranchPerformance {
      date:                 decode_date(&self.date)?,
      branch_id:            self.branch_id,
      region:               self.region,
      recruited_today:      self.recruited_today,
      disbursed_amount_ksh: decode_decimal(&self.disbursed_amount_ksh)?,
      daily_dues_ksh:       decode_decimal(&self.daily_dues_ksh)?,
      collected_ksh:        decode_decimal(&self.collected_ksh)?,
      missed_calls:         self.missed_calls,
      arrears_new_ksh:      decode_decimal(&self.arrears_new_ksh)?,
      par_percent:          self.par_percent,
      daily_target_ksh:     decode_decimal(&self.daily_target_ksh)?,
    })
  }
}

/// Raw values read directly from a `monthly_branch_summary` row.
pub struct RawMonthly {
  pub branch_id:             String,
  pub month:                 String,
  pub recruited_monthly:     i64,
  pub disbursed_monthly_ksh: String,
  pub dues_monthly_ksh:      String,
  pub collected_monthly_ksh: String,
  pub arrears_monthly_ksh:   String,
  pub avg_par_percent:       f64,
}

impl RawMonthly {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      branch_id:             row.get(0)?,
      month:                 row.get(1)?,
      recruited_monthly:     row.get(2)?,
      disbursed_monthly_ksh: row.get(3)?,
      dues_monthly_ksh:      row.get(4)?,
      collected_monthly_ksh: row.get(5)?,
      arrears_monthly_ksh:   row.get(6)?,
      avg_par_percent:       row.get(7)?,
    })
  }

  pub fn into_monthly(self) -> Result<MonthlyBranchSummary> {
    Ok(MonthlyBranchSummary {
      branch_id:             self.branch_id,
      month:                 self.month,
      recruited_monthly:     self.recruited_monthly.max(0).unsigned_abs(),
      disbursed_monthly_ksh: decode_decimal(&self.disbursed_monthly_ksh)?,
      dues_monthly_ksh:      decode_decimal(&self.dues_monthly_ksh)?,
      collected_monthly_ksh: decode_decimal(&self.collected_monthly_ksh)?,
      arrears_monthly_ksh:   decode_decimal(&self.arrears_monthly_ksh)?,
      avg_par_percent:       self.avg_par_percent,
    })
  }
}

/// Raw values read directly from an `officer_performance` row.
pub struct RawOfficerPerformance {
  pub officer_id:           String,
  pub branch_id:            String,
  pub month:                String,
  pub loans_disbursed:      u32,
  pub amount_disbursed_ksh: String,
  pub collected_ksh:        String,
  pub dues_ksh:             String,
  pub par_percent:          f64,
}

impl RawOfficerPerformance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      officer_id:           row.get(0)?,
      branch_id:            row.get(1)?,
      month:                row.get(2)?,
      loans_disbursed:      row.get(3)?,
      amount_disbursed_ksh: row.get(4)?,
      collected_ksh:        row.get(5)?,
      dues_ksh:             row.get(6)?,
      par_percent:          row.get(7)?,
    })
  }

  pub fn into_officer_performance(self) -> Result<OfficerPerformance> {
    Ok(OfficerPerformance {
      officer_id:           self.officer_id,
      branch_id:            self.branch_id,
      month:                self.month,
      loans_disbursed:      self.loans_disbursed,
      amount_disbursed_ksh: decode_decimal(&self.amount_disbursed_ksh)?,
      collected_ksh:        decode_decimal(&self.collected_ksh)?,
      dues_ksh:             decode_decimal(&self.dues_ksh)?,
      par_percent:          self.par_percent,
    })
  }
}

/// Raw values read directly from an `ai_customer_features` row.
pub struct RawFeatures {
  pub customer_id:           String,
  pub primary_branch:        String,
  pub avg_weekly_cash:       String,
  pub historical_cycles:     u32,
  pub risk_score:            f64,
  pub default_prob:          f64,
  pub churn_prob:            f64,
  pub recommended_limit_ksh: String,
}

impl RawFeatures {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      customer_id:           row.get(0)?,
      primary_branch:        row.get(1)?,
      avg_weekly_cash:       row.get(2)?,
      historical_cycles:     row.get(3)?,
      risk_score:            row.get(4)?,
      default_prob:          row.get(5)?,
      churn_prob:            row.get(6)?,
      recommended_limit_ksh: row.get(7)?,
    })
  }

  pub fn into_features(self) -> Result<AiCustomerFeatures> {
    Ok(AiCustomerFeatures {
      customer_id:           self.customer_id,
      primary_branch:        self.primary_branch,
      avg_weekly_cash:       decode_decimal(&self.avg_weekly_cash)?,
      historical_cycles:     self.historical_cycles,
      risk_score:            self.risk_score,
      default_prob:          self.default_prob,
      churn_prob:            self.churn_prob,
      recommended_limit_ksh: decode_decimal(&self.recommended_limit_ksh)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  #[test]
  fn decimals_keep_their_value_through_text() {
    for d in [dec!(0), dec!(1000), dec!(238.095238), dec!(-12.50)] {
      assert_eq!(decode_decimal(&encode_decimal(d)).unwrap(), d);
    }
    assert_eq!(encode_decimal(dec!(1000.00)), "1000");
  }

  #[test]
  fn dates_are_iso_and_sortable() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(encode_date(d), "2025-03-07");
    assert_eq!(decode_date("2025-03-07").unwrap(), d);
    assert!(matches!(decode_date("07/03/2025"), Err(Error::DateParse(_))));
  }

  #[test]
  fn statuses_are_stored_snake_case() {
    assert_eq!(encode_loan_status(LoanStatus::WrittenOff), "written_off");
    assert_eq!(decode_loan_status("written_off").unwrap(), LoanStatus::WrittenOff);
    assert_eq!(encode_repayment_status(RepaymentStatus::Partial), "partial");
    assert!(decode_repayment_status("bounced").is_err());
  }
}
