//! Reference entities: branches, officers and customers.
//!
//! These rows are created at onboarding or enrollment and only change through
//! corrective edits. Identifiers are the string codes issued by the source
//! systems (`BR001`, `OF000001`, `C0000001`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Branch identifier, e.g. `BR001`.
pub type BranchId = String;
/// Loan officer identifier, e.g. `OF000001`.
pub type OfficerId = String;
/// Customer identifier, e.g. `C0000001`.
pub type CustomerId = String;

// ─── Branch ──────────────────────────────────────────────────────────────────

/// A physical branch. Every branch belongs to exactly one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
  pub branch_id:   BranchId,
  pub branch_name: String,
  pub region:      String,
  /// `Urban`, `Rural` or `Peri-Urban`.
  pub urban_rural: String,
  pub staff_count: u32,
  /// Monthly target tier (`A`, `B` or `C`).
  #[serde(alias = "avg_target_tier")]
  pub target_tier: String,
  pub latitude:    f64,
  pub longitude:   f64,
}

// ─── Officer ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Officer {
  pub officer_id: OfficerId,
  pub name:       String,
  pub branch_id:  BranchId,
  pub role:       String,
}

// ─── Customer ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
  pub customer_id:        CustomerId,
  pub first_name:         String,
  pub last_name:          String,
  pub gender:             String,
  pub birth_year:         i32,
  pub national_id:        String,
  pub phone:              String,
  pub primary_branch:     BranchId,
  pub region:             String,
  pub business_type:      String,
  #[serde(alias = "monthly_income_band")]
  pub income_band:        String,
  /// Number of completed loan cycles before this dataset begins.
  pub historical_cycles:  u32,
  pub avg_weekly_cash:    Decimal,
  /// Set at enrollment when the customer was already suspected of fraud.
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub fraud_flag_initial: bool,
}

impl Customer {
  /// `"First Last"`, as shown in listings.
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}
