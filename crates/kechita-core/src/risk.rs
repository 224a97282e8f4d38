//! Per-customer risk attributes and risk banding.
//!
//! Scores and probabilities are produced elsewhere; this crate only consumes
//! them for ranking and filtering.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  Error,
  entity::{BranchId, CustomerId},
};

/// Scores at or above this value are [`RiskBand::High`].
pub const HIGH_RISK_THRESHOLD: f64 = 70.0;
/// Scores at or above this value (and below [`HIGH_RISK_THRESHOLD`]) are
/// [`RiskBand::Medium`]. Also the floor for dashboard alerts.
pub const MEDIUM_RISK_THRESHOLD: f64 = 40.0;

// ─── RiskBand ────────────────────────────────────────────────────────────────

/// A coarse bucket derived by thresholding a 0–100 risk score.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
  High,
  Medium,
  Low,
}

impl RiskBand {
  pub fn of(score: f64) -> Self {
    if score >= HIGH_RISK_THRESHOLD {
      Self::High
    } else if score >= MEDIUM_RISK_THRESHOLD {
      Self::Medium
    } else {
      Self::Low
    }
  }

  pub fn contains(self, score: f64) -> bool { Self::of(score) == self }

  /// Parse a request filter: `all` (or an empty string) means no band.
  pub fn parse_filter(s: &str) -> Result<Option<Self>, Error> {
    match s.trim() {
      "" => Ok(None),
      t if t.eq_ignore_ascii_case("all") => Ok(None),
      t => t.parse().map(Some),
    }
  }
}

impl FromStr for RiskBand {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "high" => Ok(Self::High),
      "medium" => Ok(Self::Medium),
      "low" => Ok(Self::Low),
      _ => Err(Error::UnknownRiskBand(s.to_owned())),
    }
  }
}

// ─── Feature rows ────────────────────────────────────────────────────────────

/// Boolean fraud indicators raised against a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudSignal {
  pub customer_id:                  CustomerId,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub national_id_mismatch:         bool,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub shared_phone_number:          bool,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub distance_anomaly:             bool,
  #[serde(deserialize_with = "crate::flag::deserialize")]
  pub suspicious_repayment_pattern: bool,
  /// Likelihood, in `[0, 1]`, that the customer record is synthetic.
  pub synthetic_customer_score:     f64,
}

impl FraudSignal {
  /// Number of raised boolean indicators.
  pub fn indicator_count(&self) -> usize {
    [
      self.national_id_mismatch,
      self.shared_phone_number,
      self.distance_anomaly,
      self.suspicious_repayment_pattern,
    ]
    .into_iter()
    .filter(|&raised| raised)
    .count()
  }
}

/// Model outputs for a customer, keyed by customer id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiCustomerFeatures {
  pub customer_id:           CustomerId,
  pub primary_branch:        BranchId,
  pub avg_weekly_cash:       Decimal,
  pub historical_cycles:     u32,
  /// 0–100.
  #[serde(alias = "risk_score_0_100")]
  pub risk_score:            f64,
  pub default_prob:          f64,
  pub churn_prob:            f64,
  pub recommended_limit_ksh: Decimal,
}

impl AiCustomerFeatures {
  pub fn band(&self) -> RiskBand { RiskBand::of(self.risk_score) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn band_boundaries() {
    assert_eq!(RiskBand::of(70.0), RiskBand::High);
    assert_eq!(RiskBand::of(69.99), RiskBand::Medium);
    assert_eq!(RiskBand::of(40.0), RiskBand::Medium);
    assert_eq!(RiskBand::of(39.99), RiskBand::Low);
    assert_eq!(RiskBand::of(0.0), RiskBand::Low);
    assert_eq!(RiskBand::of(100.0), RiskBand::High);
  }

  #[test]
  fn parse_filter_accepts_all_and_bands() {
    assert_eq!(RiskBand::parse_filter("all").unwrap(), None);
    assert_eq!(RiskBand::parse_filter("ALL").unwrap(), None);
    assert_eq!(RiskBand::parse_filter("").unwrap(), None);
    assert_eq!(RiskBand::parse_filter("High").unwrap(), Some(RiskBand::High));
    assert_eq!(RiskBand::parse_filter("low").unwrap(), Some(RiskBand::Low));
  }

  #[test]
  fn parse_filter_rejects_unknown_band() {
    let err = RiskBand::parse_filter("critical").unwrap_err();
    assert!(matches!(err, Error::UnknownRiskBand(ref s) if s == "critical"));
  }

  #[test]
  fn indicator_count_counts_raised_flags() {
    let signal = FraudSignal {
      customer_id:                  "C0000001".into(),
      national_id_mismatch:         true,
      shared_phone_number:          false,
      distance_anomaly:             true,
      suspicious_repayment_pattern: false,
      synthetic_customer_score:     0.4,
    };
    assert_eq!(signal.indicator_count(), 2);
  }
}
