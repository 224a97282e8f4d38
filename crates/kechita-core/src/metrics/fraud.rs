//! Fraud case listing.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{
  entity::{BranchId, Customer, CustomerId},
  risk::{AiCustomerFeatures, RiskBand},
};

/// Maximum number of cases returned by [`filter_fraud_cases`].
pub const FRAUD_CASE_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudCase {
  pub customer_id:  CustomerId,
  pub name:         String,
  pub risk_score:   f64,
  pub default_prob: f64,
  pub branch:       BranchId,
  pub region:       String,
}

/// Join customers to their feature rows, keep those in `band` (every band
/// when `None`), order by risk score descending then customer id, and cap
/// at [`FRAUD_CASE_LIMIT`].
///
/// Customers without a feature row are not cases; feature rows without a
/// customer are skipped.
pub fn filter_fraud_cases(
  customers: &[Customer],
  features: &[AiCustomerFeatures],
  band: Option<RiskBand>,
) -> Vec<FraudCase> {
  let by_id: BTreeMap<&str, &AiCustomerFeatures> = features
    .iter()
    .map(|f| (f.customer_id.as_str(), f))
    .collect();

  let mut cases: Vec<FraudCase> = customers
    .iter()
    .filter_map(|customer| {
      let f = by_id.get(customer.customer_id.as_str())?;
      if band.is_some_and(|band| !band.contains(f.risk_score)) {
        return None;
      }
      Some(FraudCase {
        customer_id:  customer.customer_id.clone(),
        name:         customer.full_name(),
        risk_score:   f.risk_score,
        default_prob: f.default_prob,
        branch:       customer.primary_branch.clone(),
        region:       customer.region.clone(),
      })
    })
    .collect();

  cases.sort_by(|a, b| {
    b.risk_score
      .partial_cmp(&a.risk_score)
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.customer_id.cmp(&b.customer_id))
  });
  cases.truncate(FRAUD_CASE_LIMIT);
  cases
}
