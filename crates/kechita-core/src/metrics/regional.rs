//! Regional rollups.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{DateWindow, Totals, group_by_branch};
use crate::{
  entity::{Branch, Customer},
  performance::DailyBranchPerformance,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalMetrics {
  pub region:           String,
  pub branch_count:     usize,
  pub total_disbursed:  Decimal,
  pub total_collected:  Decimal,
  pub total_arrears:    Decimal,
  pub collection_rate:  f64,
  /// Plain mean over every daily row in the region. Not recomputed from
  /// summed numerators and denominators.
  pub avg_par:          f64,
  /// Distinct customers whose primary branch lies in the region.
  pub active_customers: usize,
}

/// One record per region named by the branch set, ordered by region name.
///
/// Daily rows are attributed to a region through their branch, not through
/// the row's own `region` column. Rows and customers citing unknown branches
/// are skipped.
pub fn aggregate_regional(
  branches: &[Branch],
  rows: &[DailyBranchPerformance],
  customers: &[Customer],
) -> Vec<RegionalMetrics> {
  let grouped = group_by_branch(branches, rows, &DateWindow::ALL_TIME);

  let region_of: BTreeMap<&str, &str> = branches
    .iter()
    .map(|b| (b.branch_id.as_str(), b.region.as_str()))
    .collect();

  let mut totals: BTreeMap<&str, (BTreeSet<&str>, Totals)> = BTreeMap::new();
  for branch in branches {
    let entry = totals.entry(branch.region.as_str()).or_default();
    entry.0.insert(branch.branch_id.as_str());
  }
  for (branch_id, rows) in &grouped.by_branch {
    if let Some(region) = region_of.get(branch_id)
      && let Some((_, region_totals)) = totals.get_mut(region)
    {
      for row in rows {
        region_totals.add(row);
      }
    }
  }

  let mut customers_by_region: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
  for customer in customers {
    if let Some(region) = region_of.get(customer.primary_branch.as_str()) {
      customers_by_region
        .entry(*region)
        .or_default()
        .insert(customer.customer_id.as_str());
    }
  }

  totals
    .into_iter()
    .map(|(region, (branch_ids, t))| RegionalMetrics {
      region:           region.to_owned(),
      branch_count:     branch_ids.len(),
      total_disbursed:  t.disbursed,
      total_collected:  t.collected,
      total_arrears:    t.arrears,
      collection_rate:  t.collection_rate(),
      avg_par:          t.avg_par(),
      active_customers: customers_by_region.get(region).map_or(0, BTreeSet::len),
    })
    .collect()
}
