//! Monthly rollups of daily rows, and the check that the cached monthly table
//! still agrees with them.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Totals, known_branch_rows};
use crate::{
  entity::{Branch, BranchId},
  performance::{DailyBranchPerformance, MonthlyBranchSummary},
};

/// Cached and recomputed PAR averages closer than this are equal.
const PAR_TOLERANCE: f64 = 1e-6;

/// Roll daily rows up to one summary per (branch, month), ordered by branch
/// then month. Rows citing a branch outside `branches` are skipped.
pub fn rollup_monthly(
  branches: &[Branch],
  rows: &[DailyBranchPerformance],
) -> Vec<MonthlyBranchSummary> {
  let mut groups: BTreeMap<(&str, String), Totals> = BTreeMap::new();
  for row in known_branch_rows(branches, rows) {
    groups
      .entry((row.branch_id.as_str(), row.month()))
      .or_default()
      .add(row);
  }

  groups
    .into_iter()
    .map(|((branch_id, month), t)| MonthlyBranchSummary {
      branch_id: branch_id.to_owned(),
      month,
      recruited_monthly: t.recruited,
      disbursed_monthly_ksh: t.disbursed,
      dues_monthly_ksh: t.dues,
      collected_monthly_ksh: t.collected,
      arrears_monthly_ksh: t.arrears,
      avg_par_percent: t.avg_par(),
    })
    .collect()
}

/// How a cached month departs from its daily rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftKind {
  /// Both exist but the named fields disagree.
  Mismatch { fields: Vec<&'static str> },
  /// The cache has a month with no daily rows behind it.
  NoDailyRows,
  /// Daily rows exist for a month the cache does not have.
  NotCached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyDrift {
  pub branch_id: BranchId,
  pub month:     String,
  #[serde(flatten)]
  pub kind:      DriftKind,
}

/// Compare `cached` against [`rollup_monthly`] of `rows`. An empty result
/// means the cache is consistent. A cached month for an unknown branch has
/// no daily rows behind it.
pub fn monthly_drift(
  branches: &[Branch],
  cached: &[MonthlyBranchSummary],
  rows: &[DailyBranchPerformance],
) -> Vec<MonthlyDrift> {
  let fresh: BTreeMap<(String, String), MonthlyBranchSummary> = rollup_monthly(branches, rows)
    .into_iter()
    .map(|s| ((s.branch_id.clone(), s.month.clone()), s))
    .collect();
  let stale: BTreeMap<(String, String), &MonthlyBranchSummary> = cached
    .iter()
    .map(|s| ((s.branch_id.clone(), s.month.clone()), s))
    .collect();

  let mut drift = Vec::new();
  for (key, cached) in &stale {
    let kind = match fresh.get(key) {
      None => DriftKind::NoDailyRows,
      Some(fresh) => {
        let fields = differing_fields(cached, fresh);
        if fields.is_empty() {
          continue;
        }
        DriftKind::Mismatch { fields }
      }
    };
    drift.push(MonthlyDrift {
      branch_id: key.0.clone(),
      month: key.1.clone(),
      kind,
    });
  }
  for key in fresh.keys().filter(|k| !stale.contains_key(*k)) {
    drift.push(MonthlyDrift {
      branch_id: key.0.clone(),
      month:     key.1.clone(),
      kind:      DriftKind::NotCached,
    });
  }

  drift.sort_by(|a, b| (&a.branch_id, &a.month).cmp(&(&b.branch_id, &b.month)));
  drift
}

fn differing_fields(a: &MonthlyBranchSummary, b: &MonthlyBranchSummary) -> Vec<&'static str> {
  let mut fields = Vec::new();
  if a.recruited_monthly != b.recruited_monthly {
    fields.push("recruited_monthly");
  }
  if a.disbursed_monthly_ksh != b.disbursed_monthly_ksh {
    fields.push("disbursed_monthly_ksh");
  }
  if a.dues_monthly_ksh != b.dues_monthly_ksh {
    fields.push("dues_monthly_ksh");
  }
  if a.collected_monthly_ksh != b.collected_monthly_ksh {
    fields.push("collected_monthly_ksh");
  }
  if a.arrears_monthly_ksh != b.arrears_monthly_ksh {
    fields.push("arrears_monthly_ksh");
  }
  if (a.avg_par_percent - b.avg_par_percent).abs() > PAR_TOLERANCE {
    fields.push("avg_par_percent");
  }
  fields
}
