//! Per-branch performance records and the collection-rate ranking.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BranchScope, DateWindow, Totals, group_by_branch, mean_decimal};
use crate::{
  entity::{Branch, BranchId},
  performance::DailyBranchPerformance,
};

/// One entry of the collection-rate league table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRanking {
  pub branch_id:       BranchId,
  pub branch_name:     String,
  pub region:          String,
  pub total_disbursed: Decimal,
  pub collection_rate: f64,
}

/// Rank branches by collection rate over `window`, highest first.
///
/// Equal rates are ordered by branch id ascending so the output is stable.
/// Branches with no rows in the window rank with a rate of zero. `limit`
/// truncates the result (`None` returns every branch).
pub fn rank_branches_by_collection_rate(
  branches: &[Branch],
  rows: &[DailyBranchPerformance],
  window: &DateWindow,
  limit: Option<usize>,
) -> Vec<BranchRanking> {
  let grouped = group_by_branch(branches, rows, window);

  let mut ranking: Vec<BranchRanking> = branches
    .iter()
    .map(|branch| {
      let totals = grouped
        .by_branch
        .get(branch.branch_id.as_str())
        .map(|rows| Totals::of(rows.iter().copied()))
        .unwrap_or_default();
      BranchRanking {
        branch_id:       branch.branch_id.clone(),
        branch_name:     branch.branch_name.clone(),
        region:          branch.region.clone(),
        total_disbursed: totals.disbursed,
        collection_rate: totals.collection_rate(),
      }
    })
    .collect();

  ranking.sort_by(|a, b| {
    b.collection_rate
      .partial_cmp(&a.collection_rate)
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.branch_id.cmp(&b.branch_id))
  });

  if let Some(limit) = limit {
    ranking.truncate(limit);
  }
  ranking
}

/// Window aggregates for one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchPerformance {
  pub branch_id:       BranchId,
  pub branch_name:     String,
  pub region:          String,
  /// Mean daily target.
  pub avg_target:      Decimal,
  /// Mean daily collection.
  pub avg_collected:   Decimal,
  pub sum_disbursed:   Decimal,
  pub sum_arrears:     Decimal,
  /// Unweighted mean of daily PAR percentages.
  pub avg_par:         f64,
  /// Σcollected / Σdues × 100.
  pub collection_rate: f64,
  pub sum_recruited:   u64,
  /// Number of daily rows behind these figures.
  pub days:            usize,
}

/// Aggregate daily rows for the branches selected by `scope`.
///
/// Both scopes yield the same record shape, ordered by branch id. A scope
/// naming an unknown branch yields an empty result.
pub fn aggregate_branch_performance(
  scope: &BranchScope,
  branches: &[Branch],
  rows: &[DailyBranchPerformance],
  window: &DateWindow,
) -> Vec<BranchPerformance> {
  let grouped = group_by_branch(branches, rows, window);

  let mut selected: Vec<&Branch> = branches
    .iter()
    .filter(|b| scope.includes(&b.branch_id))
    .collect();
  selected.sort_by(|a, b| a.branch_id.cmp(&b.branch_id));

  selected
    .into_iter()
    .map(|branch| {
      let totals = grouped
        .by_branch
        .get(branch.branch_id.as_str())
        .map(|rows| Totals::of(rows.iter().copied()))
        .unwrap_or_default();
      BranchPerformance {
        branch_id:       branch.branch_id.clone(),
        branch_name:     branch.branch_name.clone(),
        region:          branch.region.clone(),
        avg_target:      mean_decimal(totals.target, totals.rows),
        avg_collected:   mean_decimal(totals.collected, totals.rows),
        sum_disbursed:   totals.disbursed,
        sum_arrears:     totals.arrears,
        avg_par:         totals.avg_par(),
        collection_rate: totals.collection_rate(),
        sum_recruited:   totals.recruited,
        days:            totals.rows,
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::metrics::fixtures::*;

  #[test]
  fn two_row_branch_has_ninety_percent_collection() {
    let branches = vec![branch("B1", "Nairobi")];
    let rows = vec![
      row("2025-01-01", "B1", dec!(1000), dec!(800)),
      row("2025-01-02", "B1", dec!(2000), dec!(1900)),
    ];

    let perf = aggregate_branch_performance(
      &BranchScope::Branch("B1".into()),
      &branches,
      &rows,
      &DateWindow::ALL_TIME,
    );

    assert_eq!(perf.len(), 1);
    assert_eq!(perf[0].collection_rate, 90.0);
    assert_eq!(perf[0].avg_collected, dec!(1350));
    assert_eq!(perf[0].sum_disbursed, dec!(2000));
    assert_eq!(perf[0].sum_arrears, dec!(20));
    assert_eq!(perf[0].sum_recruited, 4);
    assert_eq!(perf[0].avg_target, dec!(60000));
    assert_eq!(perf[0].avg_par, 2.5);
    assert_eq!(perf[0].days, 2);
  }

  #[test]
  fn all_scope_and_single_scope_agree() {
    let branches = vec![branch("BR002", "Coast"), branch("BR001", "Nairobi")];
    let rows = vec![
      row("2025-01-01", "BR001", dec!(1000), dec!(800)),
      row("2025-01-01", "BR002", dec!(500), dec!(500)),
    ];

    let all = aggregate_branch_performance(
      &BranchScope::All,
      &branches,
      &rows,
      &DateWindow::ALL_TIME,
    );
    let one = aggregate_branch_performance(
      &BranchScope::Branch("BR002".into()),
      &branches,
      &rows,
      &DateWindow::ALL_TIME,
    );

    assert_eq!(all.len(), 2);
    assert_eq!(all[0].branch_id, "BR001");
    assert_eq!(all[1], one[0]);
  }

  #[test]
  fn branch_without_rows_reports_zeros() {
    let branches = vec![branch("BR001", "Nairobi")];
    let perf =
      aggregate_branch_performance(&BranchScope::All, &branches, &[], &DateWindow::ALL_TIME);

    assert_eq!(perf.len(), 1);
    assert_eq!(perf[0].collection_rate, 0.0);
    assert_eq!(perf[0].avg_par, 0.0);
    assert_eq!(perf[0].avg_target, Decimal::ZERO);
    assert_eq!(perf[0].days, 0);
  }

  #[test]
  fn unknown_branch_scope_is_empty() {
    let branches = vec![branch("BR001", "Nairobi")];
    let perf = aggregate_branch_performance(
      &BranchScope::Branch("BR404".into()),
      &branches,
      &[],
      &DateWindow::ALL_TIME,
    );
    assert!(perf.is_empty());
  }

  #[test]
  fn orphaned_rows_do_not_leak_into_totals() {
    let branches = vec![branch("BR001", "Nairobi")];
    let clean = vec![row("2025-01-01", "BR001", dec!(1000), dec!(800))];
    let mut dirty = clean.clone();
    dirty.push(row("2025-01-01", "BR404", dec!(1000), dec!(0)));

    let a = aggregate_branch_performance(&BranchScope::All, &branches, &clean, &DateWindow::ALL_TIME);
    let b = aggregate_branch_performance(&BranchScope::All, &branches, &dirty, &DateWindow::ALL_TIME);
    assert_eq!(a, b);
  }

  #[test]
  fn window_restricts_rows() {
    let branches = vec![branch("BR001", "Nairobi")];
    let rows = vec![
      row("2025-01-01", "BR001", dec!(1000), dec!(100)),
      row("2025-02-01", "BR001", dec!(1000), dec!(900)),
    ];
    let window = DateWindow::new(Some(date("2025-02-01")), None).unwrap();

    let perf = aggregate_branch_performance(&BranchScope::All, &branches, &rows, &window);
    assert_eq!(perf[0].days, 1);
    assert_eq!(perf[0].collection_rate, 90.0);
  }

  #[test]
  fn ranking_is_descending_with_id_tie_break() {
    let branches = vec![
      branch("BR003", "Coast"),
      branch("BR001", "Nairobi"),
      branch("BR002", "Eastern"),
      branch("BR004", "Western"),
    ];
    let rows = vec![
      row("2025-01-01", "BR001", dec!(100), dec!(80)),
      row("2025-01-01", "BR002", dec!(100), dec!(95)),
      row("2025-01-01", "BR003", dec!(100), dec!(80)),
    ];

    let ranking =
      rank_branches_by_collection_rate(&branches, &rows, &DateWindow::ALL_TIME, None);
    let ids: Vec<&str> = ranking.iter().map(|r| r.branch_id.as_str()).collect();

    assert_eq!(ids, ["BR002", "BR001", "BR003", "BR004"]);
    assert!(
      ranking
        .windows(2)
        .all(|w| w[0].collection_rate >= w[1].collection_rate)
    );
    assert_eq!(ranking[3].collection_rate, 0.0);
  }

  #[test]
  fn ranking_truncates_to_limit() {
    let branches: Vec<Branch> = (1..=15)
      .map(|i| branch(&format!("BR{i:03}"), "Nairobi"))
      .collect();
    let rows: Vec<DailyBranchPerformance> = (1..=15u32)
      .map(|i| row("2025-01-01", &format!("BR{i:03}"), dec!(100), Decimal::from(i)))
      .collect();

    let top = rank_branches_by_collection_rate(&branches, &rows, &DateWindow::ALL_TIME, Some(10));
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].branch_id, "BR015");
    assert_eq!(top[9].branch_id, "BR006");
    assert_eq!(top[0].total_disbursed, dec!(1000));
  }
}
