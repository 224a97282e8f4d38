//! The portfolio-wide dashboard summary.

use std::{
  cmp::Ordering,
  collections::{BTreeMap, BTreeSet},
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{
  BranchRanking, DateWindow, Totals, group_by_branch, rank_branches_by_collection_rate,
};
use crate::{
  entity::{Branch, BranchId, Customer, CustomerId},
  loan::Loan,
  performance::DailyBranchPerformance,
  risk::{AiCustomerFeatures, MEDIUM_RISK_THRESHOLD},
};

/// Number of branches in the dashboard league table.
pub const TOP_BRANCH_LIMIT: usize = 10;
/// Maximum number of risk alerts on the dashboard.
pub const ALERT_LIMIT: usize = 10;

/// A customer whose risk score crossed the alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAlert {
  pub customer_id:  CustomerId,
  pub name:         String,
  pub branch:       BranchId,
  pub risk_score:   f64,
  pub default_prob: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
  /// Σ principal of loans whose status is active.
  pub total_disbursed:  Decimal,
  pub collection_rate:  f64,
  pub total_arrears:    Decimal,
  /// Straight mean over every daily row, not weighted by branch.
  pub par_rate:         f64,
  /// Distinct customers holding at least one active loan.
  pub active_customers: usize,
  pub active_loans:     usize,
  pub top_branches:     Vec<BranchRanking>,
  pub alerts:           Vec<RiskAlert>,
}

pub fn dashboard_summary(
  loans: &[Loan],
  rows: &[DailyBranchPerformance],
  branches: &[Branch],
  customers: &[Customer],
  features: &[AiCustomerFeatures],
) -> DashboardSummary {
  let active: Vec<&Loan> = loans.iter().filter(|l| l.status.is_active()).collect();
  let total_disbursed: Decimal = active.iter().map(|l| l.amount).sum();
  let active_customers = active
    .iter()
    .map(|l| l.customer_id.as_str())
    .collect::<BTreeSet<_>>()
    .len();

  let grouped = group_by_branch(branches, rows, &DateWindow::ALL_TIME);
  let totals = Totals::of(grouped.by_branch.values().flatten().copied());

  DashboardSummary {
    total_disbursed,
    collection_rate: totals.collection_rate(),
    total_arrears: totals.arrears,
    par_rate: totals.avg_par(),
    active_customers,
    active_loans: active.len(),
    top_branches: rank_branches_by_collection_rate(
      branches,
      rows,
      &DateWindow::ALL_TIME,
      Some(TOP_BRANCH_LIMIT),
    ),
    alerts: risk_alerts(customers, features, ALERT_LIMIT),
  }
}

/// Customers with `risk_score >= 40`, highest score first, ties by id.
fn risk_alerts(
  customers: &[Customer],
  features: &[AiCustomerFeatures],
  limit: usize,
) -> Vec<RiskAlert> {
  let by_id: BTreeMap<&str, &Customer> = customers
    .iter()
    .map(|c| (c.customer_id.as_str(), c))
    .collect();

  let mut alerts: Vec<RiskAlert> = features
    .iter()
    .filter(|f| f.risk_score >= MEDIUM_RISK_THRESHOLD)
    .filter_map(|f| {
      let customer = by_id.get(f.customer_id.as_str())?;
      Some(RiskAlert {
        customer_id:  customer.customer_id.clone(),
        name:         customer.full_name(),
        branch:       customer.primary_branch.clone(),
        risk_score:   f.risk_score,
        default_prob: f.default_prob,
      })
    })
    .collect();

  alerts.sort_by(|a, b| {
    b.risk_score
      .partial_cmp(&a.risk_score)
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.customer_id.cmp(&b.customer_id))
  });
  alerts.truncate(limit);
  alerts
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::{loan::LoanStatus, metrics::fixtures::*};

  #[test]
  fn completed_loans_are_excluded_from_disbursed_total() {
    let loans = vec![
      loan("L1", "C1", 5000, LoanStatus::Active),
      loan("L2", "C2", 9000, LoanStatus::Completed),
    ];
    let summary = dashboard_summary(&loans, &[], &[], &[], &[]);

    assert_eq!(summary.total_disbursed, dec!(5000));
    assert_eq!(summary.active_loans, 1);
    assert_eq!(summary.active_customers, 1);
  }

  #[test]
  fn active_customers_are_distinct() {
    let loans = vec![
      loan("L1", "C1", 5000, LoanStatus::Active),
      loan("L2", "C1", 8000, LoanStatus::Active),
      loan("L3", "C2", 8000, LoanStatus::Defaulted),
    ];
    let summary = dashboard_summary(&loans, &[], &[], &[], &[]);
    assert_eq!(summary.active_loans, 2);
    assert_eq!(summary.active_customers, 1);
    assert_eq!(summary.total_disbursed, dec!(13000));
  }

  #[test]
  fn empty_store_summarises_to_zero() {
    let summary = dashboard_summary(&[], &[], &[], &[], &[]);
    assert_eq!(summary.total_disbursed, Decimal::ZERO);
    assert_eq!(summary.collection_rate, 0.0);
    assert_eq!(summary.par_rate, 0.0);
    assert!(summary.top_branches.is_empty());
    assert!(summary.alerts.is_empty());
  }

  #[test]
  fn portfolio_ratios_span_all_rows() {
    let branches = vec![branch("BR001", "Nairobi"), branch("BR002", "Coast")];
    let mut second = row("2025-01-01", "BR002", dec!(3000), dec!(2000));
    second.par_percent = 5.5;
    let rows = vec![row("2025-01-01", "BR001", dec!(1000), dec!(1000)), second];

    let summary = dashboard_summary(&[], &rows, &branches, &[], &[]);
    assert_eq!(summary.collection_rate, 75.0);
    assert_eq!(summary.total_arrears, dec!(20));
    assert_eq!(summary.par_rate, 4.0);
    assert_eq!(summary.top_branches[0].branch_id, "BR001");
    assert_eq!(summary.top_branches[1].branch_id, "BR002");
  }

  #[test]
  fn orphaned_rows_are_left_out_of_portfolio_ratios() {
    let branches = vec![branch("BR001", "Nairobi")];
    let rows = vec![
      row("2025-01-01", "BR001", dec!(1000), dec!(900)),
      row("2025-01-01", "BR404", dec!(1000), dec!(0)),
    ];

    let summary = dashboard_summary(&[], &rows, &branches, &[], &[]);
    assert_eq!(summary.collection_rate, 90.0);
    assert_eq!(summary.total_arrears, dec!(10));
    assert_eq!(summary.top_branches.len(), 1);
  }

  #[test]
  fn alerts_filter_sort_and_cap() {
    let customers: Vec<Customer> = (1..=15)
      .map(|i| customer(&format!("C{i:02}"), "BR001"))
      .collect();
    let mut feature_rows: Vec<AiCustomerFeatures> = (1..=15u32)
      .map(|i| features(&format!("C{i:02}"), 30.0 + f64::from(i) * 3.0))
      .collect();
    // C14 ties with C15; C99 has no customer row.
    feature_rows[13].risk_score = 75.0;
    feature_rows.push(features("C99", 99.0));

    let summary = dashboard_summary(&[], &[], &[], &customers, &feature_rows);
    let alerts = &summary.alerts;

    assert_eq!(alerts.len(), ALERT_LIMIT);
    assert!(alerts.iter().all(|a| a.risk_score >= MEDIUM_RISK_THRESHOLD));
    assert!(alerts.windows(2).all(|w| w[0].risk_score >= w[1].risk_score));
    assert_eq!(alerts[0].customer_id, "C14");
    assert_eq!(alerts[1].customer_id, "C15");
    assert!(alerts.iter().all(|a| a.customer_id != "C99"));
  }
}
