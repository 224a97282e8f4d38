//! Loan officer league table.

use std::{cmp::Ordering, collections::BTreeMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{collection_rate, mean};
use crate::{
  entity::{BranchId, Officer, OfficerId},
  performance::OfficerPerformance,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficerStanding {
  pub officer_id:       OfficerId,
  pub name:             String,
  pub branch_id:        BranchId,
  /// Monthly rows behind these totals.
  pub months:           usize,
  pub loans_disbursed:  u64,
  pub amount_disbursed: Decimal,
  pub collected:        Decimal,
  pub dues:             Decimal,
  pub collection_rate:  f64,
  pub avg_par:          f64,
}

/// Sum each officer's monthly rows and rank by collection rate, highest
/// first, ties by officer id. Every officer appears, with zeros if they have
/// no rows; rows for unknown officers are skipped.
pub fn officer_leaderboard(
  officers: &[Officer],
  performance: &[OfficerPerformance],
) -> Vec<OfficerStanding> {
  let mut rows_by_officer: BTreeMap<&str, Vec<&OfficerPerformance>> = officers
    .iter()
    .map(|o| (o.officer_id.as_str(), Vec::new()))
    .collect();
  let mut orphans = 0usize;
  for row in performance {
    match rows_by_officer.get_mut(row.officer_id.as_str()) {
      Some(rows) => rows.push(row),
      None => orphans += 1,
    }
  }
  if orphans > 0 {
    tracing::warn!(orphans, "skipped officer rows citing unknown officers");
  }

  let mut standings: Vec<OfficerStanding> = officers
    .iter()
    .map(|officer| {
      let rows = rows_by_officer
        .get(officer.officer_id.as_str())
        .map(Vec::as_slice)
        .unwrap_or_default();
      let dues: Decimal = rows.iter().map(|r| r.dues_ksh).sum();
      let collected: Decimal = rows.iter().map(|r| r.collected_ksh).sum();
      OfficerStanding {
        officer_id: officer.officer_id.clone(),
        name: officer.name.clone(),
        branch_id: officer.branch_id.clone(),
        months: rows.len(),
        loans_disbursed: rows.iter().map(|r| u64::from(r.loans_disbursed)).sum(),
        amount_disbursed: rows.iter().map(|r| r.amount_disbursed_ksh).sum(),
        collected,
        dues,
        collection_rate: collection_rate(dues, collected),
        avg_par: mean(rows.iter().map(|r| r.par_percent)),
      }
    })
    .collect();

  standings.sort_by(|a, b| {
    b.collection_rate
      .partial_cmp(&a.collection_rate)
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.officer_id.cmp(&b.officer_id))
  });
  standings
}
