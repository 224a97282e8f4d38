//! Collection trends over time.

use std::{collections::BTreeMap, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{Totals, known_branch_rows};
use crate::{Error, entity::Branch, performance::DailyBranchPerformance};

/// Width of one trend period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrendBucket {
  #[default]
  Day,
  /// ISO week, keyed by its Monday.
  Week,
  /// Calendar month, keyed by its first day.
  Month,
}

impl TrendBucket {
  /// The first day of the period containing `date`.
  pub fn period_start(self, date: NaiveDate) -> NaiveDate {
    match self {
      Self::Day => date,
      Self::Week => {
        let back = u64::from(date.weekday().num_days_from_monday());
        date.checked_sub_days(Days::new(back)).unwrap_or(date)
      }
      Self::Month => date.with_day(1).unwrap_or(date),
    }
  }
}

impl FromStr for TrendBucket {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "day" | "daily" => Ok(Self::Day),
      "week" | "weekly" => Ok(Self::Week),
      "month" | "monthly" => Ok(Self::Month),
      _ => Err(Error::UnknownBucket(s.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub period_start:    NaiveDate,
  pub dues:            Decimal,
  pub collected:       Decimal,
  pub disbursed:       Decimal,
  pub arrears:         Decimal,
  pub collection_rate: f64,
  pub avg_par:         f64,
  pub rows:            usize,
}

/// Bucket `rows` into periods of `bucket` width, ascending by period start.
/// Periods with no rows are absent rather than zero-filled. Rows citing a
/// branch outside `branches` are skipped.
pub fn collection_trend(
  branches: &[Branch],
  rows: &[DailyBranchPerformance],
  bucket: TrendBucket,
) -> Vec<TrendPoint> {
  let mut periods: BTreeMap<NaiveDate, Totals> = BTreeMap::new();
  for row in known_branch_rows(branches, rows) {
    periods
      .entry(bucket.period_start(row.date))
      .or_default()
      .add(row);
  }

  periods
    .into_iter()
    .map(|(period_start, t)| TrendPoint {
      period_start,
      dues: t.dues,
      collected: t.collected,
      disbursed: t.disbursed,
      arrears: t.arrears,
      collection_rate: t.collection_rate(),
      avg_par: t.avg_par(),
      rows: t.rows,
    })
    .collect()
}
