//! Handler for `GET /trends`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use kechita_core::{
  metrics::{DateWindow, TrendBucket, TrendPoint, collection_trend},
  store::{EntityStore, PerformanceQuery},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TrendParams {
  /// `day`, `week` or `month`. Absent means `day`.
  pub bucket:    Option<String>,
  pub branch_id: Option<String>,
  pub from:      Option<NaiveDate>,
  pub to:        Option<NaiveDate>,
}

/// `GET /trends?bucket=day|week|month&branch_id=&from=&to=`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<TrendParams>,
) -> Result<Json<Vec<TrendPoint>>, ApiError>
where
  S: EntityStore,
{
  let bucket = match params.bucket.as_deref() {
    Some(b) => b.parse()?,
    None => TrendBucket::default(),
  };
  let window = DateWindow::new(params.from, params.to)?;

  let branches = store.list_branches().await.map_err(ApiError::store)?;
  let rows = store
    .list_daily_performance(&PerformanceQuery {
      branch_id: params.branch_id,
      window,
    })
    .await
    .map_err(ApiError::store)?;

  Ok(Json(collection_trend(&branches, &rows, bucket)))
}
