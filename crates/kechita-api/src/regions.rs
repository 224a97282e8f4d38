//! Handler for `GET /regions`.

use std::sync::Arc;

use axum::{Json, extract::State};
use kechita_core::{
  metrics::{RegionalMetrics, aggregate_regional},
  store::{CustomerQuery, EntityStore, PerformanceQuery},
};

use crate::error::ApiError;

/// `GET /regions`: one record per region, ordered by region name.
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<RegionalMetrics>>, ApiError>
where
  S: EntityStore,
{
  let branches = store.list_branches().await.map_err(ApiError::store)?;
  let rows = store
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .map_err(ApiError::store)?;
  let customers = store
    .list_customers(&CustomerQuery::default())
    .await
    .map_err(ApiError::store)?;

  Ok(Json(aggregate_regional(&branches, &rows, &customers)))
}
