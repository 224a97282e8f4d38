//! Handler for `GET /dashboard`.

use std::sync::Arc;

use axum::{Json, extract::State};
use kechita_core::{
  metrics::{DashboardSummary, dashboard_summary},
  store::{CustomerQuery, EntityStore, LoanQuery, PerformanceQuery},
};

use crate::error::ApiError;

/// `GET /dashboard`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<DashboardSummary>, ApiError>
where
  S: EntityStore,
{
  Ok(Json(load_summary(store.as_ref()).await?))
}

/// Read the whole snapshot and compute the headline figures.
pub(crate) async fn load_summary<S>(store: &S) -> Result<DashboardSummary, ApiError>
where
  S: EntityStore,
{
  let loans = store
    .list_loans(&LoanQuery::default())
    .await
    .map_err(ApiError::store)?;
  let rows = store
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .map_err(ApiError::store)?;
  let branches = store.list_branches().await.map_err(ApiError::store)?;
  let customers = store
    .list_customers(&CustomerQuery::default())
    .await
    .map_err(ApiError::store)?;
  let features = store.list_ai_features().await.map_err(ApiError::store)?;

  Ok(dashboard_summary(&loans, &rows, &branches, &customers, &features))
}
