//! Handler for `GET /consistency/monthly`.

use std::sync::Arc;

use axum::{Json, extract::State};
use kechita_core::{
  metrics::{MonthlyDrift, monthly_drift},
  store::{EntityStore, PerformanceQuery},
};
use serde::Serialize;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct DriftReport {
  pub consistent: bool,
  pub drift:      Vec<MonthlyDrift>,
}

/// Compare the cached monthly summaries with a fresh rollup of the daily rows.
pub async fn drift_report<S>(store: &S) -> Result<DriftReport, ApiError>
where
  S: EntityStore,
{
  let branches = store.list_branches().await.map_err(ApiError::store)?;
  let cached = store
    .list_monthly_summaries(None)
    .await
    .map_err(ApiError::store)?;
  let rows = store
    .list_daily_performance(&PerformanceQuery::default())
    .await
    .map_err(ApiError::store)?;

  let drift = monthly_drift(&branches, &cached, &rows);
  if !drift.is_empty() {
    tracing::warn!(months = drift.len(), "monthly summaries out of step with daily rows");
  }
  Ok(DriftReport {
    consistent: drift.is_empty(),
    drift,
  })
}

/// `GET /consistency/monthly`
pub async fn monthly<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<DriftReport>, ApiError>
where
  S: EntityStore,
{
  Ok(Json(drift_report(store.as_ref()).await?))
}
