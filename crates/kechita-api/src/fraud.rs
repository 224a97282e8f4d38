//! Handler for `GET /fraud-cases`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use kechita_core::{
  metrics::{FraudCase, filter_fraud_cases},
  risk::RiskBand,
  store::{CustomerQuery, EntityStore},
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FraudParams {
  /// `all`, `high`, `medium` or `low`. Absent means `all`.
  pub risk: Option<String>,
}

/// `GET /fraud-cases[?risk=all|high|medium|low]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<FraudParams>,
) -> Result<Json<Vec<FraudCase>>, ApiError>
where
  S: EntityStore,
{
  let band = RiskBand::parse_filter(params.risk.as_deref().unwrap_or_default())?;
  tracing::debug!(band = ?band, "listing fraud cases");

  let customers = store
    .list_customers(&CustomerQuery::default())
    .await
    .map_err(ApiError::store)?;
  let features = store.list_ai_features().await.map_err(ApiError::store)?;

  Ok(Json(filter_fraud_cases(&customers, &features, band)))
}
