//! Handler for `GET /officers/leaderboard`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use kechita_core::{
  metrics::{OfficerStanding, officer_leaderboard},
  store::EntityStore,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
  pub branch_id: Option<String>,
}

/// `GET /officers/leaderboard[?branch_id=<id>]`
pub async fn leaderboard<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<LeaderboardParams>,
) -> Result<Json<Vec<OfficerStanding>>, ApiError>
where
  S: EntityStore,
{
  let branch_id = params.branch_id.as_deref();
  let officers = store
    .list_officers(branch_id)
    .await
    .map_err(ApiError::store)?;
  let performance = store
    .list_officer_performance(branch_id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(officer_leaderboard(&officers, &performance)))
}
