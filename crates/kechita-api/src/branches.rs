//! Handlers for `/branches` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/branches` | Optional `?region=` (case-insensitive) |
//! | `GET`  | `/branches/performance` | `?scope=all\|<id>&window=<label>&from=&to=` |
//! | `GET`  | `/branches/ranking` | `?from=&to=&limit=` |
//! | `GET`  | `/branches/{id}` | Branch with its officers; 404 if not found |
//! | `GET`  | `/branches/{id}/monthly` | Cached monthly summaries; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use kechita_core::{
  entity::{Branch, Officer},
  metrics::{
    BranchPerformance, BranchRanking, BranchScope, DateWindow,
    aggregate_branch_performance, rank_branches_by_collection_rate,
  },
  performance::MonthlyBranchSummary,
  store::{EntityStore, PerformanceQuery},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub region: Option<String>,
}

/// `GET /branches[?region=<region>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Branch>>, ApiError>
where
  S: EntityStore,
{
  let mut branches = store.list_branches().await.map_err(ApiError::store)?;
  if let Some(region) = params.region.as_deref() {
    branches.retain(|b| b.region.eq_ignore_ascii_case(region));
  }
  Ok(Json(branches))
}

// ─── Performance ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PerformanceParams {
  pub scope:  Option<String>,
  /// Free-form label such as `30d`. Logged only; `from`/`to` bound the rows.
  pub window: Option<String>,
  pub from:   Option<NaiveDate>,
  pub to:     Option<NaiveDate>,
}

/// `GET /branches/performance`
pub async fn performance<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<PerformanceParams>,
) -> Result<Json<Vec<BranchPerformance>>, ApiError>
where
  S: EntityStore,
{
  let scope: BranchScope = params.scope.as_deref().unwrap_or("all").parse()?;
  let window = DateWindow::new(params.from, params.to)?;
  tracing::debug!(
    scope = ?scope,
    label = params.window.as_deref().unwrap_or("all"),
    "branch performance",
  );

  let branches = store.list_branches().await.map_err(ApiError::store)?;
  if let Some(id) = scope.branch_id()
    && !branches.iter().any(|b| b.branch_id == id)
  {
    return Err(ApiError::NotFound(format!("branch {id} not found")));
  }

  let query = PerformanceQuery {
    branch_id: scope.branch_id().map(str::to_owned),
    window,
  };
  let rows = store
    .list_daily_performance(&query)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(aggregate_branch_performance(&scope, &branches, &rows, &window)))
}

// ─── Ranking ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RankingParams {
  pub from:  Option<NaiveDate>,
  pub to:    Option<NaiveDate>,
  pub limit: Option<usize>,
}

/// `GET /branches/ranking`: every branch by collection rate, best first.
pub async fn ranking<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<RankingParams>,
) -> Result<Json<Vec<BranchRanking>>, ApiError>
where
  S: EntityStore,
{
  let window = DateWindow::new(params.from, params.to)?;
  let branches = store.list_branches().await.map_err(ApiError::store)?;
  let rows = store
    .list_daily_performance(&PerformanceQuery { branch_id: None, window })
    .await
    .map_err(ApiError::store)?;

  Ok(Json(rank_branches_by_collection_rate(
    &branches,
    &rows,
    &window,
    params.limit,
  )))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BranchDetail {
  #[serde(flatten)]
  pub branch:   Branch,
  pub officers: Vec<Officer>,
}

/// `GET /branches/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<BranchDetail>, ApiError>
where
  S: EntityStore,
{
  let branch = find_branch(store.as_ref(), &id).await?;
  let officers = store
    .list_officers(Some(&id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(BranchDetail { branch, officers }))
}

// ─── Monthly ──────────────────────────────────────────────────────────────────

/// `GET /branches/{id}/monthly`: the cached summaries, oldest month first.
pub async fn monthly<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<MonthlyBranchSummary>>, ApiError>
where
  S: EntityStore,
{
  find_branch(store.as_ref(), &id).await?;
  let summaries = store
    .list_monthly_summaries(Some(&id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(summaries))
}

async fn find_branch<S>(store: &S, id: &str) -> Result<Branch, ApiError>
where
  S: EntityStore,
{
  store
    .get_branch(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("branch {id} not found")))
}
