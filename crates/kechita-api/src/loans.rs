//! Handlers for `/loans` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/loans` | `?customer_id=&branch_id=&status=active\|completed\|defaulted\|written_off` |
//! | `GET`  | `/loans/{id}` | Loan with repayments, oldest first; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kechita_core::{
  loan::{Loan, LoanStatus, Repayment},
  store::{EntityStore, LoanQuery},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub customer_id: Option<String>,
  pub branch_id:   Option<String>,
  pub status:      Option<String>,
}

/// `GET /loans`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Loan>>, ApiError>
where
  S: EntityStore,
{
  let status = params.status.map(LoanStatus::try_from).transpose()?;
  let query = LoanQuery {
    customer_id: params.customer_id,
    branch_id:   params.branch_id,
    status,
  };
  let loans = store.list_loans(&query).await.map_err(ApiError::store)?;
  Ok(Json(loans))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct LoanDetail {
  #[serde(flatten)]
  pub loan:         Loan,
  pub repayments:   Vec<Repayment>,
  pub total_repaid: Decimal,
  /// Principal not yet covered by repayments, floored at zero.
  pub outstanding:  Decimal,
}

/// `GET /loans/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<LoanDetail>, ApiError>
where
  S: EntityStore,
{
  let loan = store
    .get_loan(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("loan {id} not found")))?;
  let repayments = store.list_repayments(&id).await.map_err(ApiError::store)?;

  let total_repaid: Decimal = repayments.iter().map(|r| r.amount_paid).sum();
  let outstanding = (loan.amount - total_repaid).max(Decimal::ZERO);

  Ok(Json(LoanDetail {
    loan,
    repayments,
    total_repaid,
    outstanding,
  }))
}
