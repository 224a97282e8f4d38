//! Handlers for `/customers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/customers` | `?branch_id=&region=&q=&limit=&offset=` |
//! | `GET`  | `/customers/{id}` | Enriched with risk data and loan totals; 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use kechita_core::{
  entity::Customer,
  loan::LoanStatus,
  risk::{AiCustomerFeatures, FraudSignal, RiskBand},
  store::{CustomerQuery, EntityStore, LoanQuery},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE: usize = 100;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub branch_id: Option<String>,
  pub region:    Option<String>,
  /// Substring matched against id, names, phone and national id.
  pub q:         Option<String>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

/// `GET /customers`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, ApiError>
where
  S: EntityStore,
{
  let query = CustomerQuery {
    branch_id: params.branch_id,
    region:    params.region,
    text:      params.q.filter(|q| !q.trim().is_empty()),
    limit:     Some(params.limit.unwrap_or(DEFAULT_PAGE)),
    offset:    params.offset,
  };
  tracing::debug!(?query, "customer lookup");

  let customers = store
    .list_customers(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(customers))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CustomerDetail {
  #[serde(flatten)]
  pub customer:         Customer,
  pub full_name:        String,
  pub features:         Option<AiCustomerFeatures>,
  pub risk_band:        Option<RiskBand>,
  pub fraud_signal:     Option<FraudSignal>,
  pub fraud_indicators: usize,
  pub loan_count:       usize,
  pub active_loans:     usize,
  pub defaulted_loans:  usize,
  pub total_borrowed:   Decimal,
}

/// `GET /customers/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<String>,
) -> Result<Json<CustomerDetail>, ApiError>
where
  S: EntityStore,
{
  let customer = store
    .get_customer(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("customer {id} not found")))?;

  let features = store.get_ai_features(&id).await.map_err(ApiError::store)?;
  let fraud_signal = store.get_fraud_signal(&id).await.map_err(ApiError::store)?;
  let loans = store
    .list_loans(&LoanQuery {
      customer_id: Some(id.clone()),
      ..LoanQuery::default()
    })
    .await
    .map_err(ApiError::store)?;

  let count = |status: LoanStatus| loans.iter().filter(|l| l.status == status).count();

  Ok(Json(CustomerDetail {
    full_name:        customer.full_name(),
    risk_band:        features.as_ref().map(AiCustomerFeatures::band),
    fraud_indicators: fraud_signal.as_ref().map_or(0, FraudSignal::indicator_count),
    loan_count:       loans.len(),
    active_loans:     count(LoanStatus::Active),
    defaulted_loans:  count(LoanStatus::Defaulted) + count(LoanStatus::WrittenOff),
    total_borrowed:   loans.iter().map(|l| l.amount).sum(),
    customer,
    features,
    fraud_signal,
  }))
}
