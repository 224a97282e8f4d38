//! JSON REST API for the Kechita dashboard.
//!
//! Exposes an axum [`Router`] backed by any
//! [`kechita_core::store::EntityStore`]. Handlers validate their parameters,
//! read rows through the store and hand them to the aggregation engine in
//! [`kechita_core::metrics`]. Auth, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", kechita_api::api_router(store.clone(), insights.clone()))
//! ```

pub mod branches;
pub mod consistency;
pub mod customers;
pub mod dashboard;
pub mod error;
pub mod fraud;
pub mod insights;
pub mod loans;
pub mod officers;
pub mod regions;
pub mod trends;

use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, post},
};
use kechita_core::store::EntityStore;

pub use error::ApiError;
pub use insights::{InsightsClient, InsightsConfig};

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through the handlers. Store-only handlers extract
/// `State<Arc<S>>`; the insights handler takes the whole `State<ApiState<S>>`.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub insights: Arc<InsightsClient>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      insights: Arc::clone(&self.insights),
    }
  }
}

impl<S> FromRef<ApiState<S>> for Arc<S> {
  fn from_ref(state: &ApiState<S>) -> Self { Arc::clone(&state.store) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, insights: Arc<InsightsClient>) -> Router<()>
where
  S: EntityStore + 'static,
{
  Router::new()
    // Overview
    .route("/dashboard", get(dashboard::summary::<S>))
    .route("/regions", get(regions::list::<S>))
    .route("/fraud-cases", get(fraud::list::<S>))
    // Branches
    .route("/branches", get(branches::list::<S>))
    .route("/branches/performance", get(branches::performance::<S>))
    .route("/branches/ranking", get(branches::ranking::<S>))
    .route("/branches/{id}", get(branches::get_one::<S>))
    .route("/branches/{id}/monthly", get(branches::monthly::<S>))
    // Customers and loans
    .route("/customers", get(customers::list::<S>))
    .route("/customers/{id}", get(customers::get_one::<S>))
    .route("/loans", get(loans::list::<S>))
    .route("/loans/{id}", get(loans::get_one::<S>))
    // Analytics
    .route("/trends", get(trends::handler::<S>))
    .route("/officers/leaderboard", get(officers::leaderboard::<S>))
    .route("/consistency/monthly", get(consistency::monthly::<S>))
    .route("/insights", post(insights::handler::<S>))
    .with_state(ApiState { store, insights })
}
