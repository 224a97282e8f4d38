//! `POST /insights`: a question answered by an external chat-completion
//! model, grounded in the current dashboard figures.
//!
//! The endpoint never fails because of the upstream service. With no API key
//! configured, or on any upstream error, the reply is a canned message built
//! from the same figures, marked `"source": "fallback"`.

use std::time::Duration;

use axum::{Json, extract::State};
use kechita_core::{metrics::DashboardSummary, store::EntityStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::{ApiState, dashboard::load_summary, error::ApiError};

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_model() -> String { "gpt-4o-mini".to_string() }
fn default_timeout_secs() -> u64 { 20 }

/// Upstream model settings. Every field has a default so the whole section
/// may be omitted from the configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
  #[serde(default)]
  pub api_key:      Option<String>,
  #[serde(default = "default_endpoint")]
  pub endpoint:     String,
  #[serde(default = "default_model")]
  pub model:        String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for InsightsConfig {
  fn default() -> Self {
    Self {
      api_key:      None,
      endpoint:     default_endpoint(),
      model:        default_model(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InsightsError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("upstream returned {0}")]
  Status(reqwest::StatusCode),

  #[error("upstream reply had no content")]
  EmptyReply,
}

#[derive(Deserialize)]
struct Completion {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: Message,
}

#[derive(Deserialize)]
struct Message {
  content: Option<String>,
}

/// Thin wrapper over [`reqwest::Client`] for one chat-completion endpoint.
pub struct InsightsClient {
  client: Client,
  config: InsightsConfig,
}

impl InsightsClient {
  pub fn new(config: InsightsConfig) -> Result<Self, InsightsError> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  /// A client that always answers with the fallback.
  pub fn disabled() -> Result<Self, InsightsError> { Self::new(InsightsConfig::default()) }

  pub fn is_enabled(&self) -> bool {
    self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
  }

  /// Ask the model; `None` when no key is configured.
  pub async fn ask(
    &self,
    context: &str,
    question: &str,
  ) -> Option<Result<String, InsightsError>> {
    let key = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
    Some(self.complete(key, context, question).await)
  }

  async fn complete(
    &self,
    key: &str,
    context: &str,
    question: &str,
  ) -> Result<String, InsightsError> {
    let body = json!({
      "model": self.config.model,
      "messages": [
        { "role": "system", "content": context },
        { "role": "user", "content": question },
      ],
    });
    let resp = self
      .client
      .post(&self.config.endpoint)
      .bearer_auth(key)
      .json(&body)
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(InsightsError::Status(resp.status()));
    }
    let completion: Completion = resp.json().await?;
    completion
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .map(|c| c.trim().to_string())
      .filter(|c| !c.is_empty())
      .ok_or(InsightsError::EmptyReply)
  }
}

// ─── Handler ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InsightsRequest {
  pub question: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
  Model,
  Fallback,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsightsReply {
  pub answer: String,
  pub source: AnswerSource,
}

/// `POST /insights` with `{"question": "..."}`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<InsightsRequest>,
) -> Result<Json<InsightsReply>, ApiError>
where
  S: EntityStore,
{
  let question = body.question.trim();
  if question.is_empty() {
    return Err(ApiError::BadRequest("question must not be empty".to_string()));
  }

  let summary = load_summary(state.store.as_ref()).await?;
  let context = context_for(&summary);

  let reply = match state.insights.ask(&context, question).await {
    Some(Ok(answer)) => InsightsReply {
      answer,
      source: AnswerSource::Model,
    },
    Some(Err(e)) => {
      tracing::warn!(error = %e, "insights upstream failed; answering with fallback");
      fallback(&summary)
    }
    None => {
      tracing::debug!("no insights API key configured");
      fallback(&summary)
    }
  };
  Ok(Json(reply))
}

pub(crate) fn context_for(summary: &DashboardSummary) -> String {
  let mut context = format!(
    "You are an analyst for a microfinance lender in Kenya. Current portfolio: \
     {} active loans to {} customers, KSh {} disbursed on active loans, \
     collection rate {:.1}%, average PAR {:.2}%, KSh {} in new arrears.",
    summary.active_loans,
    summary.active_customers,
    summary.total_disbursed,
    summary.collection_rate,
    summary.par_rate,
    summary.total_arrears,
  );
  if !summary.top_branches.is_empty() {
    let top: Vec<String> = summary
      .top_branches
      .iter()
      .take(3)
      .map(|b| format!("{} ({:.1}%)", b.branch_name, b.collection_rate))
      .collect();
    context.push_str(&format!(" Best collecting branches: {}.", top.join(", ")));
  }
  context.push_str(&format!(
    " {} customers are on the medium-or-higher risk alert list (score 40 \
     and up). Answer briefly.",
    summary.alerts.len()
  ));
  context
}

fn fallback(summary: &DashboardSummary) -> InsightsReply {
  InsightsReply {
    answer: format!(
      "AI insights are unavailable right now. Headline figures: collection \
       rate {:.1}%, PAR {:.2}%, {} active loans, {} customers flagged for \
       review.",
      summary.collection_rate,
      summary.par_rate,
      summary.active_loans,
      summary.alerts.len(),
    ),
    source: AnswerSource::Fallback,
  }
}
