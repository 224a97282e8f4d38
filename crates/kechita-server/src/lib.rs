//! HTTP server and bulk loader for the Kechita dashboard.
//!
//! Mounts the [`kechita_api`] router under `/api` next to a `/health`
//! check, and reads snapshot directories for the `load` command.

pub mod dataset;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Json, Router, routing::get};
use kechita_api::{InsightsClient, InsightsConfig, api_router};
use kechita_core::{load::DEFAULT_BATCH_SIZE, store::EntityStore};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_store_path() -> PathBuf { PathBuf::from("kechita.db") }
fn default_batch_size() -> usize { DEFAULT_BATCH_SIZE }

/// Runtime configuration, deserialised from `config.toml` and `KECHITA_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  #[serde(default)]
  pub insights:   InsightsConfig,
}

impl ServerConfig {
  /// Layer the optional config file under the environment.
  pub fn load(file: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("KECHITA")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: `/health` plus the JSON API under `/api`.
pub fn router<S>(store: Arc<S>, insights: Arc<InsightsClient>) -> Router
where
  S: EntityStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", api_router(store, insights))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use kechita_core::load::{LoadOptions, load_dataset};
  use kechita_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn app() -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let insights = InsightsClient::disabled().unwrap();
    router(Arc::new(store), Arc::new(insights))
  }

  async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
  }

  #[tokio::test]
  async fn health_is_ok() {
    let (status, body) = get_json(app().await, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
  }

  #[tokio::test]
  async fn api_is_nested_and_empty_store_yields_zeroes() {
    let (status, body) = get_json(app().await, "/api/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collection_rate"].as_f64(), Some(0.0));
    assert_eq!(body["active_loans"], 0);
    assert_eq!(body["top_branches"], json!([]));

    let (status, body) = get_json(app().await, "/api/regions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
  }

  #[tokio::test]
  async fn unknown_routes_are_404() {
    let (status, _) = get_json(app().await, "/api/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn csv_directory_replaces_store_contents() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let dir = std::env::temp_dir().join(format!("kechita-load-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
      dir.join("branches.csv"),
      "branch_id,branch_name,region,urban_rural,staff_count,avg_target_tier,latitude,longitude\n\
       BR001,Soko Hub 1,Coast,Rural,9,C,-4.05,39.66\n\
       BR002,Unity Plaza 2,Nyanza,Urban,14,B,-0.09,34.77\n",
    )
    .unwrap();

    let dataset = dataset::read_dataset(&dir).await.unwrap();
    let report = load_dataset(&store, dataset, LoadOptions::default())
      .await
      .unwrap();
    assert_eq!(report.total_rows(), 2);

    let insights = InsightsClient::disabled().unwrap();
    let app = router(Arc::new(store), Arc::new(insights));
    let (_, body) = get_json(app, "/api/regions").await;
    let regions: Vec<_> = body
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["region"].as_str().unwrap().to_string())
      .collect();
    assert_eq!(regions, ["Coast", "Nyanza"]);

    std::fs::remove_dir_all(dir).ok();
  }

  #[test]
  fn missing_config_file_uses_defaults() {
    let path = std::env::temp_dir().join("kechita-no-such-config.toml");
    let config = ServerConfig::load(&path).unwrap();
    assert_eq!(config.port, 8000);
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.insights.model, "gpt-4o-mini");
  }

  #[test]
  fn config_file_overrides_defaults() {
    let path = std::env::temp_dir()
      .join(format!("kechita-config-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
      &path,
      "port = 9100\nbatch_size = 250\n\n[insights]\nmodel = \"gpt-4o\"\ntimeout_secs = 5\n",
    )
    .unwrap();

    let config = ServerConfig::load(&path).unwrap();
    assert_eq!(config.port, 9100);
    assert_eq!(config.batch_size, 250);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.insights.model, "gpt-4o");
    assert_eq!(config.insights.timeout_secs, 5);
    assert!(config.insights.api_key.is_none());

    std::fs::remove_file(path).ok();
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/data/kechita.db")),
      PathBuf::from(home).join("data/kechita.db"),
    );
    assert_eq!(expand_tilde(Path::new("/srv/kechita.db")), PathBuf::from("/srv/kechita.db"));
  }
}
