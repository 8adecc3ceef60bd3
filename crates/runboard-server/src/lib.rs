//! HTTP server wiring for Runboard.
//!
//! Mounts the JSON API under `/api`, adds a health probe and request
//! tracing, and loads [`ServerConfig`] from a TOML file plus `RUNBOARD_*`
//! environment variables, falling back to the platform's `PORT`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use runboard_api::ApiOptions;
use runboard_core::store::PlayerStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  /// Create a player's record on first fetch instead of on first result.
  #[serde(default)]
  pub create_on_fetch: bool,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_port() -> u16 { 5000 }

fn default_store_path() -> PathBuf { PathBuf::from("runboard.db") }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            default_host(),
      port:            default_port(),
      store_path:      default_store_path(),
      create_on_fetch: false,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn api_options(&self) -> ApiOptions {
    ApiOptions { create_on_fetch: self.create_on_fetch }
  }
}

/// Read `path` (optional) and overlay `RUNBOARD_*` environment variables.
///
/// A plain `PORT` variable, as set by most hosting platforms, replaces the
/// built-in default port but loses to the file and `RUNBOARD_PORT`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  load_config_with_port(path, std::env::var("PORT").ok())
}

fn load_config_with_port(
  path: &Path,
  platform_port: Option<String>,
) -> Result<ServerConfig, config::ConfigError> {
  let mut builder = config::Config::builder();
  if let Some(raw) = platform_port {
    let port: u16 = raw.trim().parse().map_err(|_| {
      config::ConfigError::Message(format!("PORT must be a port number, got {raw:?}"))
    })?;
    builder = builder.set_default("port", i64::from(port))?;
  }
  builder
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("RUNBOARD").try_parsing(true))
    .build()?
    .try_deserialize()
}

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

// ─── Router ───────────────────────────────────────────────────────────────────

async fn health() -> &'static str { "ok" }

/// Build the full application router for `store`.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> Router
where
  S: PlayerStore + Clone + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", runboard_api::api_router(store, config.api_options()))
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
