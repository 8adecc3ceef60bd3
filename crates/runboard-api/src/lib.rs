//! JSON REST API for Runboard.
//!
//! Exposes an axum [`Router`] backed by any
//! [`runboard_core::store::PlayerStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", runboard_api::api_router(store.clone(), options))
//! ```

pub mod error;
pub mod fields;
pub mod players;
pub mod results;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use runboard_core::{Reconciler, store::PlayerStore};

pub use error::ApiError;

/// Behavioural switches for the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiOptions {
  /// Create a player's record the first time it is fetched.
  pub create_on_fetch: bool,
}

/// Shared state threaded through the API handlers.
#[derive(Debug, Clone)]
pub struct ApiState<S> {
  pub reconciler:      Reconciler<S>,
  pub create_on_fetch: bool,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, options: ApiOptions) -> Router<()>
where
  S: PlayerStore + Clone + 'static,
{
  let state = ApiState {
    reconciler:      Reconciler::new(store),
    create_on_fetch: options.create_on_fetch,
  };

  Router::new()
    .route("/players/{id}", get(players::get_one::<S>))
    .route("/results", post(results::submit::<S>))
    .with_state(state)
}
