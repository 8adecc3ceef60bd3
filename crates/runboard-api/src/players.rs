//! Handler for `GET /players/{id}`.
//!
//! Returns the player's [`PlayerState`]. Unknown players get the zero state;
//! in fetch-creates mode their record is created first, using `?name=` as
//! the display name.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use runboard_core::{
  player::{PlayerId, PlayerState},
  store::PlayerStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{ApiState, error::ApiError, fields::int_field};

#[derive(Debug, Deserialize)]
pub struct FetchParams {
  pub name: Option<String>,
}

/// `GET /players/{id}[?name=<display name>]`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(raw_id): Path<String>,
  Query(params): Query<FetchParams>,
) -> Result<Json<PlayerState>, ApiError>
where
  S: PlayerStore + Clone + 'static,
{
  let player_id = PlayerId::new(int_field("player_id", &Value::String(raw_id))?)?;

  let player = if state.create_on_fetch {
    state.reconciler.ensure_player(player_id, params.name).await?
  } else {
    state.reconciler.get_state(player_id).await?
  };
  Ok(Json(player))
}
