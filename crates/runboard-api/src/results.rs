//! Handler for `POST /results`.
//!
//! Body:
//!
//! ```json
//! { "player_id": 42, "display_name": "alice", "time": 90, "reward": 2,
//!   "referrer_id": "7" }
//! ```
//!
//! `display_name` and `referrer_id` are optional. Numeric fields may be
//! numbers or numeric strings.

use axum::{Json, extract::State};
use runboard_core::{
  player::{GameResult, PlayerState},
  store::PlayerStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  ApiState,
  error::ApiError,
  fields::{int_field, number_field, optional_int_field},
};

/// JSON body accepted by `POST /results`.
#[derive(Debug, Deserialize)]
pub struct ResultBody {
  /// Missing required fields read as `null` and fail validation as 400s.
  #[serde(default)]
  pub player_id:    Value,
  pub display_name: Option<String>,
  #[serde(default)]
  pub time:         Value,
  #[serde(default)]
  pub reward:       Value,
  #[serde(default)]
  pub referrer_id:  Option<Value>,
}

impl TryFrom<ResultBody> for GameResult {
  type Error = ApiError;

  fn try_from(b: ResultBody) -> Result<Self, ApiError> {
    Ok(GameResult::new(
      int_field("player_id", &b.player_id)?,
      b.display_name.unwrap_or_default(),
      int_field("time", &b.time)?,
      number_field("reward", &b.reward)?,
      optional_int_field("referrer_id", b.referrer_id.as_ref())?,
    )?)
  }
}

/// `POST /results` — returns the submitting player's updated state.
pub async fn submit<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<ResultBody>,
) -> Result<Json<PlayerState>, ApiError>
where
  S: PlayerStore + Clone + 'static,
{
  let result = GameResult::try_from(body)?;
  let player = state.reconciler.apply_result(result).await?;
  Ok(Json(player))
}
