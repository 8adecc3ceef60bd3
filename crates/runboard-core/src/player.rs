//! Player records, referral visits and the result input type.
//!
//! A player record is created lazily the first time the player reports a
//! result (or is fetched in fetch-creates mode) and is never deleted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Stable player identifier; the Telegram user id for mini-app players.
///
/// Zero is never a valid id. Use [`PlayerId::new`] to validate untrusted
/// input.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(i64);

impl PlayerId {
  pub fn new(raw: i64) -> Result<Self> {
    if raw == 0 {
      return Err(Error::validation("player id must be non-zero"));
    }
    Ok(Self(raw))
  }

  pub fn get(self) -> i64 { self.0 }
}

impl fmt::Display for PlayerId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// The persisted aggregate for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
  pub player_id:      PlayerId,
  /// Last-seen label; overwritten on every update.
  pub display_name:   String,
  /// Smallest positive duration ever reported. `0` means "never played".
  pub best_time:      u64,
  pub reward_total:   f64,
  /// Number of distinct referred players credited to this player.
  pub referral_count: u64,
  pub last_updated:   DateTime<Utc>,
}

impl PlayerRecord {
  /// A record that has never played, as if created at `now`.
  pub fn empty(player_id: PlayerId, display_name: String, now: DateTime<Utc>) -> Self {
    Self {
      player_id,
      display_name,
      best_time: 0,
      reward_total: 0.0,
      referral_count: 0,
      last_updated: now,
    }
  }

  pub fn state(&self) -> PlayerState {
    PlayerState {
      player_id:      self.player_id,
      best_time:      self.best_time,
      reward_total:   self.reward_total,
      referral_count: self.referral_count,
    }
  }
}

/// Dedup fence: at most one row per `(referred, referrer)` pair.
/// Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralVisit {
  pub referred_id: PlayerId,
  pub referrer_id: PlayerId,
  pub recorded_at: DateTime<Utc>,
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// What callers see of a player. Unknown players report the zero state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
  pub player_id:      PlayerId,
  pub best_time:      u64,
  pub reward_total:   f64,
  pub referral_count: u64,
}

impl PlayerState {
  pub fn zero(player_id: PlayerId) -> Self {
    Self {
      player_id,
      best_time: 0,
      reward_total: 0.0,
      referral_count: 0,
    }
  }
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// A validated game outcome, the input to
/// [`crate::reconcile::Reconciler::apply_result`].
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
  pub player_id:     PlayerId,
  pub display_name:  String,
  pub reported_time: u64,
  pub reward_delta:  f64,
  pub referrer_id:   Option<PlayerId>,
}

impl GameResult {
  /// Validate raw values. A zero `referrer_id` is treated as absent.
  pub fn new(
    player_id: i64,
    display_name: impl Into<String>,
    reported_time: i64,
    reward_delta: f64,
    referrer_id: Option<i64>,
  ) -> Result<Self> {
    let player_id = PlayerId::new(player_id)?;

    let reported_time = u64::try_from(reported_time).map_err(|_| {
      Error::validation(format!("time must be non-negative, got {reported_time}"))
    })?;

    if !reward_delta.is_finite() || reward_delta < 0.0 {
      return Err(Error::validation(format!(
        "reward must be a non-negative number, got {reward_delta}"
      )));
    }

    let referrer_id = referrer_id
      .filter(|&r| r != 0)
      .map(PlayerId::new)
      .transpose()?;

    Ok(Self {
      player_id,
      display_name: display_name.into(),
      reported_time,
      reward_delta,
      referrer_id,
    })
  }
}
