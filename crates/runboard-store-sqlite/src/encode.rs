//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Unsigned counters are stored
//! as `INTEGER` (i64) and range-checked in both directions.

use chrono::{DateTime, Utc};
use runboard_core::player::{PlayerId, PlayerRecord};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn encode_u64(column: &'static str, value: u64) -> Result<i64> {
  i64::try_from(value).map_err(|_| Error::OutOfRange {
    column,
    value: value.to_string(),
  })
}

pub fn decode_u64(column: &'static str, value: i64) -> Result<u64> {
  u64::try_from(value).map_err(|_| Error::OutOfRange {
    column,
    value: value.to_string(),
  })
}

// ─── PlayerId ────────────────────────────────────────────────────────────────

pub fn decode_player_id(raw: i64) -> Result<PlayerId> {
  PlayerId::new(raw).map_err(|e| Error::Corrupt(e.to_string()))
}

// ─── Raw row types ───────────────────────────────────────────────────────────

/// Column list matching [`RawPlayer::from_row`].
pub const PLAYER_COLUMNS: &str =
  "player_id, display_name, best_time, reward_total, referral_count, last_updated";

/// A `players` row exactly as read from SQLite.
pub struct RawPlayer {
  pub player_id:      i64,
  pub display_name:   String,
  pub best_time:      i64,
  pub reward_total:   f64,
  pub referral_count: i64,
  pub last_updated:   String,
}

impl RawPlayer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      player_id:      row.get(0)?,
      display_name:   row.get(1)?,
      best_time:      row.get(2)?,
      reward_total:   row.get(3)?,
      referral_count: row.get(4)?,
      last_updated:   row.get(5)?,
    })
  }

  pub fn into_record(self) -> Result<PlayerRecord> {
    Ok(PlayerRecord {
      player_id:      decode_player_id(self.player_id)?,
      display_name:   self.display_name,
      best_time:      decode_u64("best_time", self.best_time)?,
      reward_total:   self.reward_total,
      referral_count: decode_u64("referral_count", self.referral_count)?,
      last_updated:   decode_dt(&self.last_updated)?,
    })
  }
}
