//! SQL schema for the Runboard SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per player, created lazily and never deleted.
CREATE TABLE IF NOT EXISTS players (
    player_id      INTEGER PRIMARY KEY CHECK (player_id != 0),
    display_name   TEXT    NOT NULL DEFAULT '',
    best_time      INTEGER NOT NULL DEFAULT 0 CHECK (best_time >= 0),
    reward_total   REAL    NOT NULL DEFAULT 0 CHECK (reward_total >= 0),
    referral_count INTEGER NOT NULL DEFAULT 0 CHECK (referral_count >= 0),
    last_updated   TEXT    NOT NULL   -- RFC 3339 UTC
);

-- Dedup fence: a referral bonus is granted at most once per pair.
-- Rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS referral_visits (
    referred_id INTEGER NOT NULL REFERENCES players(player_id),
    referrer_id INTEGER NOT NULL REFERENCES players(player_id),
    recorded_at TEXT    NOT NULL,
    PRIMARY KEY (referred_id, referrer_id),
    CHECK (referred_id != referrer_id)
);

CREATE INDEX IF NOT EXISTS referral_visits_referrer_idx
    ON referral_visits(referrer_id);

PRAGMA user_version = 1;
";
