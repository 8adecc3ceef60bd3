//! [`SqliteStore`] — the SQLite implementation of [`PlayerStore`].

use std::{path::Path, time::Duration};

use rusqlite::{OptionalExtension as _, TransactionBehavior};

use runboard_core::{
  player::{PlayerId, PlayerRecord, ReferralVisit},
  store::{PlayerStore, PlayerTx},
};

use crate::{
  Error, Result,
  encode::{PLAYER_COLUMNS, RawPlayer, encode_dt, encode_u64},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// How long `BEGIN IMMEDIATE` waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A player store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are executed in order on the connection's background thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }
}

// ─── Row-level helpers ───────────────────────────────────────────────────────

fn find_player(
  conn: &rusqlite::Connection,
  player_id: PlayerId,
) -> Result<Option<PlayerRecord>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1"),
      rusqlite::params![player_id.get()],
      RawPlayer::from_row,
    )
    .optional()?;

  raw.map(RawPlayer::into_record).transpose()
}

fn upsert_player(conn: &rusqlite::Connection, record: &PlayerRecord) -> Result<()> {
  let best_time      = encode_u64("best_time", record.best_time)?;
  let referral_count = encode_u64("referral_count", record.referral_count)?;

  conn.execute(
    "INSERT INTO players (
       player_id, display_name, best_time, reward_total, referral_count, last_updated
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (player_id) DO UPDATE SET
       display_name   = excluded.display_name,
       best_time      = excluded.best_time,
       reward_total   = excluded.reward_total,
       referral_count = excluded.referral_count,
       last_updated   = excluded.last_updated",
    rusqlite::params![
      record.player_id.get(),
      record.display_name,
      best_time,
      record.reward_total,
      referral_count,
      encode_dt(record.last_updated),
    ],
  )?;
  Ok(())
}

fn has_visit(
  conn: &rusqlite::Connection,
  referred: PlayerId,
  referrer: PlayerId,
) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM referral_visits WHERE referred_id = ?1 AND referrer_id = ?2",
        rusqlite::params![referred.get(), referrer.get()],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Whether `e` is a PRIMARY KEY / UNIQUE violation (as opposed to, say, a
/// foreign-key or CHECK failure).
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::ConstraintViolation
        && matches!(
          err.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
  )
}

// ─── Transaction handle ──────────────────────────────────────────────────────

/// [`PlayerTx`] over an open `BEGIN IMMEDIATE` transaction.
struct SqliteTx<'a> {
  conn: &'a rusqlite::Connection,
}

impl PlayerTx for SqliteTx<'_> {
  fn find(&mut self, player_id: PlayerId) -> runboard_core::Result<Option<PlayerRecord>> {
    Ok(find_player(self.conn, player_id)?)
  }

  fn upsert(&mut self, record: &PlayerRecord) -> runboard_core::Result<()> {
    Ok(upsert_player(self.conn, record)?)
  }

  fn has_referral_visit(
    &mut self,
    referred: PlayerId,
    referrer: PlayerId,
  ) -> runboard_core::Result<bool> {
    Ok(has_visit(self.conn, referred, referrer)?)
  }

  fn record_referral_visit(&mut self, visit: &ReferralVisit) -> runboard_core::Result<()> {
    let inserted = self.conn.execute(
      "INSERT INTO referral_visits (referred_id, referrer_id, recorded_at)
       VALUES (?1, ?2, ?3)",
      rusqlite::params![
        visit.referred_id.get(),
        visit.referrer_id.get(),
        encode_dt(visit.recorded_at),
      ],
    );

    match inserted {
      Ok(_) => Ok(()),
      Err(e) if is_unique_violation(&e) => Err(runboard_core::Error::DuplicateReferral {
        referred: visit.referred_id,
        referrer: visit.referrer_id,
      }),
      Err(e) => Err(Error::from(e).into()),
    }
  }
}

// ─── PlayerStore impl ────────────────────────────────────────────────────────

impl PlayerStore for SqliteStore {
  async fn find(&self, player_id: PlayerId) -> runboard_core::Result<Option<PlayerRecord>> {
    let record = self
      .conn
      .call(move |conn| Ok(find_player(conn, player_id)))
      .await
      .map_err(Error::from)??;
    Ok(record)
  }

  async fn run_atomically<T, F>(&self, f: F) -> runboard_core::Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn PlayerTx) -> runboard_core::Result<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = f(&mut SqliteTx { conn: &tx });
        // Dropping an uncommitted transaction rolls it back.
        if outcome.is_ok() {
          tx.commit()?;
        }
        Ok(outcome)
      })
      .await
      .map_err(Error::from)?;
    outcome
  }
}
