//! The `PlayerStore` and `PlayerTx` traits.
//!
//! Implemented by storage backends (e.g. `runboard-store-sqlite`). The
//! reconciler and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  Result,
  player::{PlayerId, PlayerRecord, ReferralVisit},
};

// ─── Transaction ─────────────────────────────────────────────────────────────

/// Operations available inside a single store transaction.
///
/// Implementations are handed out by [`PlayerStore::run_atomically`] and are
/// only valid for the duration of that call.
pub trait PlayerTx {
  fn find(&mut self, player_id: PlayerId) -> Result<Option<PlayerRecord>>;

  /// Insert or fully replace the mutable fields of `record` in one
  /// statement.
  fn upsert(&mut self, record: &PlayerRecord) -> Result<()>;

  fn has_referral_visit(
    &mut self,
    referred: PlayerId,
    referrer: PlayerId,
  ) -> Result<bool>;

  /// Insert the dedup fence row.
  ///
  /// Must fail with [`crate::Error::DuplicateReferral`] if the pair is
  /// already present; the check is a storage-level uniqueness constraint,
  /// not a prior read.
  fn record_referral_visit(&mut self, visit: &ReferralVisit) -> Result<()>;
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Abstraction over a player store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PlayerStore: Send + Sync {
  /// Read a single record outside of any transaction.
  fn find(
    &self,
    player_id: PlayerId,
  ) -> impl Future<Output = Result<Option<PlayerRecord>>> + Send + '_;

  /// Run `f` inside one transaction.
  ///
  /// The transaction commits if `f` returns `Ok` and rolls back otherwise,
  /// including when the commit itself fails. Either way no partial state is
  /// ever visible to other callers.
  fn run_atomically<T, F>(
    &self,
    f: F,
  ) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn PlayerTx) -> Result<T> + Send + 'static;
}
