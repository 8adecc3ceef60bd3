//! Score/reward reconciliation and referral crediting.
//!
//! A reported [`GameResult`] is merged into the player's record and, the
//! first time a referred player reports, the referrer is credited with
//! [`REFERRAL_BONUS`]. Everything for one result happens inside a single
//! [`PlayerStore::run_atomically`] call, so a failure never leaves the own
//! record updated without the referral (or the other way round).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
  Error, Result,
  player::{GameResult, PlayerId, PlayerRecord, PlayerState, ReferralVisit},
  store::{PlayerStore, PlayerTx},
};

/// Reward granted to a referrer for each distinct referred player.
pub const REFERRAL_BONUS: f64 = 0.5;

// ─── Pure merge rules ────────────────────────────────────────────────────────

/// Merge a reported time into the stored best.
///
/// `0` on either side means "no valid run" and never wins the comparison.
pub fn merge_best_time(current: u64, reported: u64) -> u64 {
  match (current, reported) {
    (0, reported) => reported,
    (current, 0) => current,
    (current, reported) => current.min(reported),
  }
}

/// Add `delta` to a reward balance, refusing a sum that is no longer finite.
pub fn add_reward(player_id: PlayerId, total: f64, delta: f64) -> Result<f64> {
  let sum = total + delta;
  if !sum.is_finite() {
    return Err(Error::validation(format!(
      "reward total for player {player_id} would overflow"
    )));
  }
  Ok(sum)
}

/// What happened to the referral half of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
  Credited,
  SelfReferral,
  UnknownReferrer,
  AlreadyCredited,
}

/// The result of [`apply_in`]: the caller's new state and, when a referrer
/// was named, what happened to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
  pub state:    PlayerState,
  pub referral: Option<ReferralOutcome>,
}

// ─── Transactional steps ─────────────────────────────────────────────────────

/// Apply `result` using an open transaction.
///
/// Callers are responsible for running this inside
/// [`PlayerStore::run_atomically`]; [`Reconciler::apply_result`] does.
pub fn apply_in(
  tx: &mut dyn PlayerTx,
  result: &GameResult,
  now: DateTime<Utc>,
) -> Result<Applied> {
  let mut record = tx
    .find(result.player_id)?
    .unwrap_or_else(|| PlayerRecord::empty(result.player_id, String::new(), now));

  record.display_name = result.display_name.clone();
  record.best_time = merge_best_time(record.best_time, result.reported_time);
  record.reward_total =
    add_reward(record.player_id, record.reward_total, result.reward_delta)?;
  record.last_updated = now;
  tx.upsert(&record)?;

  let referral = result
    .referrer_id
    .map(|referrer| credit_referrer(tx, result.player_id, referrer, now))
    .transpose()?;

  // Crediting never touches the submitting player's own row.
  Ok(Applied { state: record.state(), referral })
}

/// Credit `referrer` once for `referred`.
///
/// Self-referrals, unknown referrers and repeated pairs are no-ops rather
/// than errors.
pub fn credit_referrer(
  tx: &mut dyn PlayerTx,
  referred: PlayerId,
  referrer: PlayerId,
  now: DateTime<Utc>,
) -> Result<ReferralOutcome> {
  if referred == referrer {
    return Ok(ReferralOutcome::SelfReferral);
  }

  let Some(mut referrer_record) = tx.find(referrer)? else {
    return Ok(ReferralOutcome::UnknownReferrer);
  };

  if tx.has_referral_visit(referred, referrer)? {
    return Ok(ReferralOutcome::AlreadyCredited);
  }

  let visit = ReferralVisit {
    referred_id: referred,
    referrer_id: referrer,
    recorded_at: now,
  };
  match tx.record_referral_visit(&visit) {
    Ok(()) => {}
    Err(Error::DuplicateReferral { .. }) => {
      return Ok(ReferralOutcome::AlreadyCredited);
    }
    Err(e) => return Err(e),
  }

  referrer_record.reward_total =
    add_reward(referrer, referrer_record.reward_total, REFERRAL_BONUS)?;
  referrer_record.referral_count += 1;
  referrer_record.last_updated = now;
  tx.upsert(&referrer_record)?;

  Ok(ReferralOutcome::Credited)
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// The entry point used by the HTTP layer.
///
/// Cloning is cheap; the store is reference-counted.
#[derive(Debug)]
pub struct Reconciler<S> {
  store: Arc<S>,
}

impl<S> Clone for Reconciler<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store) }
  }
}

impl<S: PlayerStore + 'static> Reconciler<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Current state of `player_id`; the zero state if the player is unknown.
  pub async fn get_state(&self, player_id: PlayerId) -> Result<PlayerState> {
    Ok(
      self
        .store
        .find(player_id)
        .await?
        .map(|record| record.state())
        .unwrap_or_else(|| PlayerState::zero(player_id)),
    )
  }

  /// Like [`Self::get_state`], but creates an empty record for an unknown
  /// player. An existing record is not modified.
  pub async fn ensure_player(
    &self,
    player_id: PlayerId,
    display_name: Option<String>,
  ) -> Result<PlayerState> {
    let (state, created) = self
      .store
      .run_atomically(move |tx| {
        if let Some(existing) = tx.find(player_id)? {
          return Ok((existing.state(), false));
        }
        let record = PlayerRecord::empty(
          player_id,
          display_name.unwrap_or_default(),
          Utc::now(),
        );
        tx.upsert(&record)?;
        Ok((record.state(), true))
      })
      .await?;

    if created {
      debug!(%player_id, "created player record on fetch");
    }
    Ok(state)
  }

  /// Merge `result` into the store and return the submitting player's new
  /// state.
  pub async fn apply_result(&self, result: GameResult) -> Result<PlayerState> {
    let player_id = result.player_id;
    let referrer_id = result.referrer_id;

    let applied = self
      .store
      .run_atomically(move |tx| apply_in(tx, &result, Utc::now()))
      .await?;

    debug!(
      %player_id,
      best_time = applied.state.best_time,
      reward_total = applied.state.reward_total,
      "result applied"
    );

    match (applied.referral, referrer_id) {
      (Some(ReferralOutcome::Credited), Some(referrer)) => {
        info!(%player_id, %referrer, bonus = REFERRAL_BONUS, "referral bonus granted");
      }
      (Some(outcome), Some(referrer)) => {
        debug!(%player_id, %referrer, ?outcome, "referral skipped");
      }
      _ => {}
    }

    Ok(applied.state)
  }
}
