//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use chrono::Utc;
use runboard_core::{
  Error as CoreError, REFERRAL_BONUS, Reconciler,
  player::{GameResult, PlayerId, PlayerRecord, PlayerState, ReferralVisit},
  store::PlayerStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn id(raw: i64) -> PlayerId { PlayerId::new(raw).unwrap() }

fn result(player: i64, time: i64, reward: f64, referrer: Option<i64>) -> GameResult {
  GameResult::new(player, format!("player-{player}"), time, reward, referrer).unwrap()
}

async fn visit_count(s: &SqliteStore) -> i64 {
  s.connection()
    .call(|conn| {
      Ok(conn.query_row("SELECT COUNT(*) FROM referral_visits", [], |r| r.get::<_, i64>(0))?)
    })
    .await
    .unwrap()
}

// ─── Player rows ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_missing_returns_none() {
  let s = store().await;
  assert!(s.find(id(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_inserts_then_replaces() {
  let s = store().await;
  let mut record = PlayerRecord::empty(id(42), "alice".into(), Utc::now());
  record.best_time = 120;
  record.reward_total = 3.0;

  let to_insert = record.clone();
  s.run_atomically(move |tx| tx.upsert(&to_insert)).await.unwrap();

  let fetched = s.find(id(42)).await.unwrap().unwrap();
  assert_eq!(fetched.display_name, "alice");
  assert_eq!(fetched.best_time, 120);
  assert_eq!(fetched.reward_total, 3.0);
  assert_eq!(fetched.last_updated.timestamp(), record.last_updated.timestamp());

  record.display_name = "alice2".into();
  record.referral_count = 4;
  s.run_atomically(move |tx| tx.upsert(&record)).await.unwrap();

  let fetched = s.find(id(42)).await.unwrap().unwrap();
  assert_eq!(fetched.display_name, "alice2");
  assert_eq!(fetched.referral_count, 4);
}

#[tokio::test]
async fn negative_player_ids_are_valid() {
  // Telegram group chats use negative ids.
  let s = store().await;
  let r = Reconciler::new(Arc::new(s));
  r.apply_result(result(-1001, 30, 1.0, None)).await.unwrap();
  assert_eq!(r.get_state(id(-1001)).await.unwrap().best_time, 30);
}

// ─── Referral fence ──────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_visit_is_reported_as_duplicate() {
  let s = store().await;
  let now = Utc::now();

  let err = s
    .run_atomically(move |tx| {
      tx.upsert(&PlayerRecord::empty(id(7), String::new(), now))?;
      tx.upsert(&PlayerRecord::empty(id(42), String::new(), now))?;
      let visit = ReferralVisit { referred_id: id(7), referrer_id: id(42), recorded_at: now };
      tx.record_referral_visit(&visit)?;
      assert!(tx.has_referral_visit(id(7), id(42))?);
      assert!(!tx.has_referral_visit(id(42), id(7))?);
      tx.record_referral_visit(&visit)
    })
    .await
    .unwrap_err();

  assert!(matches!(
    err,
    CoreError::DuplicateReferral { referred, referrer }
      if referred == id(7) && referrer == id(42)
  ));
}

#[tokio::test]
async fn visit_for_unknown_player_is_a_persistence_error() {
  let s = store().await;
  let now = Utc::now();

  let err = s
    .run_atomically(move |tx| {
      tx.record_referral_visit(&ReferralVisit {
        referred_id: id(7),
        referrer_id: id(42),
        recorded_at: now,
      })
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Persistence(_)));
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn error_in_closure_rolls_back() {
  let s = store().await;

  let err = s
    .run_atomically(|tx| {
      tx.upsert(&PlayerRecord::empty(id(5), "five".into(), Utc::now()))?;
      Err::<(), _>(CoreError::validation("abort"))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Validation(_)));

  assert!(s.find(id(5)).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_referral_insert_rolls_back_own_record() {
  let s = store().await;
  let r = Reconciler::new(Arc::new(s.clone()));
  r.apply_result(result(42, 100, 1.0, None)).await.unwrap();

  s.connection()
    .call(|conn| {
      conn.execute_batch(
        "CREATE TRIGGER fail_visits BEFORE INSERT ON referral_visits
         BEGIN SELECT RAISE(ABORT, 'visits unavailable'); END;",
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = r.apply_result(result(7, 60, 2.0, Some(42))).await.unwrap_err();
  assert!(matches!(err, CoreError::Persistence(_)));

  // Neither the referred player's row nor the referrer's credit survived.
  assert!(s.find(id(7)).await.unwrap().is_none());
  let referrer = r.get_state(id(42)).await.unwrap();
  assert_eq!(referrer.reward_total, 1.0);
  assert_eq!(referrer.referral_count, 0);
}

// ─── Reconciliation end to end ───────────────────────────────────────────────

#[tokio::test]
async fn scenario_best_time_and_rewards() {
  let r = Reconciler::new(Arc::new(store().await));

  let state = r.apply_result(result(42, 120, 3.0, None)).await.unwrap();
  assert_eq!((state.best_time, state.reward_total), (120, 3.0));

  let state = r.apply_result(result(42, 90, 2.0, None)).await.unwrap();
  assert_eq!((state.best_time, state.reward_total), (90, 5.0));

  let state = r.apply_result(result(42, 150, 0.0, None)).await.unwrap();
  assert_eq!(state.best_time, 90);
}

#[tokio::test]
async fn scenario_referral_credited_once() {
  let s = store().await;
  let r = Reconciler::new(Arc::new(s.clone()));
  r.apply_result(result(42, 100, 0.0, None)).await.unwrap();

  r.apply_result(result(7, 80, 1.0, Some(42))).await.unwrap();
  let after_first = r.get_state(id(42)).await.unwrap();
  assert_eq!(after_first.reward_total, REFERRAL_BONUS);
  assert_eq!(after_first.referral_count, 1);

  r.apply_result(result(7, 70, 1.0, Some(42))).await.unwrap();
  assert_eq!(r.get_state(id(42)).await.unwrap(), after_first);
  assert_eq!(visit_count(&s).await, 1);

  let referred = r.get_state(id(7)).await.unwrap();
  assert_eq!((referred.best_time, referred.reward_total), (70, 2.0));
}

#[tokio::test]
async fn concurrent_first_referrals_credit_once() {
  let s = store().await;
  let r = Reconciler::new(Arc::new(s.clone()));
  r.apply_result(result(42, 100, 0.0, None)).await.unwrap();

  let tasks: Vec<_> = (0..8)
    .map(|_| {
      let r = r.clone();
      tokio::spawn(async move { r.apply_result(result(7, 60, 1.0, Some(42))).await })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  let referrer = r.get_state(id(42)).await.unwrap();
  assert_eq!(referrer.reward_total, REFERRAL_BONUS);
  assert_eq!(referrer.referral_count, 1);
  assert_eq!(r.get_state(id(7)).await.unwrap().reward_total, 8.0);
  assert_eq!(visit_count(&s).await, 1);
}

#[tokio::test]
async fn concurrent_referrals_across_connections_credit_once() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("runboard.db");

  // Separate connections contend on the file's write lock and the fence.
  let a = SqliteStore::open(&path).await.unwrap();
  let b = SqliteStore::open(&path).await.unwrap();
  let ra = Reconciler::new(Arc::new(a.clone()));
  let rb = Reconciler::new(Arc::new(b));
  ra.apply_result(result(42, 100, 0.0, None)).await.unwrap();

  let tasks: Vec<_> = (0..8)
    .map(|i| {
      let r = if i % 2 == 0 { ra.clone() } else { rb.clone() };
      tokio::spawn(async move { r.apply_result(result(7, 60, 1.0, Some(42))).await })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap();
  }

  for r in [&ra, &rb] {
    let referrer = r.get_state(id(42)).await.unwrap();
    assert_eq!(referrer.reward_total, REFERRAL_BONUS);
    assert_eq!(referrer.referral_count, 1);
    assert_eq!(r.get_state(id(7)).await.unwrap().reward_total, 8.0);
  }
  assert_eq!(visit_count(&a).await, 1);
}

#[tokio::test]
async fn self_and_unknown_referrers_write_no_fence() {
  let s = store().await;
  let r = Reconciler::new(Arc::new(s.clone()));

  r.apply_result(result(7, 60, 1.0, Some(7))).await.unwrap();
  r.apply_result(result(7, 60, 1.0, Some(999))).await.unwrap();

  assert_eq!(r.get_state(id(7)).await.unwrap().referral_count, 0);
  assert_eq!(r.get_state(id(999)).await.unwrap(), PlayerState::zero(id(999)));
  assert_eq!(visit_count(&s).await, 0);
}

#[tokio::test]
async fn ensure_player_creates_row_once() {
  let s = store().await;
  let r = Reconciler::new(Arc::new(s.clone()));

  r.ensure_player(id(9), Some("nine".into())).await.unwrap();
  let created = s.find(id(9)).await.unwrap().unwrap();
  assert_eq!(created.display_name, "nine");
  assert_eq!(created.best_time, 0);

  r.ensure_player(id(9), None).await.unwrap();
  assert_eq!(s.find(id(9)).await.unwrap().unwrap().display_name, "nine");
}

// ─── Durability ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn data_survives_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("runboard.db");

  {
    let r = Reconciler::new(Arc::new(SqliteStore::open(&path).await.unwrap()));
    r.apply_result(result(42, 100, 0.0, None)).await.unwrap();
    r.apply_result(result(7, 55, 2.5, Some(42))).await.unwrap();
  }

  let r = Reconciler::new(Arc::new(SqliteStore::open(&path).await.unwrap()));
  let referred = r.get_state(id(7)).await.unwrap();
  assert_eq!((referred.best_time, referred.reward_total), (55, 2.5));

  // The fence also survived, so this does not credit again.
  r.apply_result(result(7, 50, 0.0, Some(42))).await.unwrap();
  assert_eq!(r.get_state(id(42)).await.unwrap().referral_count, 1);
}
