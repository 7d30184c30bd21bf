//! Integration tests for the quest lifecycle.
//!
//! Drives `QuestManager` through creation, daily missions, completion,
//! failure, editing and deletion, checking that the store stays the
//! source of truth after every step.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};

use dailyquest::quests::{QuestError, QuestManager};
use dailyquest::store::{InMemoryStore, QuestStore, StoreError};
use dailyquest_model::progress::{LevelPolicy, Profile, Progress};
use dailyquest_model::quest::{Difficulty, Priority, Quest, QuestId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Creates a loaded manager over an empty in-memory store.
fn make_manager() -> QuestManager<InMemoryStore> {
    let mut mgr = QuestManager::new(InMemoryStore::new());
    mgr.load().expect("empty store loads");
    mgr
}

/// Adds a quest with the given reward inputs.
fn add(
    mgr: &mut QuestManager<InMemoryStore>,
    content: &str,
    priority: Priority,
    difficulty: Difficulty,
) -> QuestId {
    mgr.add_quest(content, priority, difficulty, "")
        .expect("add succeeds")
}

/// Creates a quest with a fixed reward, bypassing the reward table.
fn quest_with_exp(content: &str, exp: u32) -> Quest {
    let mut quest = Quest::new(content, Priority::High, Difficulty::Hard, "");
    quest.exp = exp;
    quest
}

// ===========================================================================
// Creation and rewards
// ===========================================================================

#[test]
fn new_quest_is_open_and_priced() {
    let mut mgr = make_manager();
    let id = add(&mut mgr, "Write report", Priority::Medium, Difficulty::Hard);

    let stored = mgr.store().fetch_all().unwrap();
    assert_eq!(stored.len(), 1);
    let quest = &stored[0];
    assert_eq!(quest.id, id);
    assert_eq!(quest.exp, 60);
    assert!(!quest.is_completed);
    assert!(!quest.is_daily);
    assert_eq!(quest.fail_count, 0);
    assert!(quest.completed_at.is_none());
}

#[test]
fn every_pairing_gets_its_reward() {
    let mut mgr = make_manager();
    let mut expected = Vec::new();
    for priority in Priority::ALL {
        for difficulty in Difficulty::ALL {
            let id = add(&mut mgr, "q", priority, difficulty);
            expected.push((id, u32::from(priority.value()) * 10 * difficulty.multiplier()));
        }
    }
    for (id, exp) in expected {
        assert_eq!(mgr.quest(&id).unwrap().exp, exp);
    }
}

// ===========================================================================
// Daily missions
// ===========================================================================

#[test]
fn daily_slots_are_capped() {
    let mut mgr = make_manager();
    let ids: Vec<QuestId> = (0..5)
        .map(|i| add(&mut mgr, &format!("q{i}"), Priority::Low, Difficulty::Easy))
        .collect();

    for id in &ids[..3] {
        assert!(mgr.set_daily(id).unwrap());
    }
    assert!(!mgr.set_daily(&ids[3]).unwrap());
    assert!(!mgr.set_daily(&ids[4]).unwrap());

    let daily_in_store = mgr
        .store()
        .fetch_all()
        .unwrap()
        .iter()
        .filter(|q| q.is_daily)
        .count();
    assert_eq!(daily_in_store, 3);

    // Freeing a slot makes room again.
    mgr.remove_daily(&ids[0]).unwrap();
    assert!(mgr.set_daily(&ids[3]).unwrap());
    assert_eq!(mgr.daily_quests().len(), 3);
}

#[test]
fn daily_missions_reset_on_new_day() {
    let mut mgr = make_manager();
    let a = add(&mut mgr, "a", Priority::Low, Difficulty::Easy);
    let b = add(&mut mgr, "b", Priority::Low, Difficulty::Easy);

    let monday = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    let monday_night = Utc.with_ymd_and_hms(2025, 6, 2, 23, 59, 0).unwrap();
    let tuesday = Utc.with_ymd_and_hms(2025, 6, 3, 0, 1, 0).unwrap();

    assert!(!mgr.check_daily_reset_at(&monday).unwrap());
    mgr.set_daily(&a).unwrap();
    mgr.set_daily(&b).unwrap();

    assert!(!mgr.check_daily_reset_at(&monday_night).unwrap());
    assert_eq!(mgr.daily_quests().len(), 2);

    assert!(mgr.check_daily_reset_at(&tuesday).unwrap());
    assert!(mgr.daily_quests().is_empty());
    assert!(mgr.quests().iter().all(|q| !q.is_daily));
    assert_eq!(mgr.quests().len(), 2);
}

#[test]
fn reset_day_survives_reopen() {
    let store = InMemoryStore::new().with_profile(Profile {
        progress: Progress::default(),
        last_daily_reset: Some(Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap().date_naive()),
    });
    let mut mgr = QuestManager::new(store);
    mgr.load().unwrap();
    let id = add(&mut mgr, "a", Priority::Low, Difficulty::Easy);
    mgr.set_daily(&id).unwrap();

    let same_day = Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap();
    assert!(!mgr.check_daily_reset_at(&same_day).unwrap());
    assert_eq!(mgr.daily_quests().len(), 1);
}

// ===========================================================================
// Completion and progression
// ===========================================================================

#[test]
fn completion_carries_surplus_into_next_level() {
    let quest = quest_with_exp("big", 120);
    let id = quest.id.clone();
    let mut profile = Profile::default();
    profile.progress.current_exp = 90;
    let store = InMemoryStore::new()
        .with_quests(vec![quest])
        .with_profile(profile);
    let mut mgr = QuestManager::new(store);
    mgr.load().unwrap();

    assert_eq!(mgr.complete_quest(&id).unwrap(), 1);
    assert_eq!(
        mgr.progress(),
        Progress {
            level: 2,
            current_exp: 10,
            exp_to_next_level: 150,
        }
    );
    assert!(mgr.show_level_up());
    assert_eq!(mgr.store().fetch_profile().unwrap().progress, mgr.progress());
}

#[test]
fn cascade_and_single_step_differ_on_large_awards() {
    let run = |policy| {
        let quest = quest_with_exp("huge", 300);
        let id = quest.id.clone();
        let store = InMemoryStore::new().with_quests(vec![quest]);
        let mut mgr = QuestManager::new(store).with_level_policy(policy);
        mgr.load().unwrap();
        let gained = mgr.complete_quest(&id).unwrap();
        (gained, mgr.progress())
    };

    let (gained, cascade) = run(LevelPolicy::Cascade);
    assert_eq!(gained, 2);
    assert_eq!((cascade.level, cascade.current_exp, cascade.exp_to_next_level), (3, 50, 200));

    let (gained, single) = run(LevelPolicy::SingleStep);
    assert_eq!(gained, 1);
    assert_eq!((single.level, single.current_exp, single.exp_to_next_level), (2, 200, 150));
}

#[test]
fn level_up_flag_waits_for_acknowledgement() {
    let mut mgr = make_manager();
    let a = add(&mut mgr, "a", Priority::High, Difficulty::Hard);
    let b = add(&mut mgr, "b", Priority::High, Difficulty::Hard);

    mgr.complete_quest(&a).unwrap();
    assert!(!mgr.show_level_up());
    mgr.complete_quest(&b).unwrap();
    assert!(mgr.show_level_up());

    let mut rx = mgr.subscribe();
    rx.mark_unchanged();
    mgr.acknowledge_level_up();
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().show_level_up);
    assert!(!mgr.show_level_up());
}

#[test]
fn failing_never_completes_or_rewards() {
    let mut mgr = make_manager();
    let id = add(&mut mgr, "stubborn", Priority::Medium, Difficulty::Normal);
    for _ in 0..4 {
        mgr.fail_quest(&id).unwrap();
    }
    let quest = mgr.quest(&id).unwrap();
    assert_eq!(quest.fail_count, 4);
    assert!(!quest.is_completed);
    assert_eq!(mgr.progress(), Progress::default());

    // A failed quest can still be completed afterwards.
    mgr.complete_quest(&id).unwrap();
    let quest = mgr.quest(&id).unwrap();
    assert!(quest.is_completed);
    assert_eq!(quest.fail_count, 4);
}

// ===========================================================================
// Editing and deletion
// ===========================================================================

#[test]
fn edit_keeps_reward_and_identity() {
    let mut mgr = make_manager();
    let id = add(&mut mgr, "draft", Priority::Low, Difficulty::Easy);
    mgr.edit_quest(&id, "final", Priority::High, Difficulty::Hard, "polished")
        .unwrap();

    let stored = mgr.store().fetch_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].content, "final");
    assert_eq!(stored[0].details, "polished");
    assert_eq!(stored[0].exp, 10);
}

#[test]
fn deleted_quest_is_gone_after_reload() {
    let mut mgr = make_manager();
    let keep = add(&mut mgr, "keep", Priority::Low, Difficulty::Easy);
    let doomed = add(&mut mgr, "doomed", Priority::Low, Difficulty::Easy);
    mgr.set_daily(&doomed).unwrap();

    mgr.delete_quest(&doomed).unwrap();
    mgr.load().unwrap();

    assert!(mgr.quest(&doomed).is_none());
    assert!(mgr.quest(&keep).is_some());
    assert!(mgr.daily_quests().is_empty());
    assert!(matches!(
        mgr.complete_quest(&doomed),
        Err(QuestError::QuestNotFound(_))
    ));
}

#[test]
fn unknown_ids_are_rejected_everywhere() {
    let mut mgr = make_manager();
    let ghost = QuestId::new();
    assert!(matches!(mgr.set_daily(&ghost), Err(QuestError::QuestNotFound(_))));
    assert!(matches!(mgr.remove_daily(&ghost), Err(QuestError::QuestNotFound(_))));
    assert!(matches!(mgr.complete_quest(&ghost), Err(QuestError::QuestNotFound(_))));
    assert!(matches!(mgr.fail_quest(&ghost), Err(QuestError::QuestNotFound(_))));
    assert!(matches!(mgr.delete_quest(&ghost), Err(QuestError::QuestNotFound(_))));
    assert!(matches!(
        mgr.edit_quest(&ghost, "x", Priority::Low, Difficulty::Easy, ""),
        Err(QuestError::QuestNotFound(_))
    ));
    assert_eq!(mgr.progress(), Progress::default());
}

// ===========================================================================
// Store failures
// ===========================================================================

#[test]
fn failed_save_is_retried_by_next_commit() {
    let mut mgr = make_manager();
    let id = add(&mut mgr, "flaky", Priority::Low, Difficulty::Easy);

    mgr.store().set_fail_writes(true);
    let err = mgr.complete_quest(&id).unwrap_err();
    assert!(matches!(err, QuestError::Store(StoreError::WriteFailed(_))));
    // In-memory state moved on; committed state did not.
    assert!(mgr.quest(&id).unwrap().is_completed);
    assert!(!mgr.store().fetch_all().unwrap()[0].is_completed);
    assert!(mgr.store().pending_len() > 0);

    mgr.store().set_fail_writes(false);
    mgr.fail_quest(&id).unwrap();
    let stored = &mgr.store().fetch_all().unwrap()[0];
    assert!(stored.is_completed);
    assert_eq!(stored.fail_count, 1);
    assert_eq!(mgr.store().fetch_profile().unwrap().progress.current_exp, 10);
}

#[test]
fn unreadable_store_fails_open() {
    let store = InMemoryStore::new();
    store.set_fail_reads(true);
    let result = QuestManager::open(store, LevelPolicy::Cascade);
    assert!(matches!(
        result,
        Err(QuestError::Store(StoreError::ReadFailed(_)))
    ));
}

/// Number of committed quests flagged daily.
fn committed_daily(mgr: &QuestManager<InMemoryStore>) -> usize {
    mgr.store()
        .fetch_all()
        .unwrap()
        .iter()
        .filter(|q| q.is_daily)
        .count()
}

#[test]
fn daily_cap_holds_after_failed_save() {
    let mut mgr = make_manager();
    let ids: Vec<QuestId> = (0..4)
        .map(|i| add(&mut mgr, &format!("q{i}"), Priority::Low, Difficulty::Easy))
        .collect();
    assert!(mgr.set_daily(&ids[0]).unwrap());
    assert!(mgr.set_daily(&ids[1]).unwrap());

    mgr.store().set_fail_writes(true);
    assert!(matches!(
        mgr.set_daily(&ids[2]),
        Err(QuestError::Store(StoreError::WriteFailed(_)))
    ));
    mgr.store().set_fail_writes(false);

    // The pending flag on q2 takes the last slot.
    assert!(!mgr.set_daily(&ids[3]).unwrap());
    // Any later commit flushes the pending flag.
    mgr.fail_quest(&ids[3]).unwrap();

    assert_eq!(committed_daily(&mgr), 3);
    assert!(!mgr.quest(&ids[3]).unwrap().is_daily);
    assert!(mgr.quest(&ids[2]).unwrap().is_daily);
}

#[test]
fn reset_clears_daily_whose_save_failed() {
    let mut mgr = make_manager();
    let id = add(&mut mgr, "pending daily", Priority::Low, Difficulty::Easy);
    let monday = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
    let tuesday = Utc.with_ymd_and_hms(2025, 6, 3, 9, 0, 0).unwrap();
    mgr.check_daily_reset_at(&monday).unwrap();

    mgr.store().set_fail_writes(true);
    assert!(mgr.set_daily(&id).is_err());
    mgr.store().set_fail_writes(false);
    assert_eq!(mgr.daily_quests().len(), 1);

    assert!(mgr.check_daily_reset_at(&tuesday).unwrap());
    assert_eq!(committed_daily(&mgr), 0);
    assert!(!mgr.quest(&id).unwrap().is_daily);
    assert!(mgr.daily_quests().is_empty());
}
