//! Property-based tests for rewards and level progression.
//!
//! Uses proptest to verify:
//! 1. Rewards are `priority * 10 * multiplier` for every pairing.
//! 2. Under the cascade policy no surplus is left above the threshold.
//! 3. Levels gained match the level delta, and the threshold tracks the level.
//! 4. Total experience is conserved across level-ups.
//! 5. Any quest survives a JSON round-trip.

#![allow(clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use dailyquest_model::progress::{
    EXP_STEP_PER_LEVEL, INITIAL_EXP_TO_NEXT_LEVEL, LevelPolicy, Progress,
};
use dailyquest_model::quest::{Difficulty, Priority, Quest, QuestId, compute_exp};

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

fn arb_policy() -> impl Strategy<Value = LevelPolicy> {
    prop_oneof![Just(LevelPolicy::Cascade), Just(LevelPolicy::SingleStep)]
}

/// Experience from the start of level 1 to the start of `level`.
fn exp_below(level: u32) -> u64 {
    (1..level)
        .map(|l| u64::from(INITIAL_EXP_TO_NEXT_LEVEL + EXP_STEP_PER_LEVEL * (l - 1)))
        .sum()
}

fn total_exp(progress: &Progress) -> u64 {
    exp_below(progress.level) + u64::from(progress.current_exp)
}

fn arb_quest() -> impl Strategy<Value = Quest> {
    (
        any::<u128>(),
        "[^\x00]{1,64}",
        arb_priority(),
        arb_difficulty(),
        any::<u32>(),
        any::<bool>(),
        any::<bool>(),
        0i64..4_000_000_000,
        proptest::option::of(0i64..4_000_000_000),
        "[^\x00]{0,200}",
    )
        .prop_map(
            |(id, content, priority, difficulty, fails, daily, done, created, completed, details)| {
                let mut quest = Quest::new(content, priority, difficulty, details);
                quest.id = QuestId::from_uuid(Uuid::from_u128(id));
                quest.fail_count = fails;
                quest.is_daily = daily;
                quest.is_completed = done;
                quest.created_at = Utc.timestamp_opt(created, 0).unwrap();
                quest.completed_at = completed.map(|s| Utc.timestamp_opt(s, 0).unwrap());
                quest
            },
        )
}

proptest! {
    #[test]
    fn reward_matches_table(priority in arb_priority(), difficulty in arb_difficulty()) {
        let exp = compute_exp(priority, difficulty);
        prop_assert_eq!(exp, u32::from(priority.value()) * 10 * difficulty.multiplier());
        prop_assert!((10..=90).contains(&exp));
        let quest = Quest::new("q", priority, difficulty, "");
        prop_assert_eq!(quest.exp, exp);
    }

    #[test]
    fn cascade_leaves_no_surplus(gains in prop::collection::vec(0u32..5_000, 1..20)) {
        let mut progress = Progress::default();
        for exp in gains {
            progress.gain(exp, LevelPolicy::Cascade);
            prop_assert!(progress.current_exp < progress.exp_to_next_level);
        }
    }

    #[test]
    fn gained_levels_match_delta(
        gains in prop::collection::vec(0u32..5_000, 1..20),
        policy in arb_policy(),
    ) {
        let mut progress = Progress::default();
        for exp in gains {
            let before = progress.level;
            let gained = progress.gain(exp, policy);
            prop_assert_eq!(progress.level, before + gained);
            if policy == LevelPolicy::SingleStep {
                prop_assert!(gained <= 1);
            }
            prop_assert_eq!(
                progress.exp_to_next_level,
                INITIAL_EXP_TO_NEXT_LEVEL + EXP_STEP_PER_LEVEL * (progress.level - 1)
            );
        }
    }

    #[test]
    fn experience_is_conserved(
        gains in prop::collection::vec(0u32..5_000, 1..20),
        policy in arb_policy(),
    ) {
        let mut progress = Progress::default();
        let mut awarded = 0u64;
        for exp in gains {
            progress.gain(exp, policy);
            awarded += u64::from(exp);
            prop_assert_eq!(total_exp(&progress), awarded);
        }
    }

    #[test]
    fn quest_json_round_trip(quest in arb_quest()) {
        let json = serde_json::to_string(&quest).unwrap();
        let decoded: Quest = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(quest, decoded);
    }
}
