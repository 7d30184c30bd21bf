//! `DailyQuest`: quest-style to-do tracker library.
//!
//! Quests carry an experience reward derived from priority and difficulty.
//! Completing them levels up a persisted profile; up to three quests can be
//! picked as daily missions, which are cleared when the calendar day changes.

pub mod cli;
pub mod config;
pub mod quests;
pub mod store;
