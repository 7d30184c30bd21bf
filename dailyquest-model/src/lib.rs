//! Shared model definitions for `DailyQuest`.
//!
//! Holds the persisted [`Quest`](quest::Quest) record, its reward formula,
//! input limits, and the level progression arithmetic. Nothing here performs
//! I/O.

pub mod progress;
pub mod quest;
