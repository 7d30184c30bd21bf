//! Dashboard statistics derived from the quest collection.
//!
//! All functions are linear scans over a quest slice and never touch the
//! store.

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Weekday};

use dailyquest_model::quest::{Difficulty, Quest};

/// Number of days covered by [`weekly_completed_counts`].
pub const WEEK_DAYS: u64 = 7;

/// Completed quests attributed to one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCount {
    /// The calendar day.
    pub date: NaiveDate,
    /// Weekday of `date`, used as the chart label.
    pub weekday: Weekday,
    /// Completed quests attributed to this day.
    pub count: usize,
}

/// Three-way status split shown on the dashboard.
///
/// `failed` counts failure events, so it overlaps the other two buckets and
/// the three numbers need not add up to the quest count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusBreakdown {
    /// Completed quests.
    pub completed: usize,
    /// Quests not yet completed.
    pub incomplete: usize,
    /// Sum of all failure counts.
    pub failed: u64,
}

/// Headline numbers for the statistics screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Current level.
    pub level: u32,
    /// Completed quests.
    pub total_completed: usize,
    /// Sum of all failure counts.
    pub total_failed: u64,
    /// Experience from completed quests.
    pub total_earned_exp: u64,
}

/// Number of completed quests.
#[must_use]
pub fn total_completed(quests: &[Quest]) -> usize {
    quests.iter().filter(|q| q.is_completed).count()
}

/// Sum of failure counts over all quests.
#[must_use]
pub fn total_failed(quests: &[Quest]) -> u64 {
    quests.iter().map(|q| u64::from(q.fail_count)).sum()
}

/// Sum of rewards over completed quests.
#[must_use]
pub fn total_earned_exp(quests: &[Quest]) -> u64 {
    quests
        .iter()
        .filter(|q| q.is_completed)
        .map(|q| u64::from(q.exp))
        .sum()
}

/// Completed quests per day for the seven days ending on `now`'s date,
/// oldest first.
///
/// Days are taken in `now`'s time zone. A quest counts toward the day it
/// was completed; records without a completion time fall back to their
/// creation day.
#[must_use]
pub fn weekly_completed_counts<Tz: TimeZone>(
    quests: &[Quest],
    now: &DateTime<Tz>,
) -> Vec<DayCount> {
    let tz = now.timezone();
    let today = now.date_naive();
    let completion_days: Vec<NaiveDate> = quests
        .iter()
        .filter(|q| q.is_completed)
        .map(|q| {
            q.completed_at
                .unwrap_or(q.created_at)
                .with_timezone(&tz)
                .date_naive()
        })
        .collect();

    (0..WEEK_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DayCount {
            date,
            weekday: date.weekday(),
            count: completion_days.iter().filter(|d| **d == date).count(),
        })
        .collect()
}

/// Completed quests per difficulty, in easy, normal, hard order.
#[must_use]
pub fn difficulty_completed_counts(quests: &[Quest]) -> [(Difficulty, usize); 3] {
    Difficulty::ALL.map(|difficulty| {
        let count = quests
            .iter()
            .filter(|q| q.is_completed && q.difficulty == difficulty)
            .count();
        (difficulty, count)
    })
}

/// Completed / incomplete / failed split.
#[must_use]
pub fn status_breakdown(quests: &[Quest]) -> StatusBreakdown {
    let completed = total_completed(quests);
    StatusBreakdown {
        completed,
        incomplete: quests.len() - completed,
        failed: total_failed(quests),
    }
}
