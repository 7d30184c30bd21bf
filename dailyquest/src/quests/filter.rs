//! Quest list filtering.

use dailyquest_model::quest::{Difficulty, Priority, Quest};

/// Status criterion for the quest list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusFilter {
    /// Not yet completed.
    Incomplete,
    /// Completed.
    Completed,
    /// Failed at least once, regardless of completion.
    Failed,
}

impl StatusFilter {
    fn matches(self, quest: &Quest) -> bool {
        match self {
            Self::Incomplete => !quest.is_completed,
            Self::Completed => quest.is_completed,
            Self::Failed => quest.fail_count > 0,
        }
    }
}

/// Conjunctive filter over status, priority and difficulty.
///
/// Unset criteria match everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuestFilter {
    /// Required status, if any.
    pub status: Option<StatusFilter>,
    /// Required priority, if any.
    pub priority: Option<Priority>,
    /// Required difficulty, if any.
    pub difficulty: Option<Difficulty>,
}

impl QuestFilter {
    /// Returns `true` if `quest` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, quest: &Quest) -> bool {
        self.status.is_none_or(|s| s.matches(quest))
            && self.priority.is_none_or(|p| quest.priority == p)
            && self.difficulty.is_none_or(|d| quest.difficulty == d)
    }

    /// Returns the matching quests, preserving their order.
    #[must_use]
    pub fn apply<'a>(&self, quests: &'a [Quest]) -> Vec<&'a Quest> {
        quests.iter().filter(|q| self.matches(q)).collect()
    }
}
