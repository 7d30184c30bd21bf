//! Quest record types for `DailyQuest`.
//!
//! A [`Quest`] is a plain data record. Its reward value is fixed at creation
//! by [`compute_exp`] and never recomputed, even when the quest is edited.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed details length in characters.
pub const MAX_DETAILS_LENGTH: usize = 200;

/// Maximum number of quests that may be flagged as daily missions at once.
pub const MAX_DAILY_QUESTS: usize = 3;

/// Errors raised while turning user input into quest fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestInputError {
    /// Quest content cannot be empty.
    #[error("quest content cannot be empty")]
    ContentEmpty,
    /// Priority outside of 1..=3.
    #[error("invalid priority {0} (expected 1, 2 or 3)")]
    InvalidPriority(u8),
    /// Difficulty label that is not easy, normal or hard.
    #[error("invalid difficulty '{0}' (expected easy, normal or hard)")]
    InvalidDifficulty(String),
}

/// Unique identifier for a quest, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestId(Uuid);

impl QuestId {
    /// Creates a new time-ordered quest identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `QuestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for QuestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Quest priority. Stored as its numeric value (1, 2 or 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    /// Priority 1.
    Low,
    /// Priority 2.
    Medium,
    /// Priority 3.
    High,
}

impl Priority {
    /// All priorities, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Numeric value used by the reward formula.
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = QuestInputError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            other => Err(QuestInputError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Quest difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Reward multiplier 1.
    Easy,
    /// Reward multiplier 2.
    #[default]
    Normal,
    /// Reward multiplier 3.
    Hard,
}

impl Difficulty {
    /// All difficulties in dashboard order.
    pub const ALL: [Self; 3] = [Self::Easy, Self::Normal, Self::Hard];

    /// Reward multiplier applied on top of the priority base.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::Easy => 1,
            Self::Normal => 2,
            Self::Hard => 3,
        }
    }

    /// Lowercase label, matching the serialized form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Normal => "normal",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = QuestInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "normal" => Ok(Self::Normal),
            "hard" => Ok(Self::Hard),
            _ => Err(QuestInputError::InvalidDifficulty(s.to_string())),
        }
    }
}

/// Reward granted for completing a quest: `priority * 10 * multiplier`.
#[must_use]
pub fn compute_exp(priority: Priority, difficulty: Difficulty) -> u32 {
    u32::from(priority.value()) * 10 * difficulty.multiplier()
}

/// A single quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    /// Unique quest identifier (UUID v7, time-ordered).
    pub id: QuestId,
    /// Short description.
    pub content: String,
    /// Quest priority.
    pub priority: Priority,
    /// Quest difficulty.
    pub difficulty: Difficulty,
    /// Reward fixed at creation.
    pub exp: u32,
    /// Number of times the quest was marked failed.
    pub fail_count: u32,
    /// Whether the quest is one of the daily missions.
    pub is_daily: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the quest has been completed. Never reset.
    pub is_completed: bool,
    /// Free-form details, at most [`MAX_DETAILS_LENGTH`] characters.
    pub details: String,
    /// First completion time. `None` for open quests and for records
    /// written before completion times were tracked.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    /// Builds a fresh, open quest created now.
    ///
    /// Content is taken as-is; callers validate it with
    /// [`validate_content`] beforehand.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        priority: Priority,
        difficulty: Difficulty,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: QuestId::new(),
            content: content.into(),
            priority,
            difficulty,
            exp: compute_exp(priority, difficulty),
            fail_count: 0,
            is_daily: false,
            created_at: Utc::now(),
            is_completed: false,
            details: details.into(),
            completed_at: None,
        }
    }
}

/// Rejects empty quest content.
///
/// Whitespace-only content is accepted, as the create screen only checks
/// for emptiness.
///
/// # Errors
///
/// Returns [`QuestInputError::ContentEmpty`] if `content` is empty.
pub const fn validate_content(content: &str) -> Result<(), QuestInputError> {
    if content.is_empty() {
        return Err(QuestInputError::ContentEmpty);
    }
    Ok(())
}

/// Keeps at most [`MAX_DETAILS_LENGTH`] characters of `details`.
#[must_use]
pub fn truncate_details(details: &str) -> String {
    details.chars().take(MAX_DETAILS_LENGTH).collect()
}
