//! Level progression driven by quest completions.
//!
//! Each level needs [`EXP_STEP_PER_LEVEL`] more experience than the one
//! before it, starting at [`INITIAL_EXP_TO_NEXT_LEVEL`]. Leftover experience
//! carries over into the next level.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Experience needed to leave level 1.
pub const INITIAL_EXP_TO_NEXT_LEVEL: u32 = 100;

/// Increase of the level threshold applied on every level-up.
pub const EXP_STEP_PER_LEVEL: u32 = 50;

/// How many level-ups a single experience award may trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelPolicy {
    /// Keep levelling up while the accumulated experience covers the
    /// threshold.
    #[default]
    Cascade,
    /// At most one level-up per award; surplus stays in `current_exp`.
    SingleStep,
}

/// Returned when a level policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level policy '{0}' (expected cascade or single-step)")]
pub struct UnknownLevelPolicy(pub String);

impl FromStr for LevelPolicy {
    type Err = UnknownLevelPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cascade" => Ok(Self::Cascade),
            "single-step" | "single" => Ok(Self::SingleStep),
            other => Err(UnknownLevelPolicy(other.to_string())),
        }
    }
}

impl std::fmt::Display for LevelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cascade => write!(f, "cascade"),
            Self::SingleStep => write!(f, "single-step"),
        }
    }
}

/// Current level and experience counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience accumulated toward the next level.
    pub current_exp: u32,
    /// Experience required to reach the next level.
    pub exp_to_next_level: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: 1,
            current_exp: 0,
            exp_to_next_level: INITIAL_EXP_TO_NEXT_LEVEL,
        }
    }
}

impl Progress {
    /// Adds `exp` and applies level-ups according to `policy`.
    ///
    /// Returns the number of levels gained.
    pub fn gain(&mut self, exp: u32, policy: LevelPolicy) -> u32 {
        self.current_exp = self.current_exp.saturating_add(exp);
        let mut gained = 0;
        while self.exp_to_next_level > 0 && self.current_exp >= self.exp_to_next_level {
            self.level += 1;
            self.current_exp -= self.exp_to_next_level;
            self.exp_to_next_level += EXP_STEP_PER_LEVEL;
            gained += 1;
            if policy == LevelPolicy::SingleStep {
                break;
            }
        }
        gained
    }

    /// Fraction of the current level completed, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.exp_to_next_level == 0 {
            return 1.0;
        }
        (f64::from(self.current_exp) / f64::from(self.exp_to_next_level)).clamp(0.0, 1.0)
    }
}

/// Persisted per-user state that is not tied to a single quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Level progression.
    #[serde(default)]
    pub progress: Progress,
    /// Calendar day on which daily missions were last reset.
    #[serde(default)]
    pub last_daily_reset: Option<NaiveDate>,
}
