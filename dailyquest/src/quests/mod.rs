//! Quest management for `DailyQuest`.
//!
//! [`QuestManager`] is the single point of mutation for the quest
//! collection. It persists every change through a
//! [`QuestStore`](crate::store::QuestStore), re-reads the committed state
//! afterwards, and publishes a [`QuestSnapshot`] to subscribers.

pub mod filter;
pub mod manager;
pub mod stats;

pub use filter::{QuestFilter, StatusFilter};
pub use manager::{QuestManager, QuestSnapshot};
pub use stats::{DashboardSummary, DayCount, StatusBreakdown};

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during quest operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestError {
    /// The store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Quest with the given ID (or ID prefix) was not found.
    #[error("quest not found: {0}")]
    QuestNotFound(String),
    /// An ID prefix matched more than one quest.
    #[error("quest id prefix '{0}' is ambiguous")]
    AmbiguousId(String),
}
