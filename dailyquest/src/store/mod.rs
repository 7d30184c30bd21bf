//! Durable quest storage.
//!
//! Defines the [`QuestStore`] trait the manager persists through, plus two
//! implementations:
//! - [`InMemoryStore`]: non-persistent store with fault injection, for tests
//! - [`JsonFileStore`]: single JSON document on disk, used by the CLI
//!
//! Stores follow a unit-of-work model: `insert`, `update`, `delete` and
//! `put_profile` only stage changes, and `save` commits everything staged
//! so far. `fetch_all` and `fetch_profile` read committed state. A failed
//! `save` keeps the staged changes so that the next successful `save`
//! commits them.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use dailyquest_model::progress::Profile;
use dailyquest_model::quest::{Quest, QuestId};

/// Errors raised when the underlying store cannot be read or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A read operation failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Stored data exists but could not be decoded.
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

/// Storage backend for quests and the user profile.
pub trait QuestStore: Send + Sync {
    /// Returns every committed quest in store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    fn fetch_all(&self) -> Result<Vec<Quest>, StoreError>;

    /// Returns the committed profile, or the default for an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing storage cannot be read.
    fn fetch_profile(&self) -> Result<Profile, StoreError>;

    /// Stages a new quest.
    fn insert(&self, quest: Quest);

    /// Stages a modified quest, replacing the record with the same id.
    fn update(&self, quest: Quest);

    /// Stages removal of a quest.
    fn delete(&self, id: &QuestId);

    /// Stages a new profile.
    fn put_profile(&self, profile: Profile);

    /// Commits all staged changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the changes could not be made durable.
    /// Staged changes are kept for the next attempt.
    fn save(&self) -> Result<(), StoreError>;
}

/// A change staged in a store but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingChange {
    Insert(Quest),
    Update(Quest),
    Delete(QuestId),
    Profile(Profile),
}

/// Applies staged changes, in order, to a committed quest list and profile.
pub(crate) fn apply_changes(
    quests: &mut Vec<Quest>,
    profile: &mut Profile,
    changes: &[PendingChange],
) {
    for change in changes {
        match change {
            PendingChange::Insert(quest) => {
                if let Some(existing) = quests.iter_mut().find(|q| q.id == quest.id) {
                    *existing = quest.clone();
                } else {
                    quests.push(quest.clone());
                }
            }
            PendingChange::Update(quest) => {
                if let Some(existing) = quests.iter_mut().find(|q| q.id == quest.id) {
                    *existing = quest.clone();
                } else {
                    tracing::debug!(quest_id = %quest.id, "update for unknown quest ignored");
                }
            }
            PendingChange::Delete(id) => quests.retain(|q| q.id != *id),
            PendingChange::Profile(new_profile) => *profile = *new_profile,
        }
    }
}
