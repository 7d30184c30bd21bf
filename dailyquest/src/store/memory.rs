//! In-memory [`QuestStore`] for tests and embedding.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use dailyquest_model::progress::Profile;
use dailyquest_model::quest::{Quest, QuestId};

use super::{PendingChange, QuestStore, StoreError, apply_changes};

#[derive(Debug, Default)]
struct MemoryState {
    quests: Vec<Quest>,
    profile: Profile,
    pending: Vec<PendingChange>,
}

/// In-memory implementation of [`QuestStore`].
///
/// Committed quests keep insertion order. Reads and writes can be made to
/// fail with [`set_fail_reads`](Self::set_fail_reads) and
/// [`set_fail_writes`](Self::set_fail_writes). All data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with already-committed quests.
    #[must_use]
    pub fn with_quests(self, quests: Vec<Quest>) -> Self {
        self.state.lock().quests = quests;
        self
    }

    /// Seeds the store with an already-committed profile.
    #[must_use]
    pub fn with_profile(self, profile: Profile) -> Self {
        self.state.lock().profile = profile;
        self
    }

    /// Makes subsequent `fetch_*` calls fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent `save` calls fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of staged, uncommitted changes.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed("in-memory store read disabled".to_string()));
        }
        Ok(())
    }
}

impl QuestStore for InMemoryStore {
    fn fetch_all(&self) -> Result<Vec<Quest>, StoreError> {
        self.check_read()?;
        Ok(self.state.lock().quests.clone())
    }

    fn fetch_profile(&self) -> Result<Profile, StoreError> {
        self.check_read()?;
        Ok(self.state.lock().profile)
    }

    fn insert(&self, quest: Quest) {
        self.state.lock().pending.push(PendingChange::Insert(quest));
    }

    fn update(&self, quest: Quest) {
        self.state.lock().pending.push(PendingChange::Update(quest));
    }

    fn delete(&self, id: &QuestId) {
        self.state
            .lock()
            .pending
            .push(PendingChange::Delete(id.clone()));
    }

    fn put_profile(&self, profile: Profile) {
        self.state.lock().pending.push(PendingChange::Profile(profile));
    }

    fn save(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("disk full".to_string()));
        }
        let mut state = self.state.lock();
        let MemoryState {
            quests,
            profile,
            pending,
        } = &mut *state;
        apply_changes(quests, profile, pending);
        pending.clear();
        Ok(())
    }
}
