//! Quest manager for quest CRUD, daily missions and level progression.
//!
//! Every mutation follows the same protocol: change the in-memory record,
//! stage it in the store, `save()`, then reload the whole collection from
//! the store. The store is authoritative; the manager's lists are a cache.
//!
//! If `save()` fails the error is returned and the in-memory change is kept
//! as-is (no rollback). The staged change stays pending in the store and is
//! committed by the next successful save.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tokio::sync::watch;

use dailyquest_model::progress::{LevelPolicy, Profile, Progress};
use dailyquest_model::quest::{Difficulty, MAX_DAILY_QUESTS, Priority, Quest, QuestId};

use super::QuestError;
use super::stats::{self, DashboardSummary, DayCount, StatusBreakdown};
use crate::store::QuestStore;

/// State published to observers after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestSnapshot {
    /// All quests in store order.
    pub quests: Vec<Quest>,
    /// Quests flagged as daily missions.
    pub daily_quests: Vec<Quest>,
    /// Current level progression.
    pub progress: Progress,
    /// Set when a completion caused a level-up and not yet acknowledged.
    pub show_level_up: bool,
}

/// Single point of mutation and query for the quest collection.
pub struct QuestManager<S: QuestStore> {
    store: S,
    quests: Vec<Quest>,
    daily_quests: Vec<Quest>,
    progress: Progress,
    last_daily_reset: Option<NaiveDate>,
    show_level_up: bool,
    level_policy: LevelPolicy,
    snapshot_tx: watch::Sender<QuestSnapshot>,
}

impl<S: QuestStore> QuestManager<S> {
    /// Creates a manager over `store` without reading from it.
    ///
    /// Call [`load`](Self::load) before use, or use [`open`](Self::open).
    #[must_use]
    pub fn new(store: S) -> Self {
        let (snapshot_tx, _) = watch::channel(QuestSnapshot::default());
        Self {
            store,
            quests: Vec::new(),
            daily_quests: Vec::new(),
            progress: Progress::default(),
            last_daily_reset: None,
            show_level_up: false,
            level_policy: LevelPolicy::default(),
            snapshot_tx,
        }
    }

    /// Sets how many level-ups a single completion may trigger.
    #[must_use]
    pub fn with_level_policy(mut self, policy: LevelPolicy) -> Self {
        self.level_policy = policy;
        self
    }

    /// Creates a manager, loads the store and runs the daily reset check.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Store`] if the store cannot be read or the
    /// reset cannot be saved.
    pub fn open(store: S, policy: LevelPolicy) -> Result<Self, QuestError> {
        let mut manager = Self::new(store).with_level_policy(policy);
        manager.load()?;
        manager.check_daily_reset()?;
        Ok(manager)
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Subscribes to state snapshots.
    ///
    /// The receiver starts with the current state and is updated after
    /// every reload and level-up flag change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<QuestSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Builds a snapshot of the current in-memory state.
    #[must_use]
    pub fn snapshot(&self) -> QuestSnapshot {
        QuestSnapshot {
            quests: self.quests.clone(),
            daily_quests: self.daily_quests.clone(),
            progress: self.progress,
            show_level_up: self.show_level_up,
        }
    }

    // --- queries ---

    /// All quests in store order.
    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    /// Quests flagged as daily missions.
    #[must_use]
    pub fn daily_quests(&self) -> &[Quest] {
        &self.daily_quests
    }

    /// Current level progression.
    #[must_use]
    pub const fn progress(&self) -> Progress {
        self.progress
    }

    /// Whether a level-up happened and has not been acknowledged.
    #[must_use]
    pub const fn show_level_up(&self) -> bool {
        self.show_level_up
    }

    /// Active level-up policy.
    #[must_use]
    pub const fn level_policy(&self) -> LevelPolicy {
        self.level_policy
    }

    /// Day on which daily missions were last reset, if ever.
    #[must_use]
    pub const fn last_daily_reset(&self) -> Option<NaiveDate> {
        self.last_daily_reset
    }

    /// Looks up a quest by id.
    #[must_use]
    pub fn quest(&self, id: &QuestId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == *id)
    }

    /// Looks up a quest by a unique prefix of its id.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] if nothing matches, or
    /// [`QuestError::AmbiguousId`] if several quests match.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&Quest, QuestError> {
        let needle = prefix.trim().to_ascii_lowercase();
        let mut matches = self
            .quests
            .iter()
            .filter(|q| q.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(quest), None) => Ok(quest),
            (None, _) => Err(QuestError::QuestNotFound(prefix.to_string())),
            (Some(_), Some(_)) => Err(QuestError::AmbiguousId(prefix.to_string())),
        }
    }

    /// Whether the quest could be offered as a new daily mission: it exists,
    /// is neither daily nor completed, and a daily slot is free.
    #[must_use]
    pub fn can_set_daily(&self, id: &QuestId) -> bool {
        self.daily_quests.len() < MAX_DAILY_QUESTS
            && self
                .quest(id)
                .is_some_and(|q| !q.is_daily && !q.is_completed)
    }

    // --- store synchronisation ---

    /// Replaces the in-memory state with what the store holds.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Store`] if the store cannot be read. Both
    /// quest lists are cleared in that case rather than left stale.
    pub fn load(&mut self) -> Result<(), QuestError> {
        let fetched = self
            .store
            .fetch_all()
            .and_then(|quests| Ok((quests, self.store.fetch_profile()?)));

        match fetched {
            Ok((quests, profile)) => {
                self.quests = quests;
                self.refresh_daily();
                self.progress = profile.progress;
                self.last_daily_reset = profile.last_daily_reset;
                tracing::debug!(
                    quests = self.quests.len(),
                    daily = self.daily_quests.len(),
                    level = self.progress.level,
                    "quests loaded"
                );
                self.publish();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "quest load failed; clearing in-memory quests");
                self.quests.clear();
                self.daily_quests.clear();
                self.publish();
                Err(err.into())
            }
        }
    }

    /// Saves staged changes and reloads on success.
    fn commit(&mut self, action: &'static str) -> Result<(), QuestError> {
        if let Err(err) = self.store.save() {
            tracing::warn!(action, error = %err, "quest save failed");
            self.publish();
            return Err(err.into());
        }
        self.load()
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    const fn profile(&self) -> Profile {
        Profile {
            progress: self.progress,
            last_daily_reset: self.last_daily_reset,
        }
    }

    fn quest_mut(&mut self, id: &QuestId) -> Result<&mut Quest, QuestError> {
        self.quests
            .iter_mut()
            .find(|q| q.id == *id)
            .ok_or_else(|| QuestError::QuestNotFound(id.to_string()))
    }

    /// Rebuilds the daily list from the in-memory quests.
    fn refresh_daily(&mut self) {
        self.daily_quests = self.quests.iter().filter(|q| q.is_daily).cloned().collect();
    }

    /// Applies `change` to the quest and stages the result in the store.
    ///
    /// The daily list follows the in-memory quests even when the following
    /// save fails, so the daily cap also counts changes still pending.
    fn stage_update(
        &mut self,
        id: &QuestId,
        change: impl FnOnce(&mut Quest),
    ) -> Result<Quest, QuestError> {
        let quest = self.quest_mut(id)?;
        change(quest);
        let updated = quest.clone();
        self.store.update(updated.clone());
        self.refresh_daily();
        Ok(updated)
    }

    // --- mutations ---

    /// Creates a new open quest and returns its id.
    ///
    /// Content is not validated here; callers reject empty content first.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Store`] if the quest cannot be saved.
    pub fn add_quest(
        &mut self,
        content: impl Into<String>,
        priority: Priority,
        difficulty: Difficulty,
        details: impl Into<String>,
    ) -> Result<QuestId, QuestError> {
        let quest = Quest::new(content, priority, difficulty, details);
        let id = quest.id.clone();
        tracing::info!(quest_id = %id, exp = quest.exp, %priority, %difficulty, "quest added");
        self.store.insert(quest);
        self.commit("add")?;
        Ok(id)
    }

    /// Flags a quest as a daily mission.
    ///
    /// Returns `Ok(false)` without changing anything when
    /// [`MAX_DAILY_QUESTS`] quests are already daily.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn set_daily(&mut self, id: &QuestId) -> Result<bool, QuestError> {
        if self.quest(id).is_none() {
            return Err(QuestError::QuestNotFound(id.to_string()));
        }
        if self.daily_quests.len() >= MAX_DAILY_QUESTS {
            tracing::debug!(quest_id = %id, "daily missions full; set_daily ignored");
            return Ok(false);
        }
        self.stage_update(id, |q| q.is_daily = true)?;
        tracing::info!(quest_id = %id, "daily mission set");
        self.commit("set_daily")?;
        Ok(true)
    }

    /// Clears the daily flag. Calling it on a non-daily quest is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn remove_daily(&mut self, id: &QuestId) -> Result<(), QuestError> {
        self.stage_update(id, |q| q.is_daily = false)?;
        tracing::info!(quest_id = %id, "daily mission removed");
        self.commit("remove_daily")
    }

    /// Marks a quest completed and awards its experience.
    ///
    /// The award is granted on every call, as completion is not guarded
    /// here. Returns the number of levels gained.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn complete_quest(&mut self, id: &QuestId) -> Result<u32, QuestError> {
        let now = Utc::now();
        let quest = self.stage_update(id, |q| {
            q.is_completed = true;
            q.completed_at.get_or_insert(now);
        })?;

        let gained = self.progress.gain(quest.exp, self.level_policy);
        if gained > 0 {
            self.show_level_up = true;
            tracing::info!(level = self.progress.level, gained, "level up");
        }
        tracing::info!(
            quest_id = %id,
            exp = quest.exp,
            current_exp = self.progress.current_exp,
            "quest completed"
        );
        self.store.put_profile(self.profile());
        self.commit("complete")?;
        Ok(gained)
    }

    /// Records a failure. Completion state is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn fail_quest(&mut self, id: &QuestId) -> Result<(), QuestError> {
        let quest = self.stage_update(id, |q| q.fail_count = q.fail_count.saturating_add(1))?;
        tracing::info!(quest_id = %id, fail_count = quest.fail_count, "quest failed");
        self.commit("fail")
    }

    /// Permanently removes a quest.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn delete_quest(&mut self, id: &QuestId) -> Result<(), QuestError> {
        if self.quest(id).is_none() {
            return Err(QuestError::QuestNotFound(id.to_string()));
        }
        self.store.delete(id);
        tracing::info!(quest_id = %id, "quest deleted");
        self.commit("delete")
    }

    /// Overwrites the descriptive fields of a quest. The reward stays as
    /// computed at creation.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::QuestNotFound`] for an unknown id, or
    /// [`QuestError::Store`] if the change cannot be saved.
    pub fn edit_quest(
        &mut self,
        id: &QuestId,
        content: impl Into<String>,
        priority: Priority,
        difficulty: Difficulty,
        details: impl Into<String>,
    ) -> Result<(), QuestError> {
        let content = content.into();
        let details = details.into();
        self.stage_update(id, |q| {
            q.content = content;
            q.priority = priority;
            q.difficulty = difficulty;
            q.details = details;
        })?;
        tracing::info!(quest_id = %id, "quest edited");
        self.commit("edit")
    }

    /// Clears the level-up flag once the presentation layer has shown it.
    pub fn acknowledge_level_up(&mut self) {
        if self.show_level_up {
            self.show_level_up = false;
            self.publish();
        }
    }

    /// Runs [`check_daily_reset_at`](Self::check_daily_reset_at) with the
    /// local clock.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Store`] if the reset cannot be saved.
    pub fn check_daily_reset(&mut self) -> Result<bool, QuestError> {
        self.check_daily_reset_at(&Local::now())
    }

    /// Clears every daily flag when the calendar day of `now` differs from
    /// the day of the last reset.
    ///
    /// The first check on a store that never recorded a reset only records
    /// today. Returns whether flags were cleared.
    ///
    /// # Errors
    ///
    /// Returns [`QuestError::Store`] if the change cannot be saved.
    pub fn check_daily_reset_at<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
    ) -> Result<bool, QuestError> {
        let today = now.date_naive();
        match self.last_daily_reset {
            Some(day) if day == today => return Ok(false),
            None => {
                self.last_daily_reset = Some(today);
                self.store.put_profile(self.profile());
                tracing::debug!(%today, "daily reset day recorded");
                self.commit("daily_reset")?;
                return Ok(false);
            }
            Some(_) => {}
        }

        let daily_ids: Vec<QuestId> = self.daily_quests.iter().map(|q| q.id.clone()).collect();
        for id in &daily_ids {
            self.stage_update(id, |q| q.is_daily = false)?;
        }
        self.last_daily_reset = Some(today);
        self.store.put_profile(self.profile());
        tracing::info!(%today, cleared = daily_ids.len(), "daily missions reset");
        self.commit("daily_reset")?;
        Ok(true)
    }

    // --- statistics ---

    /// Number of completed quests.
    #[must_use]
    pub fn total_completed(&self) -> usize {
        stats::total_completed(&self.quests)
    }

    /// Sum of failure counts.
    #[must_use]
    pub fn total_failed(&self) -> u64 {
        stats::total_failed(&self.quests)
    }

    /// Experience earned from completed quests.
    #[must_use]
    pub fn total_earned_exp(&self) -> u64 {
        stats::total_earned_exp(&self.quests)
    }

    /// Completed quests per day over the last seven local days.
    #[must_use]
    pub fn weekly_completed_counts(&self) -> Vec<DayCount> {
        stats::weekly_completed_counts(&self.quests, &Local::now())
    }

    /// Completed quests per difficulty.
    #[must_use]
    pub fn difficulty_completed_counts(&self) -> [(Difficulty, usize); 3] {
        stats::difficulty_completed_counts(&self.quests)
    }

    /// Completed / incomplete / failed split.
    #[must_use]
    pub fn status_breakdown(&self) -> StatusBreakdown {
        stats::status_breakdown(&self.quests)
    }

    /// Headline dashboard numbers.
    #[must_use]
    pub fn summary(&self) -> DashboardSummary {
        DashboardSummary {
            level: self.progress.level,
            total_completed: self.total_completed(),
            total_failed: self.total_failed(),
            total_earned_exp: self.total_earned_exp(),
        }
    }
}
