//! JSON-file backed [`QuestStore`].
//!
//! The whole collection lives in one pretty-printed JSON document:
//!
//! ```json
//! { "version": 1, "profile": { ... }, "quests": [ ... ] }
//! ```
//!
//! Saves write to a sibling `.tmp` file and rename it over the target, so a
//! crash mid-write never leaves a truncated document behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use dailyquest_model::progress::Profile;
use dailyquest_model::quest::{Quest, QuestId};

use super::{PendingChange, QuestStore, StoreError, apply_changes};

/// Current on-disk document version.
const DATA_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DataFile {
    version: u32,
    #[serde(default)]
    profile: Profile,
    #[serde(default)]
    quests: Vec<Quest>,
}

impl Default for DataFile {
    fn default() -> Self {
        Self {
            version: DATA_FILE_VERSION,
            profile: Profile::default(),
            quests: Vec::new(),
        }
    }
}

/// Persists quests and the profile to a single JSON file.
///
/// A missing file reads as an empty store. Parent directories are created
/// on the first save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    pending: Mutex<Vec<PendingChange>>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. Nothing is read until the first
    /// fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<DataFile, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(DataFile::default()),
            Err(e) => {
                return Err(StoreError::ReadFailed(format!(
                    "{}: {e}",
                    self.path.display()
                )));
            }
        };
        let document: DataFile = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))?;
        if document.version > DATA_FILE_VERSION {
            return Err(StoreError::Corrupt(format!(
                "{}: unsupported data file version {}",
                self.path.display(),
                document.version
            )));
        }
        Ok(document)
    }

    fn write_document(&self, document: &DataFile) -> Result<(), StoreError> {
        let write_err = |e: std::io::Error| {
            StoreError::WriteFailed(format!("{}: {e}", self.path.display()))
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::WriteFailed(format!("serialize: {e}")))?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn stage(&self, change: PendingChange) {
        self.pending.lock().push(change);
    }
}

impl QuestStore for JsonFileStore {
    fn fetch_all(&self) -> Result<Vec<Quest>, StoreError> {
        Ok(self.read_document()?.quests)
    }

    fn fetch_profile(&self) -> Result<Profile, StoreError> {
        Ok(self.read_document()?.profile)
    }

    fn insert(&self, quest: Quest) {
        self.stage(PendingChange::Insert(quest));
    }

    fn update(&self, quest: Quest) {
        self.stage(PendingChange::Update(quest));
    }

    fn delete(&self, id: &QuestId) {
        self.stage(PendingChange::Delete(id.clone()));
    }

    fn put_profile(&self, profile: Profile) {
        self.stage(PendingChange::Profile(profile));
    }

    fn save(&self) -> Result<(), StoreError> {
        let mut pending = self.pending.lock();
        if pending.is_empty() {
            return Ok(());
        }

        let mut document = self.read_document()?;
        apply_changes(&mut document.quests, &mut document.profile, &pending);
        document.version = DATA_FILE_VERSION;
        self.write_document(&document)?;

        tracing::debug!(
            path = %self.path.display(),
            changes = pending.len(),
            quests = document.quests.len(),
            "data file saved"
        );
        pending.clear();
        drop(pending);
        Ok(())
    }
}
