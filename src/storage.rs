//! Persistence for the project list
//!
//! The whole application state is written as one JSON payload under a single key
//! of a [`KeyValueStore`]. Failures never leave this module: they are logged and
//! treated as "nothing saved".

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{Project, ProjectId};

/// Key the payload is stored under
pub const STORAGE_KEY: &str = "modular_todo_projects_v1";

/// Directory used by the file store when none is configured
pub const DEFAULT_STORE_DIR: &str = ".taskpad";

/// Errors raised by a store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to parse payload: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A string key-value store. Both operations may fail.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if nothing was ever written
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// An in-process store; contents are lost when it is dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one entry
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self { entries, writes: 0 }
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// File store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORE_DIR),
        }
    }
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn with_config(config: &StoreConfig) -> Self {
        Self::new(config.dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;

        // Write next to the target and rename so readers never see a partial payload
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Serialized form of the application state
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadRef<'a> {
    projects: &'a [Project],
    selected_project_id: Option<&'a str>,
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct Payload {
    projects: Option<Vec<Project>>,
    selected_project_id: Option<String>,
}

/// State recovered by [`Storage::load`]
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedState {
    pub projects: Vec<Project>,
    pub selected_project_id: Option<ProjectId>,
}

/// Bridges the in-memory project list and a [`KeyValueStore`]
#[derive(Debug)]
pub struct Storage<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Storage<S> {
    /// Creates storage writing under [`STORAGE_KEY`]
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes the full state. Failures are logged and otherwise ignored.
    pub fn save(&mut self, projects: &[Project], selected_project_id: Option<&str>) {
        if let Err(e) = self.try_save(projects, selected_project_id) {
            tracing::warn!(key = %self.key, error = %e, "Save failed");
        }
    }

    /// Reads the full state back.
    ///
    /// Returns `None` when nothing was saved, and also when the stored payload
    /// cannot be read or parsed (the failure is logged).
    pub fn load(&self) -> Option<LoadedState> {
        match self.try_load() {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Load failed");
                None
            }
        }
    }

    fn try_save(
        &mut self,
        projects: &[Project],
        selected_project_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let payload = PayloadRef {
            projects,
            selected_project_id: selected_project_id.filter(|id| !id.is_empty()),
        };
        let raw = serde_json::to_string(&payload).map_err(StoreError::Serialize)?;
        self.store.set(&self.key, &raw)?;
        tracing::debug!(key = %self.key, projects = projects.len(), "Saved state");
        Ok(())
    }

    fn try_load(&self) -> Result<Option<LoadedState>, StoreError> {
        let raw = match self.store.get(&self.key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };

        let payload: Payload = serde_json::from_str(&raw).map_err(StoreError::Parse)?;
        Ok(Some(LoadedState {
            projects: payload.projects.unwrap_or_default(),
            selected_project_id: payload.selected_project_id.filter(|id| !id.is_empty()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, TodoData};
    use pretty_assertions::assert_eq;

    /// A store whose every operation fails
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("quota exceeded".to_string()))
        }
    }

    fn sample_projects() -> Vec<Project> {
        let mut inbox = Project::new("Inbox");
        inbox.add_todo(TodoData {
            priority: Some(Priority::High),
            due_date: Some("2024-05-01".into()),
            ..TodoData::new("Pay rent")
        });
        let work = Project::new("Work");
        vec![inbox, work]
    }

    #[test]
    fn test_load_without_payload_is_none() {
        let storage = Storage::new(MemoryStore::new());
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let projects = sample_projects();
        let selected = projects[1].id().to_string();

        let mut storage = Storage::new(MemoryStore::new());
        storage.save(&projects, Some(&selected));

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.projects, projects);
        assert_eq!(loaded.selected_project_id, Some(selected));
        assert_eq!(storage.store().write_count(), 1);
    }

    #[test]
    fn test_payload_shape() {
        let project = Project::from(crate::models::ProjectData {
            id: Some("pr_1".to_string()),
            title: Some("Inbox".to_string()),
            todos: None,
        });

        let mut storage = Storage::new(MemoryStore::new());
        storage.save(std::slice::from_ref(&project), None);

        let raw = storage.store().get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "projects": [{ "id": "pr_1", "title": "Inbox", "todos": [] }],
                "selectedProjectId": null
            })
        );
    }

    #[test]
    fn test_empty_selected_id_is_stored_as_null() {
        let mut storage = Storage::new(MemoryStore::new());
        storage.save(&sample_projects(), Some(""));
        assert_eq!(storage.load().unwrap().selected_project_id, None);
    }

    #[test]
    fn test_corrupt_payload_loads_as_none() {
        let storage = Storage::new(MemoryStore::with_entry(STORAGE_KEY, "{not json"));
        assert_eq!(storage.load(), None);

        let storage = Storage::new(MemoryStore::with_entry(STORAGE_KEY, "null"));
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn test_empty_payload_loads_as_none() {
        let storage = Storage::new(MemoryStore::with_entry(STORAGE_KEY, ""));
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn test_missing_projects_field_is_empty_list() {
        let storage = Storage::new(MemoryStore::with_entry(
            STORAGE_KEY,
            r#"{"selectedProjectId": "pr_gone"}"#,
        ));
        let loaded = storage.load().unwrap();
        assert!(loaded.projects.is_empty());
        assert_eq!(loaded.selected_project_id.as_deref(), Some("pr_gone"));
    }

    #[test]
    fn test_store_failures_are_swallowed() {
        let mut storage = Storage::new(BrokenStore);
        storage.save(&sample_projects(), None);
        assert_eq!(storage.load(), None);
    }

    #[test]
    fn test_custom_key_is_isolated() {
        let mut storage = Storage::with_key(MemoryStore::new(), "other");
        storage.save(&sample_projects(), None);

        assert_eq!(storage.key(), "other");
        assert!(storage.store().get(STORAGE_KEY).unwrap().is_none());

        let default_key = Storage::new(storage.into_store());
        assert_eq!(default_key.load(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("key").unwrap(), None);
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("value"));
        store.set("key", "second").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join("nested").join("key.json.tmp").exists());
    }

    #[test]
    fn test_file_store_backs_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            dir: dir.path().to_path_buf(),
        };
        let projects = sample_projects();

        let mut storage = Storage::new(FileStore::with_config(&config));
        storage.save(&projects, Some(projects[0].id()));

        let reopened = Storage::new(FileStore::with_config(&config));
        assert_eq!(reopened.load().unwrap().projects, projects);
        assert!(dir.path().join(format!("{}.json", STORAGE_KEY)).exists());
    }
}
