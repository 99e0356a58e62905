//! taskpad library crate
//!
//! A personal task manager: todos with checklists, grouped into projects, with the
//! whole state persisted to a key-value store after every change.

pub mod cli;
pub mod dates;
pub mod manager;
pub mod models;
pub mod storage;

pub use dates::DueDateInput;
pub use manager::{ProjectManager, INBOX_TITLE};
pub use models::{
    ChecklistItem, ChecklistItemData, Priority, Project, ProjectData, Todo, TodoData, TodoFilter,
    TodoUpdate,
};
pub use storage::{
    FileStore, KeyValueStore, LoadedState, MemoryStore, Storage, StoreConfig, StoreError,
    STORAGE_KEY,
};
