//! Core models for the taskpad library
//!
//! This module contains the projects, todos and checklist items that make up the
//! domain model, along with the loose "data" shapes they are constructed from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::dates::{self, DueDateInput};

pub type ProjectId = String;
pub type TodoId = String;
pub type ChecklistItemId = String;

/// Title given to projects created without one
pub const UNTITLED_PROJECT: &str = "Untitled";

const PROJECT_ID_PREFIX: &str = "pr";
const TODO_ID_PREFIX: &str = "td";
const CHECKLIST_ID_PREFIX: &str = "cl";

/// Generates a prefixed identifier, e.g. `td_3f2a...`
fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Treats absent and empty ids alike and fills them in
fn id_or_generate(id: Option<String>, prefix: &str) -> String {
    match id {
        Some(id) if !id.is_empty() => id,
        _ => generate_id(prefix),
    }
}

/// How urgent a todo is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown priority `{0}`; expected low|medium|high")]
pub struct ParsePriorityError(String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

/// Reads a priority string, dropping values that are empty or unknown
fn lenient_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse() {
        Ok(priority) => Some(priority),
        Err(e) => {
            tracing::debug!("Falling back to default priority: {}", e);
            None
        }
    }))
}

/// Distinguishes a key that is present (even as null) from a missing one
fn explicit_key<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Raw checklist item input; every field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChecklistItemData {
    pub id: Option<String>,
    pub text: Option<String>,
    pub done: Option<bool>,
}

impl ChecklistItemData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// A sub-task of a todo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ChecklistItemData")]
pub struct ChecklistItem {
    id: ChecklistItemId,
    text: String,
    done: bool,
}

impl ChecklistItem {
    /// Creates an unchecked item with a fresh id
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(CHECKLIST_ID_PREFIX),
            text: text.into(),
            done: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    fn toggle(&mut self) {
        self.done = !self.done;
    }
}

impl From<ChecklistItemData> for ChecklistItem {
    fn from(data: ChecklistItemData) -> Self {
        Self {
            id: id_or_generate(data.id, CHECKLIST_ID_PREFIX),
            text: data.text.unwrap_or_default(),
            done: data.done.unwrap_or(false),
        }
    }
}

/// Raw todo input, as produced by a form or read back from storage.
///
/// Every field is optional; [`Todo::from`] fills in the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TodoData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DueDateInput>,
    #[serde(deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
    pub notes: Option<String>,
    pub checklist: Option<Vec<ChecklistItemData>>,
    pub completed: Option<bool>,
}

impl TodoData {
    /// Creates input carrying only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// A single actionable task with metadata and a checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TodoData", rename_all = "camelCase")]
pub struct Todo {
    id: TodoId,
    title: String,
    description: String,
    #[serde(serialize_with = "dates::serialize_due_date")]
    due_date: Option<DateTime<Utc>>,
    priority: Priority,
    notes: String,
    checklist: Vec<ChecklistItem>,
    completed: bool,
}

impl From<TodoData> for Todo {
    fn from(data: TodoData) -> Self {
        Self {
            id: id_or_generate(data.id, TODO_ID_PREFIX),
            title: data.title.unwrap_or_default(),
            description: data.description.unwrap_or_default(),
            due_date: data.due_date.as_ref().and_then(DueDateInput::normalize),
            priority: data.priority.unwrap_or_default(),
            notes: data.notes.unwrap_or_default(),
            checklist: data
                .checklist
                .unwrap_or_default()
                .into_iter()
                .map(ChecklistItem::from)
                .collect(),
            completed: data.completed.unwrap_or(false),
        }
    }
}

impl Todo {
    /// Creates a todo with the given title and default values everywhere else
    pub fn new(title: impl Into<String>) -> Self {
        Self::from(TodoData::new(title))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_date(&self) -> Option<&DateTime<Utc>> {
        self.due_date.as_ref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Flips the completed flag
    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Replaces the due date; `None` or an unusable input clears it
    pub fn set_due_date(&mut self, due: Option<DueDateInput>) {
        self.due_date = due.as_ref().and_then(DueDateInput::normalize);
    }

    /// Appends an unchecked item and returns it
    pub fn add_checklist_item(&mut self, text: impl Into<String>) -> &ChecklistItem {
        let index = self.checklist.len();
        self.checklist.push(ChecklistItem::new(text));
        &self.checklist[index]
    }

    /// Flips the first item with the given id. Missing ids are ignored.
    pub fn toggle_checklist_item(&mut self, item_id: &str) -> bool {
        match self.checklist.iter_mut().find(|item| item.id == item_id) {
            Some(item) => {
                item.toggle();
                true
            }
            None => false,
        }
    }

    /// Removes every item with the given id, returning how many were dropped
    pub fn remove_checklist_item(&mut self, item_id: &str) -> usize {
        let before = self.checklist.len();
        self.checklist.retain(|item| item.id != item_id);
        before - self.checklist.len()
    }

    /// Returns `(done, total)` for the checklist
    pub fn checklist_progress(&self) -> (usize, usize) {
        let done = self.checklist.iter().filter(|item| item.done).count();
        (done, self.checklist.len())
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        dates::is_overdue(self.due_date.as_ref(), self.completed, today)
    }

    pub fn matches(&self, filter: &TodoFilter) -> bool {
        filter.matches(self)
    }

    /// Applies each field present in `updates`.
    ///
    /// The due date goes through [`Todo::set_due_date`] whenever the key is present,
    /// so an explicit `Some(None)` clears it.
    pub(crate) fn apply_update(&mut self, updates: TodoUpdate) {
        if let Some(title) = updates.title {
            self.title = title;
        }
        if let Some(description) = updates.description {
            self.description = description;
        }
        if let Some(notes) = updates.notes {
            self.notes = notes;
        }
        if let Some(completed) = updates.completed {
            self.completed = completed;
        }
        if let Some(checklist) = updates.checklist {
            self.checklist = checklist.into_iter().map(ChecklistItem::from).collect();
        }
        if let Some(due) = updates.due_date {
            self.set_due_date(due);
        }
        if let Some(priority) = updates.priority {
            self.set_priority(priority);
        }
    }
}

impl From<&str> for Todo {
    fn from(title: &str) -> Self {
        Todo::new(title)
    }
}

/// A partial update to a todo. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub completed: Option<bool>,
    pub checklist: Option<Vec<ChecklistItemData>>,
    /// `Some(None)` clears the due date
    #[serde(deserialize_with = "explicit_key")]
    pub due_date: Option<Option<DueDateInput>>,
    #[serde(deserialize_with = "lenient_priority")]
    pub priority: Option<Priority>,
}

impl TodoUpdate {
    /// Check if any fields are set for update.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.completed.is_none()
            && self.checklist.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
    }
}

/// Narrows a project's todos by priority and free-text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    /// Only todos with this priority; `None` means all priorities
    pub priority: Option<Priority>,
    /// Case-insensitive term matched against title, description and notes
    pub search: Option<String>,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        if let Some(priority) = self.priority {
            if todo.priority != priority {
                return false;
            }
        }

        let term = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => term.to_lowercase(),
            _ => return true,
        };

        let haystack = [todo.title(), todo.description(), todo.notes()]
            .join(" ")
            .to_lowercase();
        haystack.contains(&term)
    }
}

/// Raw project input
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectData {
    pub id: Option<String>,
    pub title: Option<String>,
    pub todos: Option<Vec<TodoData>>,
}

/// A named, ordered grouping of todos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectData")]
pub struct Project {
    id: ProjectId,
    title: String,
    todos: Vec<Todo>,
}

impl From<ProjectData> for Project {
    fn from(data: ProjectData) -> Self {
        let title = match data.title {
            Some(title) if !title.is_empty() => title,
            _ => UNTITLED_PROJECT.to_string(),
        };

        Self {
            id: id_or_generate(data.id, PROJECT_ID_PREFIX),
            title,
            todos: data
                .todos
                .unwrap_or_default()
                .into_iter()
                .map(Todo::from)
                .collect(),
        }
    }
}

impl Project {
    /// Creates an empty project; an empty title becomes "Untitled"
    pub fn new(title: impl Into<String>) -> Self {
        Self::from(ProjectData {
            title: Some(title.into()),
            ..Default::default()
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub(crate) fn todos_mut(&mut self) -> &mut [Todo] {
        &mut self.todos
    }

    /// Appends a todo, built from raw data if needed, and returns it
    pub fn add_todo(&mut self, todo: impl Into<Todo>) -> &Todo {
        let index = self.todos.len();
        self.todos.push(todo.into());
        &self.todos[index]
    }

    /// Removes every todo with the given id, returning how many were dropped
    pub fn remove_todo(&mut self, todo_id: &str) -> usize {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != todo_id);
        before - self.todos.len()
    }

    pub fn find_todo(&self, todo_id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == todo_id)
    }

    pub fn find_todo_mut(&mut self, todo_id: &str) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == todo_id)
    }

    /// Todos passing the filter, in display order
    pub fn filtered_todos<'a>(&'a self, filter: &'a TodoFilter) -> impl Iterator<Item = &'a Todo> + 'a {
        self.todos.iter().filter(move |todo| filter.matches(todo))
    }

    /// Count line shown under the project title, e.g. `3 todos`
    pub fn summary(&self) -> String {
        let count = self.todos.len();
        format!("{} {}", count, if count == 1 { "todo" } else { "todos" })
    }
}
