use pretty_assertions::assert_eq;
use taskpad::{
    FileStore, KeyValueStore, MemoryStore, Priority, ProjectManager, Storage, StoreError, Todo,
    TodoData, TodoUpdate, INBOX_TITLE, STORAGE_KEY,
};

/// Accepts reads but refuses every write, like a full browser quota
struct ReadOnlyStore {
    inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}

fn open_memory() -> ProjectManager<MemoryStore> {
    ProjectManager::open(Storage::new(MemoryStore::new()))
}

fn stored_payload(manager: &ProjectManager<MemoryStore>) -> Option<String> {
    manager.storage().store().get(STORAGE_KEY).unwrap()
}

#[test]
fn test_first_run_persists_inbox() {
    let manager = open_memory();

    assert_eq!(manager.projects().len(), 1);
    let inbox = &manager.projects()[0];
    assert_eq!(inbox.title(), INBOX_TITLE);
    assert_eq!(manager.selected_project_id(), Some(inbox.id()));

    let loaded = manager.storage().load().unwrap();
    assert_eq!(loaded.projects.len(), 1);
    assert_eq!(&loaded.projects[0], inbox);
}

#[test]
fn test_add_todo_follows_selection() {
    let mut manager = open_memory();

    let work_id = manager.add_project(Some("Work")).id().to_string();
    // Inbox is still selected, so the todo lands there
    let inbox_todo = manager
        .add_todo_to_selected(TodoData::new("Not for work"))
        .map(|t| t.id().to_string());
    assert!(inbox_todo.is_some());
    assert!(manager.project(&work_id).unwrap().todos().is_empty());

    assert!(manager.select_project(&work_id));
    let todo = manager
        .add_todo_to_selected(TodoData::new("Ship it"))
        .unwrap()
        .clone();

    assert_eq!(todo.title(), "Ship it");
    assert_eq!(todo.priority(), Priority::Medium);
    assert!(!todo.is_completed());

    let work = manager.selected_project().unwrap();
    assert_eq!(work.id(), work_id);
    assert_eq!(work.todos(), std::slice::from_ref(&todo));
}

#[test]
fn test_add_todo_without_selection_returns_none() {
    let raw = r#"{"projects": [{"id": "pr_a", "title": "Inbox"}], "selectedProjectId": "pr_deleted"}"#;
    let mut manager = ProjectManager::open(Storage::new(MemoryStore::with_entry(STORAGE_KEY, raw)));

    // The dangling selection is kept as loaded
    assert_eq!(manager.selected_project_id(), Some("pr_deleted"));
    assert!(manager.selected_project().is_none());

    let before = stored_payload(&manager);
    assert!(manager.add_todo_to_selected(TodoData::new("Lost")).is_none());
    assert_eq!(stored_payload(&manager), before);
}

#[test]
fn test_update_todo_clears_due_date_only_when_key_present() {
    let mut manager = open_memory();
    let project_id = manager.selected_project_id().unwrap().to_string();
    let todo_id = manager
        .add_todo_to_selected(TodoData {
            due_date: Some("2024-05-01".into()),
            ..TodoData::new("Dentist")
        })
        .unwrap()
        .id()
        .to_string();

    let no_key: TodoUpdate = serde_json::from_str(r#"{"description": "6 month checkup"}"#).unwrap();
    let todo = manager.update_todo(&project_id, &todo_id, no_key).unwrap();
    assert!(todo.due_date().is_some());
    assert_eq!(todo.description(), "6 month checkup");

    let explicit_null: TodoUpdate = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
    let todo = manager
        .update_todo(&project_id, &todo_id, explicit_null)
        .unwrap();
    assert_eq!(todo.due_date(), None);

    let reloaded = manager.storage().load().unwrap();
    let persisted = reloaded.projects[0].find_todo(&todo_id).unwrap();
    assert_eq!(persisted.due_date(), None);
}

#[test]
fn test_update_todo_ignores_blank_priority() {
    let mut manager = open_memory();
    let project_id = manager.selected_project_id().unwrap().to_string();
    let todo_id = manager
        .add_todo_to_selected(TodoData {
            priority: Some(Priority::High),
            ..TodoData::new("Taxes")
        })
        .unwrap()
        .id()
        .to_string();

    let blank: TodoUpdate = serde_json::from_str(r#"{"priority": "", "title": "Taxes 2024"}"#).unwrap();
    let todo = manager.update_todo(&project_id, &todo_id, blank).unwrap();
    assert_eq!(todo.priority(), Priority::High);
    assert_eq!(todo.title(), "Taxes 2024");

    let low: TodoUpdate = serde_json::from_str(r#"{"priority": "low"}"#).unwrap();
    let todo = manager.update_todo(&project_id, &todo_id, low).unwrap();
    assert_eq!(todo.priority(), Priority::Low);
}

#[test]
fn test_remove_missing_todo_leaves_state_unchanged() {
    let mut manager = open_memory();
    let project_id = manager.selected_project_id().unwrap().to_string();
    manager.add_todo_to_selected(TodoData::new("Keep me"));

    let todos_before: Vec<Todo> = manager.selected_project().unwrap().todos().to_vec();
    let payload_before = stored_payload(&manager);

    assert!(!manager.remove_todo(&project_id, "td_not_here"));
    assert_eq!(manager.selected_project().unwrap().todos(), todos_before.as_slice());
    assert_eq!(stored_payload(&manager), payload_before);
}

#[test]
fn test_checklist_lifecycle_through_manager() {
    let mut manager = open_memory();
    let project_id = manager.selected_project_id().unwrap().to_string();
    let todo_id = manager
        .add_todo_to_selected(TodoData::new("Move house"))
        .unwrap()
        .id()
        .to_string();

    let item_id = manager
        .add_checklist_item(&project_id, &todo_id, "x")
        .unwrap()
        .id()
        .to_string();
    assert!(manager.toggle_checklist_item(&project_id, &todo_id, &item_id));

    let todo = manager.project(&project_id).unwrap().find_todo(&todo_id).unwrap();
    assert_eq!(todo.checklist().len(), 1);
    assert_eq!(todo.checklist()[0].text(), "x");
    assert!(todo.checklist()[0].is_done());

    assert!(manager.remove_checklist_item(&project_id, &todo_id, &item_id));
    let todo = manager.project(&project_id).unwrap().find_todo(&todo_id).unwrap();
    assert!(todo.checklist().is_empty());
}

#[test]
fn test_save_failures_do_not_affect_memory_state() {
    let store = ReadOnlyStore {
        inner: MemoryStore::new(),
    };
    let mut manager = ProjectManager::open(Storage::new(store));

    assert_eq!(manager.projects().len(), 1);
    let project_id = manager.selected_project_id().unwrap().to_string();
    let todo_id = manager
        .add_todo_to_selected(TodoData::new("Still here"))
        .unwrap()
        .id()
        .to_string();
    assert!(manager.toggle_todo(&project_id, &todo_id));

    let todo = manager.selected_project().unwrap().find_todo(&todo_id).unwrap();
    assert!(todo.is_completed());
    assert_eq!(manager.storage().load(), None);
}

#[test]
fn test_corrupt_state_starts_fresh() {
    let manager = ProjectManager::open(Storage::new(MemoryStore::with_entry(
        STORAGE_KEY,
        "{\"projects\": [",
    )));

    assert_eq!(manager.projects().len(), 1);
    assert_eq!(manager.projects()[0].title(), INBOX_TITLE);
    // The corrupt payload was overwritten by the bootstrap save
    assert!(manager.storage().load().is_some());
}

#[test]
fn test_reopen_from_file_store() {
    let dir = tempfile::tempdir().unwrap();

    let (project_id, todo_id) = {
        let mut manager = ProjectManager::open(Storage::new(FileStore::new(dir.path())));
        let project_id = manager.add_project(Some("Garden")).id().to_string();
        manager.select_project(&project_id);
        let todo_id = manager
            .add_todo_to_selected(TodoData {
                priority: Some(Priority::High),
                due_date: Some("2030-04-01".into()),
                notes: Some("before the frost ends".to_string()),
                ..TodoData::new("Plant tomatoes")
            })
            .unwrap()
            .id()
            .to_string();
        manager.add_checklist_item(&project_id, &todo_id, "Buy seedlings");
        (project_id, todo_id)
    };

    let reopened = ProjectManager::open(Storage::new(FileStore::new(dir.path())));
    assert_eq!(reopened.selected_project_id(), Some(project_id.as_str()));

    let titles: Vec<&str> = reopened.projects().iter().map(|p| p.title()).collect();
    assert_eq!(titles, vec![INBOX_TITLE, "Garden"]);

    let todo = reopened
        .project(&project_id)
        .and_then(|p| p.find_todo(&todo_id))
        .unwrap();
    assert_eq!(todo.title(), "Plant tomatoes");
    assert_eq!(todo.priority(), Priority::High);
    assert_eq!(todo.notes(), "before the frost ends");
    assert_eq!(todo.checklist()[0].text(), "Buy seedlings");
    assert_eq!(
        todo.due_date().map(taskpad::dates::to_iso_string).as_deref(),
        Some("2030-04-01T00:00:00.000Z")
    );
}
