//! The project manager
//!
//! [`ProjectManager`] owns every project, tracks which one is selected, and is the
//! only place the model is mutated from. Each successful mutation writes the full
//! state back through [`Storage`].

use crate::models::{ChecklistItem, Project, ProjectData, ProjectId, Todo, TodoData, TodoUpdate};
use crate::storage::{KeyValueStore, Storage};

/// Title of the project that always exists after [`ProjectManager::init`]
pub const INBOX_TITLE: &str = "Inbox";

pub struct ProjectManager<S: KeyValueStore> {
    projects: Vec<Project>,
    selected_project_id: Option<ProjectId>,
    storage: Storage<S>,
}

impl<S: KeyValueStore> ProjectManager<S> {
    /// Creates an empty manager. Call [`ProjectManager::init`] before use.
    pub fn new(storage: Storage<S>) -> Self {
        Self {
            projects: Vec::new(),
            selected_project_id: None,
            storage,
        }
    }

    /// Creates a manager and immediately runs [`ProjectManager::init`]
    pub fn open(storage: Storage<S>) -> Self {
        let mut manager = Self::new(storage);
        manager.init();
        manager
    }

    /// Loads persisted state, or bootstraps a single selected "Inbox" project.
    ///
    /// Loaded state without an Inbox gets one prepended. That addition is not
    /// written until the next mutation.
    pub fn init(&mut self) {
        match self.storage.load() {
            Some(loaded) if !loaded.projects.is_empty() => {
                let mut projects = loaded.projects;
                if !projects.iter().any(|p| p.title() == INBOX_TITLE) {
                    tracing::info!("Loaded state has no {} project; adding one", INBOX_TITLE);
                    projects.insert(0, Project::new(INBOX_TITLE));
                }

                self.selected_project_id = loaded
                    .selected_project_id
                    .or_else(|| projects.first().map(|p| p.id().to_string()));
                self.projects = projects;

                tracing::info!(projects = self.projects.len(), "Loaded saved state");
            }
            _ => {
                let inbox = Project::new(INBOX_TITLE);
                self.selected_project_id = Some(inbox.id().to_string());
                self.projects = vec![inbox];

                tracing::info!("No saved state; starting with an empty {}", INBOX_TITLE);
                self.persist();
            }
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn selected_project_id(&self) -> Option<&str> {
        self.selected_project_id.as_deref()
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == project_id)
    }

    /// The project the selected id points at, if it still exists
    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_index().map(|index| &self.projects[index])
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    /// Selects an existing project. Unknown ids leave the selection alone.
    pub fn select_project(&mut self, project_id: &str) -> bool {
        if self.project_index(project_id).is_none() {
            tracing::debug!(project_id, "Ignoring selection of unknown project");
            return false;
        }

        self.selected_project_id = Some(project_id.to_string());
        self.persist();
        true
    }

    /// Appends a new project. The selection is not changed.
    pub fn add_project(&mut self, title: Option<&str>) -> &Project {
        let project = Project::from(ProjectData {
            title: title.map(str::to_string),
            ..Default::default()
        });
        tracing::debug!(project_id = project.id(), title = project.title(), "Adding project");

        let index = self.projects.len();
        self.projects.push(project);
        self.persist();
        &self.projects[index]
    }

    /// Adds a todo to the selected project; `None` when nothing is selected
    pub fn add_todo_to_selected(&mut self, data: TodoData) -> Option<&Todo> {
        let Some(project_index) = self.selected_index() else {
            tracing::debug!("No project selected; todo not added");
            return None;
        };

        let todo = Todo::from(data);
        tracing::debug!(todo_id = todo.id(), "Adding todo to selected project");

        let project = &mut self.projects[project_index];
        let todo_index = project.todos().len();
        project.add_todo(todo);
        self.persist();
        Some(&self.projects[project_index].todos()[todo_index])
    }

    /// Applies a partial update to one todo; `None` when either id is unknown
    pub fn update_todo(
        &mut self,
        project_id: &str,
        todo_id: &str,
        updates: TodoUpdate,
    ) -> Option<&Todo> {
        let (project_index, todo_index) = self.locate_todo(project_id, todo_id)?;

        self.projects[project_index].todos_mut()[todo_index].apply_update(updates);
        self.persist();
        Some(&self.projects[project_index].todos()[todo_index])
    }

    /// Removes a todo from a project.
    ///
    /// Returns `false` when the project is unknown or held no such todo. A known
    /// project is saved either way.
    pub fn remove_todo(&mut self, project_id: &str, todo_id: &str) -> bool {
        let Some(project_index) = self.project_index(project_id) else {
            tracing::debug!(project_id, "Unknown project; nothing removed");
            return false;
        };

        let removed = self.projects[project_index].remove_todo(todo_id);
        self.persist();
        removed > 0
    }

    /// Flips a todo's completed flag
    pub fn toggle_todo(&mut self, project_id: &str, todo_id: &str) -> bool {
        let Some((project_index, todo_index)) = self.locate_todo(project_id, todo_id) else {
            return false;
        };

        self.projects[project_index].todos_mut()[todo_index].toggle_complete();
        self.persist();
        true
    }

    pub fn add_checklist_item(
        &mut self,
        project_id: &str,
        todo_id: &str,
        text: &str,
    ) -> Option<&ChecklistItem> {
        let (project_index, todo_index) = self.locate_todo(project_id, todo_id)?;

        self.projects[project_index].todos_mut()[todo_index].add_checklist_item(text);
        self.persist();
        self.projects[project_index].todos()[todo_index]
            .checklist()
            .last()
    }

    /// Flips a checklist item. Returns `false` if any id is unknown.
    pub fn toggle_checklist_item(&mut self, project_id: &str, todo_id: &str, item_id: &str) -> bool {
        let Some((project_index, todo_index)) = self.locate_todo(project_id, todo_id) else {
            return false;
        };

        let toggled = self.projects[project_index].todos_mut()[todo_index].toggle_checklist_item(item_id);
        self.persist();
        toggled
    }

    /// Removes a checklist item. Returns `false` if nothing matched.
    pub fn remove_checklist_item(&mut self, project_id: &str, todo_id: &str, item_id: &str) -> bool {
        let Some((project_index, todo_index)) = self.locate_todo(project_id, todo_id) else {
            return false;
        };

        let removed = self.projects[project_index].todos_mut()[todo_index].remove_checklist_item(item_id);
        self.persist();
        removed > 0
    }

    fn persist(&mut self) {
        self.storage
            .save(&self.projects, self.selected_project_id.as_deref());
    }

    fn project_index(&self, project_id: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.id() == project_id)
    }

    fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_project_id.as_deref()?;
        self.project_index(selected)
    }

    /// Resolves a project and then a todo within it, first match each
    fn locate_todo(&self, project_id: &str, todo_id: &str) -> Option<(usize, usize)> {
        let project_index = self.project_index(project_id).or_else(|| {
            tracing::debug!(project_id, "Unknown project");
            None
        })?;
        let todo_index = self.projects[project_index]
            .todos()
            .iter()
            .position(|t| t.id() == todo_id)
            .or_else(|| {
                tracing::debug!(project_id, todo_id, "Unknown todo");
                None
            })?;
        Some((project_index, todo_index))
    }
}
