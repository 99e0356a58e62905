//! CLI module
//!
//! This module provides the command-line interface for taskpad. Each command
//! opens the file-backed state, runs one [`ProjectManager`] operation and prints
//! the result.

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::{
    dates::{self, DueDateInput},
    manager::ProjectManager,
    models::{Priority, Project, Todo, TodoData, TodoFilter, TodoUpdate},
    storage::{FileStore, KeyValueStore, Storage, StoreConfig, DEFAULT_STORE_DIR},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory the state is saved in
    #[arg(long, env = "TASKPAD_DIR", default_value = DEFAULT_STORE_DIR, global = true)]
    store_dir: PathBuf,

    /// Increase log output (-v for info, -vv for debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List all projects
    Projects,

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Todo management commands
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },

    /// Checklist commands
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Add a new project
    Add {
        /// Project title
        title: String,

        /// Select the new project afterwards
        #[arg(long)]
        select: bool,
    },

    /// Select the project new todos go into
    Select {
        /// Project id
        id: String,
    },
}

#[derive(Subcommand)]
enum TodoCommands {
    /// Add a todo to the selected project
    Add {
        /// Todo title
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Due date (e.g. 2024-05-01 or an RFC 3339 timestamp)
        #[arg(long)]
        due: Option<String>,

        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List todos of the selected project
    List {
        /// Only show todos with this priority
        #[arg(short, long)]
        priority: Option<Priority>,

        /// Only show todos whose title, description or notes contain this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Update fields of a todo
    Update {
        /// Todo id
        todo_id: String,

        #[command(flatten)]
        target: ProjectTarget,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,

        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Toggle a todo between open and completed
    Toggle {
        todo_id: String,

        #[command(flatten)]
        target: ProjectTarget,
    },

    /// Remove a todo
    Remove {
        todo_id: String,

        #[command(flatten)]
        target: ProjectTarget,
    },
}

#[derive(Subcommand)]
enum CheckCommands {
    /// Add a checklist item to a todo
    Add {
        todo_id: String,

        /// Item text
        text: String,

        #[command(flatten)]
        target: ProjectTarget,
    },

    /// Toggle a checklist item
    Toggle {
        todo_id: String,
        item_id: String,

        #[command(flatten)]
        target: ProjectTarget,
    },

    /// Remove a checklist item
    Remove {
        todo_id: String,
        item_id: String,

        #[command(flatten)]
        target: ProjectTarget,
    },
}

#[derive(clap::Args)]
struct ProjectTarget {
    /// Project holding the todo (defaults to the selected project)
    #[arg(long)]
    project: Option<String>,
}

/// Run the CLI application
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        let bin_name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, bin_name, &mut io::stdout());
        return Ok(());
    }

    let config = StoreConfig {
        dir: cli.store_dir.clone(),
    };
    let mut manager = ProjectManager::open(Storage::new(FileStore::with_config(&config)));

    match cli.command {
        Commands::Projects => {
            print_projects(&manager);
            Ok(())
        }
        Commands::Project { command } => run_project_command(&mut manager, command),
        Commands::Todo { command } => run_todo_command(&mut manager, command),
        Commands::Check { command } => run_check_command(&mut manager, command),
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_project_command<S: KeyValueStore>(
    manager: &mut ProjectManager<S>,
    command: ProjectCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        ProjectCommands::Add { title, select } => {
            let id = manager.add_project(Some(title.trim())).id().to_string();
            if select {
                manager.select_project(&id);
            }
            println!("Added project \"{}\" ({})", title.trim(), id);
            Ok(())
        }
        ProjectCommands::Select { id } => {
            if !manager.select_project(&id) {
                return Err(format!("No project with id {}", id).into());
            }
            print_projects(manager);
            Ok(())
        }
    }
}

fn run_todo_command<S: KeyValueStore>(
    manager: &mut ProjectManager<S>,
    command: TodoCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        TodoCommands::Add {
            title,
            description,
            due,
            priority,
            notes,
        } => {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err("A todo needs a title".into());
            }

            let data = TodoData {
                title: Some(title),
                description,
                due_date: due.map(parse_due).transpose()?,
                priority,
                notes,
                ..Default::default()
            };

            match manager.add_todo_to_selected(data) {
                Some(todo) => {
                    println!("Added todo:");
                    print_todo(todo, chrono::Local::now().date_naive());
                    Ok(())
                }
                None => Err("No project selected. Use 'project select <id>' first.".into()),
            }
        }

        TodoCommands::List { priority, search } => {
            let project = manager
                .selected_project()
                .ok_or("No project selected. Use 'project select <id>' first.")?;
            let filter = TodoFilter { priority, search };
            print_project_todos(project, &filter);
            Ok(())
        }

        TodoCommands::Update {
            todo_id,
            target,
            title,
            description,
            notes,
            due,
            clear_due,
            priority,
        } => {
            let project_id = resolve_project(manager, &target)?;
            let due_date = if clear_due {
                Some(None)
            } else {
                due.map(parse_due).transpose()?.map(Some)
            };

            let updates = TodoUpdate {
                title,
                description,
                notes,
                due_date,
                priority,
                ..Default::default()
            };
            if updates.is_empty() {
                return Err("Nothing to update".into());
            }

            let todo = manager
                .update_todo(&project_id, &todo_id, updates)
                .ok_or_else(|| not_found(&project_id, &todo_id))?;
            println!("Updated todo:");
            print_todo(todo, chrono::Local::now().date_naive());
            Ok(())
        }

        TodoCommands::Toggle { todo_id, target } => {
            let project_id = resolve_project(manager, &target)?;
            if !manager.toggle_todo(&project_id, &todo_id) {
                return Err(not_found(&project_id, &todo_id));
            }
            if let Some(todo) = manager
                .project(&project_id)
                .and_then(|p| p.find_todo(&todo_id))
            {
                print_todo(todo, chrono::Local::now().date_naive());
            }
            Ok(())
        }

        TodoCommands::Remove { todo_id, target } => {
            let project_id = resolve_project(manager, &target)?;
            if !manager.remove_todo(&project_id, &todo_id) {
                return Err(not_found(&project_id, &todo_id));
            }
            println!("Removed todo {}", todo_id);
            Ok(())
        }
    }
}

fn run_check_command<S: KeyValueStore>(
    manager: &mut ProjectManager<S>,
    command: CheckCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        CheckCommands::Add {
            todo_id,
            text,
            target,
        } => {
            let project_id = resolve_project(manager, &target)?;
            let item = manager
                .add_checklist_item(&project_id, &todo_id, &text)
                .ok_or_else(|| not_found(&project_id, &todo_id))?;
            println!("Added checklist item \"{}\" ({})", item.text(), item.id());
            Ok(())
        }

        CheckCommands::Toggle {
            todo_id,
            item_id,
            target,
        } => {
            let project_id = resolve_project(manager, &target)?;
            if !manager.toggle_checklist_item(&project_id, &todo_id, &item_id) {
                return Err(format!("No checklist item {} on todo {}", item_id, todo_id).into());
            }
            println!("Toggled checklist item {}", item_id);
            Ok(())
        }

        CheckCommands::Remove {
            todo_id,
            item_id,
            target,
        } => {
            let project_id = resolve_project(manager, &target)?;
            if !manager.remove_checklist_item(&project_id, &todo_id, &item_id) {
                return Err(format!("No checklist item {} on todo {}", item_id, todo_id).into());
            }
            println!("Removed checklist item {}", item_id);
            Ok(())
        }
    }
}

/// Picks the explicit `--project` or falls back to the selected project
fn resolve_project<S: KeyValueStore>(
    manager: &ProjectManager<S>,
    target: &ProjectTarget,
) -> Result<String, Box<dyn std::error::Error>> {
    match &target.project {
        Some(id) => Ok(id.clone()),
        None => manager
            .selected_project_id()
            .map(str::to_string)
            .ok_or_else(|| "No project selected. Pass --project <id>.".into()),
    }
}

/// Rejects due dates the normalizer would silently drop
fn parse_due(raw: String) -> Result<DueDateInput, Box<dyn std::error::Error>> {
    if raw.trim().is_empty() || dates::normalize_due_date(&raw).is_some() {
        Ok(DueDateInput::Text(raw))
    } else {
        Err(format!("Unrecognized due date `{}`; try YYYY-MM-DD", raw).into())
    }
}

fn not_found(project_id: &str, todo_id: &str) -> Box<dyn std::error::Error> {
    format!("No todo {} in project {}", todo_id, project_id).into()
}

fn print_projects<S: KeyValueStore>(manager: &ProjectManager<S>) {
    println!("Projects:");
    for project in manager.projects() {
        let is_selected = manager.selected_project_id() == Some(project.id());
        let marker = if is_selected { "→ " } else { "  " };
        let title = if is_selected {
            project.title().bold().to_string()
        } else {
            project.title().to_string()
        };
        println!(
            "{}{} ({}) - {}",
            marker,
            title,
            project.id().dimmed(),
            project.summary()
        );
    }
}

fn print_project_todos(project: &Project, filter: &TodoFilter) {
    println!("{}", project.title().bold());
    println!("{}\n", project.summary().dimmed());

    let today = chrono::Local::now().date_naive();
    let mut shown = 0;
    for todo in project.filtered_todos(filter) {
        print_todo(todo, today);
        println!();
        shown += 1;
    }

    if shown == 0 {
        println!("No todos match your filter.");
    }
}

fn priority_label(priority: Priority) -> colored::ColoredString {
    let label = match priority {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    };
    match priority {
        Priority::Low => label.green(),
        Priority::Medium => label.yellow(),
        Priority::High => label.red(),
    }
}

fn print_todo(todo: &Todo, today: chrono::NaiveDate) {
    let status = if todo.is_completed() { "[✓]" } else { "[ ]" };
    let title = if todo.is_completed() {
        todo.title().strikethrough().dimmed().to_string()
    } else {
        todo.title().to_string()
    };

    let mut meta = dates::format_due_date(todo.due_date());
    if todo.is_overdue_on(today) {
        meta = format!("{} {}", "Overdue".red().bold(), meta);
    }

    println!(
        "{} {} {} ({})",
        status,
        title,
        priority_label(todo.priority()),
        todo.id().dimmed()
    );
    println!("    {}", meta);

    if !todo.description().is_empty() {
        println!("    {}", todo.description());
    }
    if !todo.notes().is_empty() {
        println!("    Notes: {}", todo.notes());
    }

    if !todo.checklist().is_empty() {
        let (done, total) = todo.checklist_progress();
        println!("    Checklist {}/{}:", done, total);
        for item in todo.checklist() {
            let mark = if item.is_done() { "[x]" } else { "[ ]" };
            println!("      {} {} ({})", mark, item.text(), item.id().dimmed());
        }
    }
}
