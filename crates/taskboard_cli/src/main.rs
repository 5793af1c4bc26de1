//! Command-line front end for the task board.
//!
//! # Responsibility
//! - Drive board intents (list/add/edit/move/delete/sync) from the shell.
//! - Print tasks as JSON lines so output is scriptable.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use taskboard_core::db::open_db;
use taskboard_core::{
    init_logging, BoardConfig, BoardController, BoardEvent, Connectivity, ConnectivityEvent,
    ConnectivityReconciler, Priority, SimulatedRemote, SqliteTaskStore, Task, TaskDraft, TaskId,
    TaskPatch, TaskRepository, TaskStatus,
};

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Local task board")]
struct Cli {
    /// TOML config file; defaults to ./taskboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks, optionally one lane only.
    List {
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
    },
    /// Create a task in the To Do lane.
    Add {
        title: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Change fields of an existing task. Pass an empty value to clear one.
    Edit {
        id: TaskId,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Move a task to another lane.
    Move {
        id: TaskId,
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Delete a task.
    Delete { id: TaskId },
    /// Reconcile every task with the remote, as on reconnect.
    Sync,
}

#[derive(Args, Debug, Default)]
struct FieldArgs {
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    assignee: Option<String>,
    /// Due date as YYYY-MM-DD.
    #[arg(long)]
    due: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => BoardConfig::load_from(path)?,
        None => BoardConfig::load()?,
    };
    if let Some(log_dir) = &config.logging.log_dir {
        init_logging(&config.logging.level, log_dir)?;
    }

    let conn = open_db(&config.storage.db_path)?;
    let store = SqliteTaskStore::try_new(&conn)?;
    let mut board = BoardController::load(TaskRepository::new(store))?;
    board.subscribe(|event| {
        if let BoardEvent::Error(message) = event {
            eprintln!("{message}");
        }
    });

    match cli.command {
        Command::List { status } => {
            let tasks: Vec<&Task> = match status {
                Some(status) => board.column(status),
                None => board.tasks().iter().collect(),
            };
            for task in tasks {
                print_task(task)?;
            }
        }
        Command::Add { title, fields } => {
            let patch = fields.into_patch(None)?;
            let draft = TaskDraft {
                title,
                description: patch.description.flatten(),
                status: None,
                priority: patch.priority.flatten(),
                assignee: patch.assignee.flatten(),
                due_date: patch.due_date.flatten(),
            };
            print_task(&board.create_task(draft)?)?;
        }
        Command::Edit { id, title, fields } => {
            let patch = fields.into_patch(title)?;
            if patch.is_empty() {
                return Err("nothing to change".into());
            }
            print_task(&board.update_task(id, patch)?)?;
        }
        Command::Move { id, status } => {
            print_task(&board.move_task(id, status)?)?;
        }
        Command::Delete { id } => {
            board.delete_task(id)?;
        }
        Command::Sync => {
            let mut reconciler =
                ConnectivityReconciler::new(Connectivity::Offline, SimulatedRemote::new());
            if let Some(report) = reconciler.handle(ConnectivityEvent::BecameOnline, &mut board) {
                info!(
                    "event=cli_sync module=cli status=ok reconciled={} failed={}",
                    report.reconciled,
                    report.failed.len()
                );
                println!(
                    "{}",
                    serde_json::json!({
                        "reconciled": report.reconciled,
                        "failed": report.failed.iter().map(|(id, _)| id).collect::<Vec<_>>(),
                    })
                );
            }
        }
    }
    Ok(())
}

impl FieldArgs {
    fn into_patch(self, title: Option<String>) -> Result<TaskPatch, Box<dyn Error>> {
        let priority = match self.priority.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(value) => Some(Some(value.parse::<Priority>()?)),
        };
        let due_date = match self.due.as_deref().map(str::trim) {
            None => None,
            Some("") => Some(None),
            Some(value) => Some(Some(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)),
        };
        Ok(TaskPatch {
            title,
            description: self.description.map(Some),
            status: None,
            priority,
            assignee: self.assignee.map(Some),
            due_date,
        })
    }
}

fn parse_status(value: &str) -> Result<TaskStatus, String> {
    value.parse::<TaskStatus>().map_err(|err| err.to_string())
}

fn print_task(task: &Task) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string(task)?);
    Ok(())
}
