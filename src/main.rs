use clap::{Parser, Subcommand};
use eyre::Result;
use std::path::PathBuf;
use std::process;
use todostore::render::{render_stats, render_todo, render_todos};
use todostore::{OutputFormat, TodoError, TodoStore, default_db_path};
use tracing::Level;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Todo list manager backed by SQLite")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the database file (default: <data dir>/todostore/todos.db)
    #[arg(short, long)]
    db: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log store activity to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new todo
    Add {
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },

    /// List todos
    List {
        /// Only completed todos
        #[arg(long, conflicts_with = "pending")]
        done: bool,

        /// Only pending todos
        #[arg(long)]
        pending: bool,
    },

    /// Mark a todo as completed
    Done { id: i64 },

    /// Mark a completed todo as pending again
    Reopen { id: i64 },

    /// Replace a todo's task text
    Edit {
        id: i64,
        #[arg(required = true, num_args = 1..)]
        task: Vec<String>,
    },

    /// Delete a todo
    Rm { id: i64 },

    /// Remove all completed todos
    Clear,

    /// Show counts of completed and pending todos
    Stats,

    /// Search todos by keyword (case-insensitive)
    Search { keyword: String },

    /// Copy the whole database to another file
    Export { path: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        let code = match e.downcast_ref::<TodoError>() {
            Some(err) if err.is_recoverable() => 1,
            _ => 2,
        };
        process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = cli.db.unwrap_or_else(default_db_path);
    let mut store = TodoStore::open(&path)?;
    let format = cli.format;

    match cli.command {
        Commands::Add { task } => {
            let todo = store.add_todo(&task.join(" "))?;
            println!("{}", render_todo(&todo, format)?);
        }
        Commands::List { done, pending } => {
            let todos = if done {
                store.todos_by_status(true)?
            } else if pending {
                store.todos_by_status(false)?
            } else {
                store.list_todos()?
            };
            println!("{}", render_todos(&todos, format)?);
        }
        Commands::Done { id } => {
            let todo = store.complete_todo(id)?;
            println!("{}", render_todo(&todo, format)?);
        }
        Commands::Reopen { id } => {
            let todo = store.reopen_todo(id)?;
            println!("{}", render_todo(&todo, format)?);
        }
        Commands::Edit { id, task } => {
            let todo = store.update_todo(id, &task.join(" "))?;
            println!("{}", render_todo(&todo, format)?);
        }
        Commands::Rm { id } => {
            store.delete_todo(id)?;
            println!("Deleted todo {}", id);
        }
        Commands::Clear => {
            let removed = store.clear_completed()?;
            println!("Removed {} completed todo(s)", removed);
        }
        Commands::Stats => {
            let stats = store.stats()?;
            println!("{}", render_stats(&stats, format)?);
        }
        Commands::Search { keyword } => {
            let todos = store.search_todos(&keyword)?;
            println!("{}", render_todos(&todos, format)?);
        }
        Commands::Export { path } => {
            store.export_to(&path)?;
            println!("Exported to {}", path.display());
        }
    }

    store.close()?;
    Ok(())
}
