//! # taskslot
//!
//! A terminal task planner. Type a task the way you would say it and
//! taskslot works out the date, time, duration, priority and category; for
//! tasks without a time it proposes free slots in your day.
//!
//! ## Usage
//!
//! ```bash
//! # Natural-language entry
//! taskslot add "client meeting tomorrow 3pm p1 1h work"
//! taskslot add "gym next fri 7am 45m"
//!
//! # Explicit fields
//! taskslot new --name "File taxes" --category finance --priority 2 --due 2026-04-10
//!
//! # List (active tasks, ordered by priority, due date, start time)
//! taskslot list
//! taskslot list --all
//!
//! # Suggest slots for unscheduled tasks, then commit one
//! taskslot plan --date 2026-03-11
//! taskslot solidify 4 10:30 --date 2026-03-11
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/taskslot/tasks.db`
//! *   macOS: `~/Library/Application Support/taskslot/tasks.db`
//!
//! Override with `TASKSLOT_DB` (a `.json` path uses a JSON file instead of
//! SQLite) or with `database = "..."` in `~/.config/taskslot/config.toml`.

use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use taskslot::assistant::ModelService;
use taskslot::commands::*;
use taskslot::config::Config;
use taskslot::models::{TaskInput, TaskPatch};
use taskslot::planner::Planner;

#[derive(Parser)]
#[command(name = "taskslot")]
#[command(about = "Natural-language task planner with slot suggestions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task from free-form text
    Add {
        /// e.g. "meeting tomorrow 3pm p1 1h"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Add a task from explicit fields
    New {
        /// Task name
        #[arg(short, long)]
        name: String,
        /// work, study, personal, home, finance, health or general
        #[arg(short, long)]
        category: Option<String>,
        /// 1 (most urgent) to 5
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,
        /// Due date in YYYY-MM-DD (default today)
        #[arg(short, long)]
        due: Option<String>,
        /// Start time in HH:MM
        #[arg(short, long)]
        start: Option<String>,
        /// Duration in minutes
        #[arg(short = 'm', long, allow_negative_numbers = true)]
        duration: Option<i64>,
    },
    /// List tasks
    List {
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a task
    Edit {
        id: u64,
        /// New task name
        #[arg(short, long)]
        name: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New priority
        #[arg(short, long, allow_negative_numbers = true)]
        priority: Option<i64>,
        /// New due date ("" to clear)
        #[arg(short, long)]
        due: Option<String>,
        /// New start time ("" to unschedule)
        #[arg(short, long)]
        start: Option<String>,
        /// New duration in minutes
        #[arg(short = 'm', long, allow_negative_numbers = true)]
        duration: Option<i64>,
        /// New status (active or done)
        #[arg(long)]
        status: Option<String>,
    },
    /// Mark a task as done
    Done {
        id: u64,
    },
    /// Remove a task
    Remove {
        id: u64,
    },
    /// Show how a command would be parsed, without saving it
    Parse {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Suggest time slots for unscheduled tasks
    Plan {
        /// Date in YYYY-MM-DD (default today)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Commit a time slot to a task
    Solidify {
        id: u64,
        /// Start time in HH:MM
        time: String,
        /// Move the task to this date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Suggest a category and priority for a title
    Hint {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Talk to the assistant
    Chat {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Compare the id registry with the database
    Check,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

fn init_logging(config: &Config) {
    let fallback = config.log_filter.clone().unwrap_or_else(|| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    init_logging(&config);

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "taskslot", &mut io::stdout());
            return;
        }
        Commands::Hint { text } => {
            cmd_hint(&text.join(" "));
            return;
        }
        _ => {}
    }

    let planner = match Planner::open(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error opening {}: {}", config.database_path().display(), e);
            std::process::exit(2);
        }
    };

    let result = match cli.command {
        Commands::Add { text } => cmd_add(&planner, &text.join(" ")),
        Commands::New { name, category, priority, due, start, duration } => cmd_new(
            &planner,
            TaskInput {
                name,
                category,
                priority,
                deadline: due,
                start_time: start,
                duration,
                status: None,
            },
        ),
        Commands::List { all } => cmd_list(&planner, all),
        Commands::Edit { id, name, category, priority, due, start, duration, status } => cmd_edit(
            &planner,
            id,
            TaskPatch {
                name,
                category,
                priority,
                deadline: due,
                start_time: start,
                duration,
                status,
            },
        ),
        Commands::Done { id } => cmd_done(&planner, id),
        Commands::Remove { id } => cmd_remove(&planner, id),
        Commands::Parse { text } => cmd_parse(&planner, &text.join(" ")),
        Commands::Plan { date } => cmd_plan(&planner, date),
        Commands::Solidify { id, time, date } => cmd_solidify(&planner, id, &time, date.as_deref()),
        Commands::Chat { message } => {
            cmd_chat(&planner, Arc::new(ModelService::unconfigured()), &message.join(" "));
            Ok(())
        }
        Commands::Check => cmd_check(&planner),
        Commands::Completions { .. } | Commands::Hint { .. } => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
