//! Spendlog CLI - Personal expense tracking in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{auth, categories, expense, stats, Globals};

/// Env var holding the log filter, e.g. `SPENDLOG_LOG=spendlog_core=debug`
const LOG_ENV: &str = "SPENDLOG_LOG";

/// Spendlog - personal expense tracking in your terminal
#[derive(Parser)]
#[command(name = "sl", version, about, long_about = None)]
struct Cli {
    /// Data directory (default: ~/.spendlog)
    #[arg(long, global = true, env = "SPENDLOG_DIR")]
    data_dir: Option<PathBuf>,

    /// Session token (default: the one saved by `sl login`)
    #[arg(long, global = true, env = "SPENDLOG_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign in and save the session token
    Login {
        /// Email address
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Forget the saved session token
    Logout,

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record an expense
    Add {
        /// Amount, at most two decimal places
        #[arg(long)]
        amount: String,
        /// Category key or alias (see `sl categories`)
        #[arg(long)]
        category: String,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List expenses, newest first
    List {
        /// Earliest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Latest date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// Only this category key
        #[arg(long)]
        category: Option<String>,
        /// Page size
        #[arg(long)]
        limit: Option<String>,
        /// Records to skip
        #[arg(long)]
        offset: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one expense
    Show {
        /// Expense ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an expense
    Edit {
        /// Expense ID
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
        /// Replace the note
        #[arg(long, conflicts_with = "clear_note")]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Spending statistics for the current day, week or month
    Stats {
        /// day, week or month
        #[arg(long, default_value = "month")]
        period: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the expense categories
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let globals = Globals::resolve(cli.data_dir, cli.token)?;

    match cli.command {
        Commands::Register { name, email, password, json } => {
            auth::register(&globals, name, email, password, json).await
        }
        Commands::Login { email, password, json } => {
            auth::login(&globals, email, password, json).await
        }
        Commands::Logout => auth::logout(&globals),
        Commands::Whoami { json } => auth::whoami(&globals, json).await,
        Commands::Add { amount, category, date, note, json } => {
            expense::add(&globals, &amount, category, date, note, json).await
        }
        Commands::List { start_date, end_date, category, limit, offset, json } => {
            let query = spendlog_core::ExpenseQuery {
                start_date,
                end_date,
                category,
                limit,
                offset,
            };
            expense::list(&globals, query, json).await
        }
        Commands::Show { id, json } => expense::show(&globals, &id, json).await,
        Commands::Edit { id, amount, category, date, note, clear_note, json } => {
            let note = match (note, clear_note) {
                (_, true) => Some(None),
                (Some(note), false) => Some(Some(note)),
                (None, false) => None,
            };
            expense::edit(&globals, &id, amount, category, date, note, json).await
        }
        Commands::Delete { id, force } => expense::delete(&globals, &id, force).await,
        Commands::Stats { period, json } => stats::run(&globals, &period, json).await,
        Commands::Categories { json } => categories::run(json),
    }
}
