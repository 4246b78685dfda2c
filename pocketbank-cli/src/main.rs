//! Pocketbank CLI - a PIN-authenticated cash ledger in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{balance, deposit, register, shell, statement, withdraw};

/// Pocketbank - PIN-authenticated cash ledger in your terminal
#[derive(Parser)]
#[command(name = "pb", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new user
    Register {
        /// Display name for the account
        name: String,
    },

    /// Show the current balance
    Balance {
        /// Account name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Deposit an amount
    Deposit {
        /// Account name
        name: String,
        /// Amount to deposit, e.g. 25.00
        amount: String,
        /// Transaction category
        #[arg(long)]
        category: Option<String>,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        /// Skip the large-amount confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw an amount
    Withdraw {
        /// Account name
        name: String,
        /// Amount to withdraw, e.g. 25.00
        amount: String,
        /// Transaction category
        #[arg(long)]
        category: Option<String>,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        /// Skip the large-amount confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show transaction history
    Statement {
        /// Account name
        name: String,
        /// Filter by kind (all, deposit, withdrawal)
        #[arg(long, default_value = "all")]
        kind: String,
        /// Filter by exact category
        #[arg(long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive session (menu-driven, auto-locks when idle)
    Shell {
        /// Account name
        name: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Register { name } => register::run(&name),
        Commands::Balance { name, json } => balance::run(&name, json),
        Commands::Deposit { name, amount, category, note, yes, json } => {
            deposit::run(&name, &amount, category.as_deref(), note.as_deref(), yes, json)
        }
        Commands::Withdraw { name, amount, category, note, yes, json } => {
            withdraw::run(&name, &amount, category.as_deref(), note.as_deref(), yes, json)
        }
        Commands::Statement { name, kind, category, json } => {
            statement::run(&name, &kind, category.as_deref(), json)
        }
        Commands::Shell { name } => shell::run(&name),
    }
}
