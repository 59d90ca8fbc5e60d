//! Responder CLI
//!
//! Replays recorded bus traffic through the listeners and exposes the
//! administrative operations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "responder")]
#[command(
    about = "Responder service - reconcile responder state from bus traffic",
    long_about = None
)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database; overrides `store.path`
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Feed recorded records through the listeners
    Replay(commands::replay::ReplayArgs),
    /// List responders
    List(commands::admin::ListArgs),
    /// Enrolment counters
    Stats,
    /// Create responders from a JSON array
    Create(commands::admin::CreateArgs),
    /// Restore every responder to its creation values
    Reset,
    /// Delete every non-person responder
    Clear,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = commands::Context::open(cli.config.as_deref(), cli.db).and_then(|ctx| {
        let outcome = match cli.command {
            Commands::Replay(args) => commands::replay::execute(&ctx, args),
            Commands::List(args) => commands::admin::list(&ctx, args),
            Commands::Stats => commands::admin::stats(&ctx),
            Commands::Create(args) => commands::admin::create(&ctx, args),
            Commands::Reset => commands::admin::reset(&ctx),
            Commands::Clear => commands::admin::clear(&ctx),
        };
        ctx.close();
        outcome
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
