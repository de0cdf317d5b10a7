//! polymap CLI
//!
//! Command-line interface for the polymap store

use clap::{Parser, Subcommand, ValueEnum};
use polymap_core::logging_facility::{self, Profile};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "polymap")]
#[command(about = "polymap - single-table inheritance store", long_about = None)]
struct Cli {
    /// Database file
    #[arg(long, global = true, env = "POLYMAP_DB", default_value = ".polymap/store.db")]
    db: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the DDL of the mapped layout
    Schema,
    /// Fixture import operations
    Seed(commands::seed::SeedArgs),
    /// Load and print the graph rooted at an entity
    Show(commands::show::ShowArgs),
    /// Run the reference scenario against the database
    Repro,
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(match cli.log_format {
        LogFormat::Human => Profile::Development,
        LogFormat::Json => Profile::Production,
    });

    let result = match cli.command {
        Commands::Schema => commands::schema::execute(),
        Commands::Seed(args) => commands::seed::execute(args, &cli.db),
        Commands::Show(args) => commands::show::execute(args, &cli.db),
        Commands::Repro => commands::repro::execute(&cli.db),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
