//! Fixture import command
//!
//! Usage: polymap seed import <PATH>

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use super::open_session;

#[derive(Debug, Args)]
pub struct SeedArgs {
    #[command(subcommand)]
    pub command: SeedCommand,
}

#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    /// Import a fixture file into the database
    Import(ImportArgs),
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Path to fixture YAML file or directory
    pub path: PathBuf,
}

/// Execute seed command
pub fn execute(args: SeedArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        SeedCommand::Import(import_args) => execute_import(import_args, db),
    }
}

/// Execute fixture import
///
/// Each file is its own unit of work; a directory is imported in file name
/// order and stops at the first failure.
fn execute_import(args: ImportArgs, db: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(db)?;

    let files = if args.path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&args.path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        files
    } else {
        vec![args.path]
    };

    for file in files {
        println!("Importing {}...", file.display());
        let digest = polymap_store::seed::import_fixture(&file, &mut session)?;
        println!("✓ Imported (digest: {})", digest);
    }

    Ok(())
}
