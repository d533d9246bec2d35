//! `crmnote` command line entry point.
//!
//! # Responsibility
//! - Provide a thin operator surface over `crmnote_core` (add, list, group).
//! - Print machine-readable JSON so output can be piped into other tools.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crmnote_core::db::open_db;
use crmnote_core::{
    default_log_level, init_logging, Closure, NoteDraft, NoteService, SqliteNoteRepository,
};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "crmnote", version, about = "Contact notes with duplicate grouping")]
struct Cli {
    /// SQLite database file; created and migrated on first use.
    #[arg(long, global = true, env = "CRMNOTE_DB", default_value = "crmnote.sqlite3")]
    db: PathBuf,

    /// Log level (trace|debug|info|warn|error). Defaults by build mode.
    #[arg(long, global = true, env = "CRMNOTE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, global = true, env = "CRMNOTE_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core linkage.
    Ping,
    /// Store one contact note.
    Add {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        telephone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        /// Calendar date, `YYYY-MM-DD`.
        #[arg(long)]
        custom_date: Option<String>,
        /// Repeatable label name.
        #[arg(long = "label")]
        labels: Vec<String>,
        /// Free text of the note.
        #[arg(default_value = "")]
        text: String,
    },
    /// List all notes, newest first.
    List,
    /// Print notes grouped by shared email, telephone or name.
    Grouped {
        /// Use the legacy one-pass expansion instead of full closure.
        #[arg(long)]
        single_pass: bool,
    },
}

fn main() -> Result<()> {
    run(Cli::parse())
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Command::Ping => {
            println!("crmnote_core ping={}", crmnote_core::ping());
            println!("crmnote_core version={}", crmnote_core::core_version());
        }
        Command::Add {
            first_name,
            last_name,
            email,
            telephone,
            address,
            gender,
            custom_date,
            labels,
            text,
        } => {
            let draft = NoteDraft {
                first_name,
                last_name,
                email,
                telephone,
                address,
                note_text: text,
                custom_date,
                gender,
                labels: (!labels.is_empty()).then_some(labels),
            };
            let note = with_service(&cli.db, |service| Ok(service.create_note(draft)?))?;
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        Command::List => {
            let notes = with_service(&cli.db, |service| Ok(service.list_notes()?))?;
            println!("{}", serde_json::to_string_pretty(&notes)?);
        }
        Command::Grouped { single_pass } => {
            let closure = if single_pass {
                Closure::SinglePass
            } else {
                Closure::FixedPoint
            };
            let grouped = with_service(&cli.db, |service| Ok(service.grouped_notes(closure)?))?;
            info!(
                "event=cli_grouped module=cli status=ok groups={}",
                grouped.groups.len()
            );
            println!("{}", serde_json::to_string_pretty(&grouped.groups)?);
        }
    }

    Ok(())
}

/// Opens and migrates the database, then runs `run` against a note service.
fn with_service<T>(
    db: &Path,
    run: impl FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> Result<T>,
) -> Result<T> {
    let mut conn =
        open_db(db).with_context(|| format!("failed to open database `{}`", db.display()))?;
    let repo = SqliteNoteRepository::try_new(&mut conn)?;
    let mut service = NoteService::new(repo);
    run(&mut service)
}
