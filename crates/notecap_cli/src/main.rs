//! CLI probe for core linkage and durable capture state.
//!
//! # Responsibility
//! - Verify `notecap_core` linkage without the Flutter/FFI runtime.
//! - Inspect or clear the capture state file left behind on a device dump.

use clap::{Args, Parser, Subcommand};
use notecap_core::db::open_db;
use notecap_core::{CaptureStateRepository, Permission, SqliteCaptureStateRepository};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "notecap", about = "Capture state tooling", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core ping and version
    Ping,
    /// Show the pending capture and deferred permission action
    Inspect(DbArgs),
    /// Clear the pending capture, its target file and any deferred action
    Abandon(DbArgs),
}

#[derive(Args)]
struct DbArgs {
    /// Path to the capture state SQLite file
    #[arg(long)]
    db: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Ping) {
        Commands::Ping => {
            println!("notecap_core ping={}", notecap_core::ping());
            println!("notecap_core version={}", notecap_core::core_version());
            Ok(())
        }
        Commands::Inspect(args) => inspect(&args),
        Commands::Abandon(args) => abandon(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn open_store(args: &DbArgs) -> Result<SqliteCaptureStateRepository, String> {
    if !args.db.is_file() {
        return Err(format!("no capture state file at {}", args.db.display()));
    }
    let conn = open_db(&args.db).map_err(|err| err.to_string())?;
    Ok(SqliteCaptureStateRepository::new(conn))
}

fn inspect(args: &DbArgs) -> Result<(), String> {
    let store = open_store(args)?;
    match store.load_pending().map_err(|err| err.to_string())? {
        Some(target) => {
            println!("pending request_id={}", target.request_id);
            println!("pending kind={}", target.kind.as_str());
            println!("pending uri={}", target.uri);
            println!("pending file={}", target.file_path.display());
            println!("pending file_exists={}", target.file_path.exists());
            println!("pending allocated_at={}", target.allocated_at);
        }
        None => println!("pending none"),
    }
    match store
        .load_deferred(Permission::Camera)
        .map_err(|err| err.to_string())?
    {
        Some(action) => println!(
            "deferred permission={} kind={} continuation={} recorded_at={}",
            action.permission.as_str(),
            action.kind.as_str(),
            action.continuation.as_str(),
            action.recorded_at
        ),
        None => println!("deferred none"),
    }
    Ok(())
}

fn abandon(args: &DbArgs) -> Result<(), String> {
    let store = open_store(args)?;
    if let Some(action) = store
        .take_deferred(Permission::Camera)
        .map_err(|err| err.to_string())?
    {
        println!(
            "cleared deferred permission={} kind={}",
            action.permission.as_str(),
            action.kind.as_str()
        );
    }

    let Some(target) = store.load_pending().map_err(|err| err.to_string())? else {
        println!("pending none");
        return Ok(());
    };
    store
        .clear_pending(target.request_id)
        .map_err(|err| err.to_string())?;
    match std::fs::remove_file(&target.file_path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(format!(
                "cleared {} but could not delete {}: {err}",
                target.request_id,
                target.file_path.display()
            ))
        }
    }
    println!("abandoned request_id={}", target.request_id);
    Ok(())
}
