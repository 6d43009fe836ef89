//! CLI logic for the Wardley map tool.
//!
//! Each subcommand reads one file, runs it through the [`Engine`] and writes
//! text or JSON to a file or stdout.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command};

use std::{
    fs,
    io::{self, Write},
};

use log::{info, warn};
use serde::Serialize;

use wardley::{
    Engine, WardleyError,
    record::MapSnapshot,
    reconcile,
    store::SnapshotStore,
};

use error_adapter::{DiagnosticAdapter, render};

/// Run the Wardley CLI application
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `WardleyError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Syntax and validation errors in the map file
/// - Malformed snapshot JSON
/// - A map that is not canonical under `fmt --check`
pub fn run(args: &Args) -> Result<(), WardleyError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let engine = Engine::new(app_config);

    match &args.command {
        Command::Check { input } => {
            info!(input_path = input; "Checking map");
            let source = fs::read_to_string(input)?;
            let checked = engine.check(&source)?;
            for warning in checked.warnings() {
                warn!("{}", render(&DiagnosticAdapter::new(warning, &source)));
            }
            info!(
                components = checked.parsed().components().len(),
                edges = checked.parsed().edges().len();
                "Map is valid"
            );
        }
        Command::Fmt {
            input,
            output,
            check,
        } => {
            info!(input_path = input, check = *check; "Formatting map");
            let source = fs::read_to_string(input)?;
            if *check {
                if !engine.is_formatted(&source)? {
                    return Err(WardleyError::NotCanonical(input.clone()));
                }
            } else {
                let formatted = engine.format(&source)?;
                write_output(output.as_deref(), &formatted)?;
            }
        }
        Command::Parse { input } => {
            info!(input_path = input; "Parsing map");
            let source = fs::read_to_string(input)?;
            write_json(None, &engine.parse(&source))?;
        }
        Command::Generate { input, output } => {
            info!(input_path = input; "Generating map text");
            let snapshot = read_snapshot(input)?;
            write_output(output.as_deref(), &engine.generate(&snapshot))?;
        }
        Command::Plan {
            input,
            state,
            apply,
            output,
        } => {
            info!(input_path = input, state_path = state; "Planning reconciliation");
            let source = fs::read_to_string(input)?;
            let current = read_snapshot(state)?;
            let plan = engine.plan(&source, &current)?;

            if *apply {
                let mut store = SnapshotStore::new(current);
                let report = reconcile::apply(&plan, &mut store);
                info!(
                    complete = report.is_complete(),
                    failures = report.failures().len();
                    "Plan applied to snapshot"
                );
                write_json(output.as_deref(), &store.into_snapshot())?;
            } else {
                write_json(output.as_deref(), &plan)?;
            }
        }
    }

    Ok(())
}

fn read_snapshot(path: &str) -> Result<MapSnapshot, WardleyError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write `text` plus a final newline to `path`, or to stdout.
fn write_output(path: Option<&str>, text: &str) -> Result<(), WardleyError> {
    match path {
        Some(path) => {
            fs::write(path, format!("{text}\n"))?;
            info!(output_file = path; "Output written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }
    Ok(())
}

fn write_json(path: Option<&str>, value: &impl Serialize) -> Result<(), WardleyError> {
    let json = serde_json::to_string_pretty(value)?;
    write_output(path, &json)
}
