// Copyright 2021-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Removes duplicated `pub type` definitions from bindgen generated bindings.
//!
//! Usage: dedup_type_aliases [--output <file>] [--dry-run] <path_to_bindings.rs>
//!
//! Exits with 1 on a usage error, a missing file or any I/O failure.

use anyhow::{Context, Result};
use bindings_tools::bindings_file::{fix_bindings_file, FixError, FixOptions, FixReport};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(name = "dedup_type_aliases", version)]
#[command(about = "Remove duplicate `pub type` definitions from bindgen generated bindings")]
struct Args {
    /// Bindings file to fix
    bindings: PathBuf,

    /// Output file (defaults to overwriting the bindings file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only report duplicate definitions, do not write anything
    #[arg(long)]
    dry_run: bool,

    /// Filter directive for diagnostic logs written to stderr
    #[arg(long, env = "DEDUP_TYPE_ALIASES_LOG", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

fn init_logging(directive: &str) {
    let filter =
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .without_time()
        .init();
}

fn run(options: &FixOptions) -> Result<FixReport> {
    match fix_bindings_file(options) {
        Err(e @ FixError::NotFound(_)) => Err(e.into()),
        result => result.context("failed to fix bindings file"),
    }
}

fn print_report(report: &FixReport) {
    for name in &report.removed {
        println!("  Removing duplicate type definition: {name}");
    }
    if !report.removed.is_empty() {
        println!(
            "Removed {} duplicate type definition(s)",
            report.removed.len()
        );
    }
    match &report.written_to {
        Some(_) => println!("{}", "Bindings file fixed successfully!".green()),
        None => println!("{}", "Dry run, bindings file left unchanged".cyan()),
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return match e.print() {
                Ok(()) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            };
        }
        Err(e) => {
            // Usage errors go to stdout and exit with 1, not clap's 2.
            println!("{}", e.render());
            return ExitCode::FAILURE;
        }
    };
    init_logging(&args.log_level);

    println!(
        "Fixing duplicate type definitions in: {}",
        args.bindings.display()
    );
    let options = FixOptions {
        input: args.bindings,
        output: args.output,
        dry_run: args.dry_run,
    };

    match run(&options) {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red(), e);
            println!("{}", "Failed to fix bindings file!".red());
            ExitCode::FAILURE
        }
    }
}
