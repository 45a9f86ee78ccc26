//! CLI module for educloud.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version display
//! - Command execution against a [`CloudContext`]
//!
//! # Usage
//!
//! ```ignore
//! use educloud::cli::{parse_args, run_cli_command};
//!
//! let command = parse_args(std::env::args());
//! let exit_code = run_cli_command(command, &ctx).await;
//! std::process::exit(exit_code);
//! ```

pub mod args;
pub mod commands;
pub mod version;

pub use args::{parse_args, CliCommand, USAGE};
pub use commands::{error_json, exit_code};
pub use version::{version_line, VERSION};

use serde_json::Value;
use tracing::debug;

use crate::reconcile::CloudContext;

/// Run a command and print its result.
///
/// Returns the process exit code.
pub async fn run_cli_command(command: CliCommand, ctx: &CloudContext) -> i32 {
    let result = match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return 0;
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return 0;
        }
        CliCommand::Invalid(args) => {
            eprintln!("unrecognised command: {}\n\n{}", args, USAGE);
            return 1;
        }
        CliCommand::Key(cmd) => commands::run_key(ctx, cmd).await,
        CliCommand::Sms(cmd) => commands::run_sms(ctx, cmd).await,
        CliCommand::Email(cmd) => commands::run_email(ctx, cmd).await,
        CliCommand::Search(cmd) => commands::run_search(ctx, cmd).await,
    };

    match result {
        Ok(value) => {
            print_json(&value);
            0
        }
        Err(err) => {
            debug!(error = %err, code = err.error_code(), "command failed");
            print_json(&error_json(&err));
            exit_code(&err)
        }
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
