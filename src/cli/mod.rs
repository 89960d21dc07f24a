//! CLI module for leadscore
//!
//! Provides command-line interface for:
//! - init: Write a default config and create the data directory
//! - serve: Start the HTTP server
//! - import: Bulk-load historical leads for a tenant
//! - train: Run one training pass for a tenant
//! - stats: Print a tenant's dashboard summary

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{import, init, run, run_command, serve, stats, train};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
