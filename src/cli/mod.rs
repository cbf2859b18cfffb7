//! CLI module
//!
//! - serve: start the HTTP API over the configured entities
//! - query: one-shot filter-mode query, parameter bag on stdin
//! - search: one-shot search-mode query, parameter bag on stdin

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{query, run, run_command, search, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
