//! CLI definitions and argument parsing.
//!
//! Uses clap derive macros for ergonomic argument definitions.

pub mod args;

use clap::CommandFactory;

/// Print the long help text to stderr.
pub fn print_usage() {
    use std::io::Write;
    let help = args::Cli::command().render_long_help();
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "{help}");
    let _ = handle.flush();
}
