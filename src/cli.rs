//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and shared types.
//! Individual command definitions are in the `commands` module.

use clap::Parser;

use crate::commands::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Connection string, e.g. "host=localhost dbname=moller user=reader password=secret".
    /// Falls back to .mollerdb.json, then MOLLERDB_CONNECTION.
    #[arg(short, long, global = true)]
    pub connection: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}
