//! mollerdb library - experiment-data store connector
//!
//! Provides the PostgreSQL connection layer, the fixed query catalog with
//! columnar results, and the command execution and output formatting used by
//! the `mollerdb` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod output;

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
