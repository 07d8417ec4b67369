//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` impl producing a serializable result (`queries` lists the
//!   catalog directly and never connects)
//! - Table formatting for that result

mod main_detector_results;
mod ping;
mod queries;
mod runs;

pub use main_detector_results::MainDetectorResultsCmd;
pub use ping::{PingCmd, PingResult};
pub use queries::{QueriesCmd, QueriesResult};
pub use runs::RunsCmd;

use clap::Subcommand;
use std::error::Error;

use crate::db::Database;
use crate::output::{OutputFormat, Outputable};

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, db: &mut Database) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect and verify the database answers
    Ping(PingCmd),

    /// List the queries this tool can run
    Queries(QueriesCmd),

    /// Main detector results for a run range and detector
    MainDetectorResults(MainDetectorResultsCmd),

    /// Run metadata for a run range
    Runs(RunsCmd),
}

impl Command {
    /// Execute the command and return formatted output.
    ///
    /// `connect` is only called by commands that talk to the database.
    pub fn run<F>(self, connect: F, format: OutputFormat) -> Result<String, Box<dyn Error>>
    where
        F: FnOnce() -> Result<Database, Box<dyn Error>>,
    {
        match self {
            Command::Queries(cmd) => Ok(cmd.list().format(format)),
            Command::Ping(cmd) => {
                let mut db = connect()?;
                Ok(cmd.execute(&mut db)?.format(format))
            }
            Command::MainDetectorResults(cmd) => {
                let mut db = connect()?;
                Ok(cmd.execute(&mut db)?.format(format))
            }
            Command::Runs(cmd) => {
                let mut db = connect()?;
                Ok(cmd.execute(&mut db)?.format(format))
            }
        }
    }
}
