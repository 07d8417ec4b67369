mod execute;
mod output;

pub use execute::QueriesResult;

use clap::Args;

/// List the queries this tool can run, with their parameters and columns
#[derive(Args, Debug)]
pub struct QueriesCmd {}
