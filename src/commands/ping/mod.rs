mod execute;
mod output;

pub use execute::PingResult;

use clap::Args;

/// Connect and verify the database answers
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  mollerdb -c 'host=localhost dbname=moller user=reader' ping
  MOLLERDB_CONNECTION='host=db dbname=moller user=reader' mollerdb ping --format json")]
pub struct PingCmd {}
