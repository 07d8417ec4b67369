mod execute;

use clap::Args;

/// Run metadata for a run range
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  mollerdb runs -s 1000 -e 1100
  mollerdb runs -s 1000 -e 1100 --format toon")]
pub struct RunsCmd {
    /// First run of the range (inclusive)
    #[arg(short = 's', long)]
    pub start_run: i64,

    /// Last run of the range (inclusive)
    #[arg(short = 'e', long)]
    pub end_run: i64,
}
