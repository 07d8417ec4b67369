mod execute;

use clap::Args;

/// Main detector results for a run range and detector
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  mollerdb main-detector-results -s 1000 -e 1100 -d md1
  mollerdb main-detector-results -s 1000 -e 1000 -d md1 --format json")]
pub struct MainDetectorResultsCmd {
    /// First run of the range (inclusive)
    #[arg(short = 's', long)]
    pub start_run: i64,

    /// Last run of the range (inclusive)
    #[arg(short = 'e', long)]
    pub end_run: i64,

    /// Main detector name (e.g., md1)
    #[arg(short, long)]
    pub detector: String,
}
