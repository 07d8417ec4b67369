use std::error::Error;

use super::MainDetectorResultsCmd;
use crate::commands::Execute;
use crate::db::{Database, QueryResult};

impl Execute for MainDetectorResultsCmd {
    type Output = QueryResult;

    fn execute(self, db: &mut Database) -> Result<Self::Output, Box<dyn Error>> {
        Ok(db.get_main_detector_results(self.start_run, self.end_run, &self.detector)?)
    }
}
