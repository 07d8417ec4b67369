use std::error::Error;

use super::RunsCmd;
use crate::commands::Execute;
use crate::db::{Database, QueryResult};

impl Execute for RunsCmd {
    type Output = QueryResult;

    fn execute(self, db: &mut Database) -> Result<Self::Output, Box<dyn Error>> {
        Ok(db.get_runs(self.start_run, self.end_run)?)
    }
}
