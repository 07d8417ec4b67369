use std::error::Error;

use serde::Serialize;

use super::PingCmd;
use crate::commands::Execute;
use crate::db::Database;

/// Where the ping landed. Never carries the password.
#[derive(Debug, Clone, Serialize)]
pub struct PingResult {
    pub host: String,
    pub port: Option<u16>,
    pub dbname: String,
    pub user: String,
    pub backend: String,
    pub state: String,
}

impl Execute for PingCmd {
    type Output = PingResult;

    /// Construction already round-tripped a ping, so this only reports it.
    fn execute(self, db: &mut Database) -> Result<Self::Output, Box<dyn Error>> {
        let config = db.config();
        Ok(PingResult {
            host: config.host().to_string(),
            port: config.port(),
            dbname: config.dbname().to_string(),
            user: config.user().to_string(),
            backend: db.backend_name().unwrap_or("unknown").to_string(),
            state: db.state().to_string(),
        })
    }
}
