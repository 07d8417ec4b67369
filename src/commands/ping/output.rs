//! Output formatting for ping command results.

use super::execute::PingResult;
use crate::output::Outputable;

impl Outputable for PingResult {
    fn to_table(&self) -> String {
        let target = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        format!(
            "{} {}/{} as {} ({})",
            self.backend, target, self.dbname, self.user, self.state
        )
    }
}
