use serde::Serialize;

use super::QueriesCmd;
use crate::db::Database;
use crate::db::schema::QueryDef;

/// The registered query catalog.
#[derive(Debug, Clone, Serialize)]
pub struct QueriesResult {
    pub queries: Vec<&'static QueryDef>,
}

impl QueriesCmd {
    /// List the catalog. Needs no connection.
    pub fn list(self) -> QueriesResult {
        QueriesResult {
            queries: Database::catalog().iter().collect(),
        }
    }
}
