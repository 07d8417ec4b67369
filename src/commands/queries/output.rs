//! Output formatting for the query catalog.

use super::execute::QueriesResult;
use crate::output::Outputable;

fn signature<'a>(fields: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    fields
        .map(|(name, ty)| format!("{} {}", name, ty))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Outputable for QueriesResult {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Queries ({}):", self.queries.len()));

        for query in &self.queries {
            lines.push(String::new());
            lines.push(query.name.to_string());
            lines.push(format!("  {}", query.description));
            lines.push(format!(
                "  params:  {}",
                signature(query.params.iter().map(|p| (p.name, p.data_type.name())))
            ));
            lines.push(format!(
                "  columns: {}",
                signature(query.columns.iter().map(|c| (c.name, c.data_type.name())))
            ));
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::QueriesCmd;
    use crate::db::schema::RUNS;
    use rstest::{fixture, rstest};

    const RUNS_ONLY_TABLE: &str = "\
Queries (1):

get_runs
  Run metadata for runs in [start_run, end_run]
  params:  start_run int64, end_run int64
  columns: run_number int64, run_type string, start_time timestamp, end_time timestamp, n_mps int64, good_run bool";

    #[fixture]
    fn runs_only() -> QueriesResult {
        QueriesResult {
            queries: vec![&RUNS],
        }
    }

    #[fixture]
    fn full_catalog() -> QueriesResult {
        QueriesCmd {}.list()
    }

    crate::output_test! {
        test_name: test_to_table_single,
        fixture: runs_only,
        fixture_type: QueriesResult,
        table: RUNS_ONLY_TABLE,
    }

    crate::output_test! {
        test_name: test_to_table_full,
        fixture: full_catalog,
        fixture_type: QueriesResult,
        table_contains: [
            "Queries (2):",
            "get_main_detector_results",
            "params:  start_run int64, end_run int64, detector_name string",
        ],
    }

    crate::output_test! {
        test_name: test_format_toon,
        fixture: full_catalog,
        fixture_type: QueriesResult,
        toon: ["get_runs", "detector_name"],
    }
}
