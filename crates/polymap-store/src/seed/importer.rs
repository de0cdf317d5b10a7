//! Fixture importer orchestration

#![allow(clippy::result_large_err)]

use std::path::Path;
use std::time::Instant;

use crate::errors::Result;
use crate::seed::parser::fixture_graph;
use crate::seed::{compute_fixture_digest, parse_fixture};
use crate::session::Session;
use polymap_core::{log_op_end, log_op_error, log_op_start};

/// Import a fixture file into the session's database
///
/// 1. Parses and validates the fixture YAML
/// 2. Computes the fixture digest
/// 3. Builds the entity graph in file order
/// 4. Persists it as one unit of work
///
/// References to ids outside the fixture must already be stored.
///
/// Returns the fixture digest on success
pub fn import_fixture(path: &Path, session: &mut Session) -> Result<String> {
    let start = Instant::now();
    log_op_start!("import_fixture", path = %path.display());

    let result = parse_fixture(path).and_then(|fixture| {
        let digest = compute_fixture_digest(&fixture)?;
        let graph = fixture_graph(&fixture)?;
        let report = session.persist(&graph)?;
        Ok((digest, report))
    });

    match result {
        Ok((digest, report)) => {
            log_op_end!(
                "import_fixture",
                duration_ms = start.elapsed().as_millis() as u64,
                row_count = report.primary_rows + report.secondary_rows,
                uow_id = %report.uow_id,
                digest = %digest
            );
            Ok(digest)
        }
        Err(err) => {
            log_op_error!(
                "import_fixture",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            Err(err)
        }
    }
}
