use std::io::Write;
use std::path::Path;

use bookops_core::schema_validator::{find_mismatches, parse_column_accesses, parse_pg_schema};

use crate::error::OpsError;
use crate::report::Report;

/// Cross-check a schema export against the columns repository code reads.
pub fn validate<W: Write>(
    schema_path: &Path,
    columns_path: &Path,
    report: &mut Report<W>,
) -> Result<(), OpsError> {
    report.line("PostgreSQL schema validator")?;
    report.rule()?;

    report.section("Parsing PostgreSQL schema...")?;
    let schema = parse_pg_schema(&read(schema_path)?);
    report.info(&format!("Found {} tables", schema.len()))?;

    report.section("Parsing column accesses...")?;
    let accesses = parse_column_accesses(&read(columns_path)?);
    report.info(&format!("Found {} files", accesses.len()))?;

    report.section("Checking for mismatches...")?;
    let mismatches = find_mismatches(&schema, &accesses);
    report.blank()?;
    report.rule()?;

    if mismatches.is_empty() {
        report.ok("All schemas match, no mismatches found")?;
        report.rule()?;
        return Ok(());
    }

    report.error(&format!("Found {} schema mismatches:", mismatches.len()))?;
    for mismatch in &mismatches {
        report.detail(&mismatch.to_string())?;
    }
    report.rule()?;
    Err(OpsError::CheckFailed(format!(
        "{} schema mismatches",
        mismatches.len()
    )))
}

fn read(path: &Path) -> Result<String, OpsError> {
    std::fs::read_to_string(path).map_err(|source| OpsError::File {
        path: path.to_path_buf(),
        source,
    })
}
