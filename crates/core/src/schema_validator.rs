//! Cross-check of an exported PostgreSQL schema against source-code column
//! accesses.
//!
//! Two text dumps are compared:
//!
//! - a `psql` table export with `table | column | data_type` rows, and
//! - grep output (`file:line:code`) of `row.get("column")` calls in the
//!   application's repository files.
//!
//! Each repository file name is mapped to a table name by a small
//! pluralisation heuristic, and every column the file reads must exist on
//! that table.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Table name to its column names.
pub type SchemaColumns = BTreeMap<String, BTreeSet<String>>;

/// Source file to the column names it reads.
pub type ColumnAccesses = BTreeMap<String, BTreeSet<String>>;

const REPOSITORY_SUFFIX: &str = "_repository.rs";

/// `path:line:code`, matched anywhere in the line. A path that itself holds a
/// colon (`C:\src\...`) keeps only the part after its last colon before the
/// line number.
static GREP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^:]+):\d+:(.*)").expect("valid grep line regex"));

static ROW_GET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"row\.get\("(\w+)"\)"#).expect("valid row.get regex"));

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a `table | column | data_type` schema export.
///
/// Header rows (`table_name`), separator rows (`---`) and rows with an empty
/// table or column are skipped.
pub fn parse_pg_schema(text: &str) -> SchemaColumns {
    let mut tables = SchemaColumns::new();
    for line in text.lines() {
        let mut parts = line.trim().split('|').map(str::trim);
        let (Some(table), Some(column)) = (parts.next(), parts.next()) else {
            continue;
        };
        if table.is_empty() || column.is_empty() {
            continue;
        }
        if table == "table_name" || table.starts_with("---") {
            continue;
        }
        tables
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string());
    }
    tables
}

/// Parse grep output of `row.get("...")` calls, keyed by file.
pub fn parse_column_accesses(text: &str) -> ColumnAccesses {
    let mut accesses = ColumnAccesses::new();
    for line in text.lines() {
        let Some(caps) = GREP_LINE.captures(line) else {
            continue;
        };
        let file = &caps[1];
        let code = &caps[2];
        for get in ROW_GET.captures_iter(code) {
            accesses
                .entry(file.to_string())
                .or_default()
                .insert(get[1].to_string());
        }
    }
    accesses
}

// ---------------------------------------------------------------------------
// Table guessing
// ---------------------------------------------------------------------------

/// Guess the table a repository file reads from.
///
/// `src/booking_repository.rs` becomes `bookings`, `company_repository.rs`
/// becomes `companies`.
pub fn guess_table(file: &str) -> String {
    let file_name = file.rsplit('/').next().unwrap_or(file);
    let base = file_name.replace(REPOSITORY_SUFFIX, "");

    if let Some(stem) = base.strip_suffix('y') {
        format!("{stem}ies")
    } else if base == "accompanying_guest" {
        "accompanying_guests".to_string()
    } else if base == "guest" {
        "guests".to_string()
    } else if !base.ends_with('s') {
        format!("{base}s")
    } else {
        base
    }
}

// ---------------------------------------------------------------------------
// Mismatches
// ---------------------------------------------------------------------------

/// A disagreement between the schema export and the code.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Mismatch {
    /// No table could be matched to the repository file.
    TableGuessFailed { file: String, guessed: String },
    /// The code reads a column the table does not have.
    MissingColumn {
        file: String,
        table: String,
        column: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::TableGuessFailed { file, guessed } => {
                write!(f, "Table guess failed for {file} (guessed: {guessed})")
            }
            Mismatch::MissingColumn {
                file,
                table,
                column,
            } => write!(
                f,
                "{table}: column '{column}' not in PostgreSQL schema (used in {file})"
            ),
        }
    }
}

/// Compare column accesses against the schema.
///
/// Only files whose path contains `_repository.rs` are considered. When the
/// guessed table is unknown and ends in `s`, the singular is tried before
/// giving up. Results are ordered by file, then column.
pub fn find_mismatches(schema: &SchemaColumns, accesses: &ColumnAccesses) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for (file, columns) in accesses {
        if !file.contains(REPOSITORY_SUFFIX) {
            continue;
        }

        let guessed = guess_table(file);
        let table = if schema.contains_key(&guessed) {
            guessed
        } else if let Some(singular) = guessed
            .strip_suffix('s')
            .filter(|s| schema.contains_key(*s))
        {
            singular.to_string()
        } else {
            mismatches.push(Mismatch::TableGuessFailed {
                file: file.clone(),
                guessed,
            });
            continue;
        };

        let known = &schema[&table];
        mismatches.extend(
            columns
                .iter()
                .filter(|c| !known.contains(*c))
                .map(|c| Mismatch::MissingColumn {
                    file: file.clone(),
                    table: table.clone(),
                    column: c.clone(),
                }),
        );
    }

    mismatches
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = "\
 table_name | column_name | data_type
------------+-------------+-----------
 bookings   | id          | integer
 bookings   | grundpreis  | double precision
 guests     | id          | integer
 guests     | vorname     | text
 companies  | id          | integer
 staff      | id          | integer
            | orphan      | text
(6 rows)
";

    #[test]
    fn schema_export_skips_headers_and_blank_tables() {
        let schema = parse_pg_schema(SCHEMA);
        assert_eq!(schema.len(), 4);
        assert!(schema["bookings"].contains("grundpreis"));
        assert!(!schema.contains_key("table_name"));
        assert!(!schema.contains_key(""));
    }

    #[test]
    fn column_accesses_collect_every_call_on_a_line() {
        let text = "\
src/booking_repository.rs:12:    let a: i32 = row.get(\"id\"); let b: f64 = row.get(\"grundpreis\");
src/booking_repository.rs:40:    let c: String = row.get(\"status\");
src/main.rs:3:    // nothing here
not a grep line
";
        let accesses = parse_column_accesses(text);
        assert_eq!(accesses.len(), 1);
        let cols = &accesses["src/booking_repository.rs"];
        assert_eq!(
            cols.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["grundpreis", "id", "status"]
        );
    }

    #[test]
    fn column_accesses_accept_drive_letter_paths() {
        let text = "C:\\app\\src\\guest_repository.rs:7:    row.get(\"vorname\")\n";
        let accesses = parse_column_accesses(text);
        assert_eq!(accesses.len(), 1);
        assert!(accesses[r"\app\src\guest_repository.rs"].contains("vorname"));
    }

    #[test]
    fn table_guessing_rules() {
        assert_eq!(guess_table("src/database_pg/booking_repository.rs"), "bookings");
        assert_eq!(guess_table("company_repository.rs"), "companies");
        assert_eq!(guess_table("guest_repository.rs"), "guests");
        assert_eq!(
            guess_table("accompanying_guest_repository.rs"),
            "accompanying_guests"
        );
        assert_eq!(guess_table("settings_repository.rs"), "settings");
    }

    #[test]
    fn singular_fallback_is_tried() {
        let schema = parse_pg_schema(SCHEMA);
        let mut accesses = ColumnAccesses::new();
        accesses.insert(
            "src/staff_repository.rs".to_string(),
            BTreeSet::from(["id".to_string()]),
        );
        assert!(find_mismatches(&schema, &accesses).is_empty());
    }

    #[test]
    fn mismatches_are_reported() {
        let schema = parse_pg_schema(SCHEMA);
        let accesses = parse_column_accesses(
            "\
src/booking_repository.rs:1:row.get(\"id\")
src/booking_repository.rs:2:row.get(\"rabatt\")
src/room_repository.rs:5:row.get(\"id\")
src/commands.rs:9:row.get(\"nope\")
",
        );
        let mismatches = find_mismatches(&schema, &accesses);
        assert_eq!(
            mismatches,
            vec![
                Mismatch::MissingColumn {
                    file: "src/booking_repository.rs".to_string(),
                    table: "bookings".to_string(),
                    column: "rabatt".to_string(),
                },
                Mismatch::TableGuessFailed {
                    file: "src/room_repository.rs".to_string(),
                    guessed: "rooms".to_string(),
                },
            ]
        );
    }

    #[test]
    fn mismatch_display() {
        let m = Mismatch::MissingColumn {
            file: "a_repository.rs".to_string(),
            table: "as".to_string(),
            column: "x".to_string(),
        };
        assert_eq!(
            m.to_string(),
            "as: column 'x' not in PostgreSQL schema (used in a_repository.rs)"
        );
    }
}
