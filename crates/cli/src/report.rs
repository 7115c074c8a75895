//! Human-readable command output.
//!
//! Findings go to stdout as tagged lines (`[OK]`, `[WARN]`, `[ERROR]`,
//! `[INFO]`) grouped under section headers. Diagnostics go through
//! `tracing` to stderr and never mix with the report.

use std::fmt;
use std::io::{self, Stdout, Write};

use bookops_db::checks::CheckOutcome;

/// Width of the horizontal rules.
pub const RULE_WIDTH: usize = 80;

const STATUS_INDENT: &str = "   ";
const DETAIL_INDENT: &str = "        ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Error,
    Info,
}

impl Status {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
            Self::Info => "[INFO]",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub struct Report<W: Write = Stdout> {
    out: W,
}

impl Report<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn rule(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "=".repeat(RULE_WIDTH))
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    /// A title framed by rules.
    pub fn title(&mut self, text: &str) -> io::Result<()> {
        self.rule()?;
        writeln!(self.out, "{text}")?;
        self.rule()
    }

    /// A section header preceded by a blank line.
    pub fn section(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "\n{text}")
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")
    }

    pub fn status(&mut self, status: Status, text: &str) -> io::Result<()> {
        writeln!(self.out, "{STATUS_INDENT}{status} {text}")
    }

    pub fn ok(&mut self, text: &str) -> io::Result<()> {
        self.status(Status::Ok, text)
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.status(Status::Warn, text)
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.status(Status::Error, text)
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        self.status(Status::Info, text)
    }

    /// An indented line under the preceding status line.
    pub fn detail(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{DETAIL_INDENT}{text}")
    }

    /// Print `text` without a newline and flush, for interactive questions.
    pub fn prompt(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "{text}")?;
        self.out.flush()
    }

    /// One check outcome with its findings.
    pub fn check(&mut self, outcome: &CheckOutcome) -> io::Result<()> {
        let status = if outcome.informational {
            Status::Info
        } else if outcome.passed {
            Status::Ok
        } else {
            Status::Error
        };
        self.status(status, &outcome.description)?;
        for detail in &outcome.details {
            self.detail(detail)?;
        }
        Ok(())
    }
}

/// Cut `text` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut Report<Vec<u8>>) -> io::Result<()>) -> String {
        let mut report = Report::new(Vec::new());
        f(&mut report).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn status_lines_are_tagged_and_indented() {
        let out = render(|r| {
            r.ok("fine")?;
            r.warn("hmm")?;
            r.error("broken")?;
            r.info("fyi")
        });
        assert_eq!(out, "   [OK] fine\n   [WARN] hmm\n   [ERROR] broken\n   [INFO] fyi\n");
    }

    #[test]
    fn title_is_framed_by_full_width_rules() {
        let out = render(|r| r.title("Migration 017"));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), RULE_WIDTH);
        assert!(lines[0].chars().all(|c| c == '='));
        assert_eq!(lines[1], "Migration 017");
    }

    #[test]
    fn check_outcome_uses_status_from_result() {
        let failed = CheckOutcome {
            description: "columns on bookings".to_string(),
            informational: false,
            passed: false,
            details: vec!["missing column created_by".to_string()],
        };
        let info = CheckOutcome {
            description: "rows in audit_log".to_string(),
            informational: true,
            passed: true,
            details: vec!["0 rows".to_string()],
        };
        let out = render(|r| {
            r.check(&failed)?;
            r.check(&info)
        });
        assert_eq!(
            out,
            "   [ERROR] columns on bookings\n        missing column created_by\n\
             \x20  [INFO] rows in audit_log\n        0 rows\n"
        );
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Zahlungserinnerung", 8), "Zahlungs...");
        assert_eq!(truncate("kurz", 8), "kurz");
        assert_eq!(truncate("Grüße aus Bad", 5), "Grüße...");
    }
}
