//! Output formatting.

use crate::cli::OutputFormat;
use camino::Utf8Path;
use serde::Serialize;
use ts_transpile::{Diagnostic, TranspileError};

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The file produced no output.
    Error,
    /// The compiler recovered; output was still produced.
    Warning,
}

/// A problem found while processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Severity.
    pub severity: Severity,
    /// The message.
    pub message: String,
    /// The start position, when known.
    pub start: Option<Position>,
    /// The end position, when known.
    pub end: Option<Position>,
}

impl Finding {
    /// A recoverable syntax diagnostic.
    pub fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            severity: Severity::Warning,
            message: diagnostic.message.clone(),
            start: Some(Position {
                line: diagnostic.line,
                column: diagnostic.column,
                offset: Some(diagnostic.start),
            }),
            end: Some(Position {
                line: diagnostic.end_line,
                column: diagnostic.end_column,
                offset: Some(diagnostic.end),
            }),
        }
    }

    /// A failed transpilation.
    pub fn from_error(error: &TranspileError) -> Self {
        match error {
            TranspileError::Parse {
                message,
                line,
                column,
            } => Self {
                severity: Severity::Error,
                message: message.clone(),
                start: Some(Position {
                    line: *line,
                    column: *column,
                    offset: None,
                }),
                end: None,
            },
            other => Self::message(other.to_string()),
        }
    }

    /// Whether the file produced no output because of this finding.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// A failure with no source location, such as an I/O error.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            start: None,
            end: None,
        }
    }
}

/// A formatted diagnostic for output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// The diagnostic type (Error, Warning).
    #[serde(rename = "type")]
    pub diagnostic_type: Severity,
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: Option<Position>,
    /// The end position.
    pub end: Option<Position>,
    /// The message.
    pub message: String,
}

/// A position in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: usize,
    /// 1-indexed column number.
    pub column: usize,
    /// Byte offset, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Formats findings for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the findings of one file.
    pub fn format(&self, findings: &[Finding], file_path: &Utf8Path) -> String {
        match self.format {
            OutputFormat::Human => Self::format_human(findings, file_path),
            OutputFormat::Json => {
                let formatted = Self::format_json_findings(findings, file_path);
                serde_json::to_string_pretty(&formatted).unwrap_or_default()
            }
            OutputFormat::Machine => Self::format_machine(findings, file_path),
        }
    }

    /// Formats as human-readable output.
    fn format_human(findings: &[Finding], file_path: &Utf8Path) -> String {
        let mut output = String::new();

        for finding in findings {
            let severity = match finding.severity {
                Severity::Error => "Error",
                Severity::Warning => "Warning",
            };

            match finding.start {
                Some(start) => output.push_str(&format!(
                    "{}:{}:{}\n",
                    file_path, start.line, start.column
                )),
                None => output.push_str(&format!("{}\n", file_path)),
            }
            output.push_str(&format!("{}: {}\n\n", severity, finding.message));
        }

        output
    }

    /// Formats findings into JSON-ready structs.
    pub fn format_json_findings(
        findings: &[Finding],
        file_path: &Utf8Path,
    ) -> Vec<FormattedDiagnostic> {
        findings
            .iter()
            .map(|finding| FormattedDiagnostic {
                diagnostic_type: finding.severity,
                filename: file_path.to_string(),
                start: finding.start,
                end: finding.end,
                message: finding.message.clone(),
            })
            .collect()
    }

    /// Formats as machine-readable output.
    fn format_machine(findings: &[Finding], file_path: &Utf8Path) -> String {
        let mut output = String::new();

        for finding in findings {
            let severity = match finding.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARNING",
            };
            let start = finding.start.map_or((0, 0), |p| (p.line, p.column));
            let end = finding.end.map_or(start, |p| (p.line, p.column));

            output.push_str(&format!(
                "{} {}:{}:{}:{}:{} {}\n",
                severity, file_path, start.0, start.1, end.0, end.1, finding.message
            ));
        }

        output
    }
}

/// Summary of a transpile run.
#[derive(Debug, Default)]
pub struct TranspileSummary {
    /// Number of files processed.
    pub file_count: usize,
    /// Number of files that produced no output.
    pub failed_count: usize,
    /// Number of recoverable diagnostics.
    pub diagnostic_count: usize,
    /// Whether to fail on diagnostics.
    pub fail_on_diagnostics: bool,
}

impl TranspileSummary {
    /// Whether the run should exit with an error status.
    pub fn is_failure(&self) -> bool {
        self.failed_count > 0 || (self.fail_on_diagnostics && self.diagnostic_count > 0)
    }

    /// Formats the summary line.
    pub fn format(&self) -> String {
        let file_word = if self.file_count == 1 {
            "file"
        } else {
            "files"
        };
        let diagnostic_word = if self.diagnostic_count == 1 {
            "diagnostic"
        } else {
            "diagnostics"
        };

        format!(
            "ts-transpile processed {} {}: {} failed, {} {}",
            self.file_count, file_word, self.failed_count, self.diagnostic_count, diagnostic_word
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `delete item;` on line 3 of a module.
    fn delete_diagnostic() -> Diagnostic {
        Diagnostic {
            message: "'delete' cannot be called on an identifier in strict mode".to_string(),
            line: 3,
            column: 8,
            end_line: 3,
            end_column: 12,
            start: 32,
            end: 36,
        }
    }

    #[test]
    fn test_finding_from_diagnostic() {
        let finding = Finding::from_diagnostic(&delete_diagnostic());
        assert_eq!(finding.severity, Severity::Warning);
        assert_eq!(
            finding.start,
            Some(Position {
                line: 3,
                column: 8,
                offset: Some(32)
            })
        );
        assert_eq!(
            finding.end,
            Some(Position {
                line: 3,
                column: 12,
                offset: Some(36)
            })
        );
    }

    #[test]
    fn test_finding_from_transpiled_diagnostic() {
        let output = ts_transpile::transpile_module(
            "export {};\nlet item = 1;\ndelete item;\n",
            &Default::default(),
        )
        .unwrap();
        let finding = Finding::from_diagnostic(&output.diagnostics[0]);
        assert_eq!(finding, Finding::from_diagnostic(&delete_diagnostic()));
    }

    #[test]
    fn test_format_human() {
        let findings = [
            Finding::from_diagnostic(&delete_diagnostic()),
            Finding::message("failed to read file"),
        ];

        let output = Formatter::new(OutputFormat::Human).format(&findings, Utf8Path::new("a.ts"));
        insta::assert_snapshot!(output, @r"
        a.ts:3:8
        Warning: 'delete' cannot be called on an identifier in strict mode

        a.ts
        Error: failed to read file
        ");
    }

    #[test]
    fn test_format_machine() {
        let error = TranspileError::Parse {
            message: "Expression expected".to_string(),
            line: 1,
            column: 10,
        };
        let output = Formatter::new(OutputFormat::Machine)
            .format(&[Finding::from_error(&error)], Utf8Path::new("src/a.ts"));
        assert_eq!(output, "ERROR src/a.ts:1:10:1:10 Expression expected\n");
    }

    #[test]
    fn test_format_json() {
        let output = Formatter::new(OutputFormat::Json).format(
            &[Finding::from_diagnostic(&delete_diagnostic())],
            Utf8Path::new("a.ts"),
        );

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["type"], "Warning");
        assert_eq!(value[0]["filename"], "a.ts");
        assert_eq!(value[0]["start"]["line"], 3);
        assert_eq!(value[0]["end"]["column"], 12);
        assert_eq!(value[0]["end"]["offset"], 36);
    }

    #[test]
    fn test_summary() {
        let summary = TranspileSummary {
            file_count: 5,
            failed_count: 1,
            diagnostic_count: 2,
            fail_on_diagnostics: false,
        };

        let output = summary.format();
        assert!(output.contains("5 files"));
        assert!(output.contains("1 failed"));
        assert!(output.contains("2 diagnostics"));
        assert!(summary.is_failure());
    }

    #[test]
    fn test_diagnostics_fail_only_when_requested() {
        let mut summary = TranspileSummary {
            file_count: 1,
            failed_count: 0,
            diagnostic_count: 1,
            fail_on_diagnostics: false,
        };
        assert!(!summary.is_failure());

        summary.fail_on_diagnostics = true;
        assert!(summary.is_failure());
    }
}
