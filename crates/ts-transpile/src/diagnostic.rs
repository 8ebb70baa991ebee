//! Recoverable syntax diagnostics.

use serde::Serialize;
use swc_common::{BytePos, Span, Spanned};
use swc_ecma_parser::error::Error as SwcError;

/// A syntax problem the compiler recovered from.
///
/// The transpiled code is still produced when these occur; [`crate::transpile`]
/// drops them, [`crate::transpile_module`] returns them alongside the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The diagnostic message.
    pub message: String,
    /// The line number (1-indexed).
    pub line: usize,
    /// The column number (1-indexed).
    pub column: usize,
    /// The line the problem ends on (1-indexed).
    pub end_line: usize,
    /// The column the problem ends at (1-indexed, exclusive).
    pub end_column: usize,
    /// Byte offset of the start of the problem in the source.
    pub start: usize,
    /// Byte offset of the end of the problem in the source.
    pub end: usize,
}

impl Diagnostic {
    /// Builds a diagnostic from a compiler error, resolving its span against
    /// `source`. `file_start` is the position the source file was registered
    /// at in the compiler's source map.
    pub(crate) fn from_swc(error: &SwcError, source: &str, file_start: BytePos) -> Self {
        Self::at_span(error.kind().msg(), error.span(), source, file_start)
    }

    /// Builds a diagnostic covering `span`.
    pub(crate) fn at_span(
        message: impl Into<String>,
        span: Span,
        source: &str,
        file_start: BytePos,
    ) -> Self {
        let (start, end) = relative_range(span, file_start, source.len());
        let (line, column) = offset_to_line_column(source, start);
        let (end_line, end_column) = offset_to_line_column(source, end);

        Self {
            message: message.into(),
            line,
            column,
            end_line,
            end_column,
            start,
            end,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// Converts an absolute compiler span into byte offsets within the file,
/// clamped to the source length.
pub(crate) fn relative_range(span: Span, file_start: BytePos, len: usize) -> (usize, usize) {
    let to_offset = |pos: BytePos| (pos.0.saturating_sub(file_start.0) as usize).min(len);
    let start = to_offset(span.lo());
    let end = to_offset(span.hi()).max(start);
    (start, end)
}

/// Converts a byte offset to line and column numbers (1-indexed).
pub(crate) fn offset_to_line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    let mut current_offset = 0;

    for ch in source.chars() {
        if current_offset >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_column() {
        let source = "let a = 1;\nlet b = 2;\n";
        assert_eq!(offset_to_line_column(source, 0), (1, 1));
        assert_eq!(offset_to_line_column(source, 4), (1, 5));
        assert_eq!(offset_to_line_column(source, 11), (2, 1));
        assert_eq!(offset_to_line_column(source, 15), (2, 5));
    }

    #[test]
    fn test_offset_past_end() {
        assert_eq!(offset_to_line_column("ab", 10), (1, 3));
        assert_eq!(offset_to_line_column("", 0), (1, 1));
    }

    #[test]
    fn test_multibyte_columns_count_chars() {
        // "é" is two bytes but one column.
        let source = "é = 1";
        assert_eq!(offset_to_line_column(source, 2), (1, 2));
    }

    #[test]
    fn test_relative_range_is_clamped() {
        let span = Span::new(BytePos(5), BytePos(40));
        assert_eq!(relative_range(span, BytePos(1), 10), (4, 10));

        let dummy = Span::new(BytePos(0), BytePos(0));
        assert_eq!(relative_range(dummy, BytePos(1), 10), (0, 0));
    }

    #[test]
    fn test_at_span_resolves_both_ends() {
        let source = "export {};\nlet item = 1;\ndelete item;\n";
        // Files are registered at position 1 in a fresh source map.
        let span = Span::new(BytePos(33), BytePos(37));
        let diagnostic = Diagnostic::at_span("bad delete", span, source, BytePos(1));

        assert_eq!(&source[diagnostic.start..diagnostic.end], "item");
        assert_eq!((diagnostic.line, diagnostic.column), (3, 8));
        assert_eq!((diagnostic.end_line, diagnostic.end_column), (3, 12));
    }

    #[test]
    fn test_at_span_across_lines() {
        let source = "for await (const x of xs) {\n    use(x);\n}\n";
        let span = Span::new(BytePos(1), BytePos(source.trim_end().len() as u32 + 1));
        let diagnostic = Diagnostic::at_span("multi-line", span, source, BytePos(1));

        assert_eq!((diagnostic.line, diagnostic.column), (1, 1));
        assert_eq!((diagnostic.end_line, diagnostic.end_column), (3, 2));
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic {
            message: "'delete' cannot be called on an identifier in strict mode".to_string(),
            line: 2,
            column: 8,
            end_line: 2,
            end_column: 9,
            start: 20,
            end: 21,
        };
        assert_eq!(
            diagnostic.to_string(),
            "2:8: 'delete' cannot be called on an identifier in strict mode"
        );
    }
}
