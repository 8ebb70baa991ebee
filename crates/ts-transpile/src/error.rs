//! Transpilation error types.

use std::string::FromUtf8Error;
use thiserror::Error;

/// An error that stopped transpilation before any output was produced.
#[derive(Debug, Error)]
pub enum TranspileError {
    /// The source could not be parsed at all.
    #[error("{line}:{column}: {message}")]
    Parse {
        /// The compiler's description of the problem.
        message: String,
        /// The line number (1-indexed).
        line: usize,
        /// The column number (1-indexed).
        column: usize,
    },

    /// The code printer failed to write output.
    #[error("failed to emit code: {0}")]
    Emit(#[from] std::io::Error),

    /// The printer produced bytes that are not valid UTF-8.
    #[error("emitted code is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// The source map could not be serialized.
    #[error("failed to serialize source map: {0}")]
    SourceMap(String),
}

impl TranspileError {
    /// Returns the 1-indexed `(line, column)` of a parse failure.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            TranspileError::Parse { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }
}

/// An unrecognized module kind name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module kind `{name}` (expected one of: commonjs, amd, umd, system, esnext)")]
pub struct ParseModuleKindError {
    /// The name that failed to parse.
    pub name: String,
}
