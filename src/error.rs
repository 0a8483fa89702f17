//! Error types, diagnostics and result aliases for fordoc.
//!
//! This module defines the error handling infrastructure:
//! - [`Error`]: fatal errors surfaced by the library
//! - [`ParseError`]: a structural problem in one source file, with its location
//! - [`Diagnostic`]: recoverable problems collected while building a project
//! - [`Result<T>`]: Type alias for `std::result::Result<T, Error>`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// A structural parse failure: the file cannot be turned into an entity tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}:{line}: {message}", file.display())]
pub struct ParseError {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{}:{line}: unrecognized statement `{statement}`", file.display())]
    UnrecognizedStatement {
        file: PathBuf,
        line: usize,
        statement: String,
    },

    #[error("could not decode {} as {encoding}", path.display())]
    Encoding { path: PathBuf, encoding: String },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("preprocessing {} failed: {message}", path.display())]
    Preprocess { path: PathBuf, message: String },

    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid link directory {}", path.display())]
    LinkDirectory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// What kind of problem a [`Diagnostic`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A file was dropped because it failed to parse (force mode).
    StructuralParse,
    /// A statement the parser could not place in its container.
    UnrecognizedStatement,
    /// A name that correlation could not link to any entity.
    UnresolvedReference,
    /// A file that could not be decoded or preprocessed (force mode).
    Input,
    /// An inconsistency in the assembled project, such as a submodule without its ancestor.
    Structure,
}

/// A recoverable problem. The library never prints these; callers decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: Option<PathBuf>,
    pub line: Option<usize>,
    pub message: String,
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            message: message.into(),
            severity: Severity::Warning,
            kind,
        }
    }

    #[must_use]
    pub fn at(mut self, file: impl Into<PathBuf>, line: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn in_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{line}: ", file.display())?,
            (Some(file), None) => write!(f, "{}: ", file.display())?,
            _ => {}
        }
        f.write_str(&self.message)
    }
}
