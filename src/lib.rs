//! fordoc - Documentation front-end for modern Fortran projects
//!
//! Reads free- and fixed-form Fortran, extracts documentation comments into
//! an entity tree per file, merges the trees into one project and resolves
//! names across files so renderers can follow links.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod correlate;
pub mod entity;
pub mod error;
pub mod external;
pub mod intrinsics;
pub mod parser;
pub mod preprocess;
pub mod project;
pub mod reader;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Settings;
pub use correlate::CorrelateOptions;
pub use entity::{Entity, EntityClass, EntityId, EntityKind, EntityTree, Link, Permission};
pub use error::{Diagnostic, DiagnosticKind, Error, ParseError, Result, Severity};
pub use external::{ExternalIndex, LinkDirectory, LinkEntry};
pub use parser::{parse_source, ParseSettings, ParsedFile};
pub use preprocess::{CommandPreprocessor, Preprocessor};
pub use project::{Project, Registry};
