//! Fortran source reading.
//!
//! This module turns raw source text into a stream of logical statements:
//! - [`CharFilter`]: Iterator adapter that identifies strings, comments, and code regions
//! - [`fixed_form`]: Column-based reclassification of fixed-form source
//! - [`Reader`]: Joins continuation lines (`&`), splits semicolon-separated
//!   statements and attaches documentation comments
//! - [`LineCursor`]: `peek`/`advance`/`at_end` access for the statement parser

pub mod char_filter;
pub mod cursor;
pub mod fixed_form;
pub mod stream;

pub use char_filter::{CharFilter, StringDelimiter};
pub use cursor::LineCursor;
pub use stream::{DocFragment, DocPlacement, LogicalLine, Reader, ReaderOptions};
