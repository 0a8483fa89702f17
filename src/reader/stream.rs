/// `Reader` - Converts physical lines into documented logical statements
///
/// This module handles:
/// - Joining line continuations (trailing `&`, optional leading `&`)
/// - Splitting semicolon-separated statements
/// - Separating comments from code without looking inside string literals
/// - Classifying documentation comments (docmark, predocmark and their
///   block-style alternates) and attaching them to the right statement
/// - Skipping preprocessor residue (`#` lines)
use std::collections::VecDeque;
use std::io::{BufRead, Cursor};
use std::path::{Path, PathBuf};

use log::trace;

use super::char_filter::{positions_outside_strings, split_comment, StringDelimiter};
use super::fixed_form::{convert_to_free, DEFAULT_COLUMN_LIMIT};
use crate::error::{Error, ParseError, Result};

/// Maximum number of physical lines allowed in a single logical line.
/// This prevents memory exhaustion from pathological inputs with many continuations.
const MAX_CONTINUATION_LINES: usize = 10_000;

/// Reader configuration, derived from the project settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    pub docmark: char,
    pub docmark_alt: char,
    pub predocmark: char,
    pub predocmark_alt: char,
    /// Source is fixed form; only honoured by [`Reader::from_source`].
    pub fixed: bool,
    /// Fixed-form column limit, `None` for unlimited.
    pub column_limit: Option<usize>,
    /// Drop ordinary comments instead of collecting them on the logical line.
    pub strip_comments: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            docmark: '!',
            docmark_alt: '*',
            predocmark: '>',
            predocmark_alt: '|',
            fixed: false,
            column_limit: Some(DEFAULT_COLUMN_LIMIT),
            strip_comments: true,
        }
    }
}

/// Where a documentation fragment sat relative to its statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocPlacement {
    /// From a predocmark comment ahead of the statement.
    Preceding,
    /// Trailing code on the same physical line; `offset` is the byte position in
    /// the joined statement text where that code ended.
    Inline { offset: usize },
    /// A documentation-only line after the statement.
    Following,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocFragment {
    pub text: String,
    pub placement: DocPlacement,
}

/// One normalized statement with its documentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalLine {
    /// Statement text, continuations joined; empty for documentation-only lines
    pub text: String,
    /// Documentation fragments in source order
    pub docs: Vec<DocFragment>,
    /// Ordinary comments, kept only when comment stripping is disabled
    pub comments: Vec<String>,
    /// First physical line (1-based)
    pub line_start: usize,
    /// Last physical line (1-based)
    pub line_end: usize,
}

impl LogicalLine {
    fn doc_only(line: usize) -> Self {
        Self {
            line_start: line,
            line_end: line,
            ..Self::default()
        }
    }

    /// True when the line carries documentation but no statement.
    #[must_use]
    pub fn is_doc_only(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// All documentation text, in order.
    pub fn documentation(&self) -> impl Iterator<Item = &str> {
        self.docs.iter().map(|d| d.text.as_str())
    }

    /// Whether any of the documentation came before the statement.
    #[must_use]
    pub fn has_preceding_docs(&self) -> bool {
        self.docs
            .iter()
            .any(|d| d.placement == DocPlacement::Preceding)
    }
}

/// Kind of a comment found on a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    None,
    Plain,
    Doc,
    Predoc,
    DocAlt,
    PredocAlt,
}

/// Which block-style documentation is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AltBlock {
    Following,
    Preceding,
}

/// A statement still being assembled from continued physical lines.
#[derive(Debug, Default)]
struct Pending {
    text: String,
    docs: Vec<DocFragment>,
    comments: Vec<String>,
    line_start: usize,
    line_end: usize,
    physical_lines: usize,
    continued: bool,
    string_state: StringDelimiter,
}

impl Pending {
    fn into_line(self) -> LogicalLine {
        let text = self.text.trim_end().to_string();
        let len = text.len();
        let docs = self
            .docs
            .into_iter()
            .map(|mut d| {
                if let DocPlacement::Inline { offset } = &mut d.placement {
                    *offset = (*offset).min(len);
                }
                d
            })
            .collect();
        LogicalLine {
            text,
            docs,
            comments: self.comments,
            line_start: self.line_start,
            line_end: self.line_end,
        }
    }
}

/// `Reader` pulls logical lines from a source one at a time.
pub struct Reader<R: BufRead> {
    reader: R,
    path: PathBuf,
    options: ReaderOptions,
    line_number: usize,
    current: Option<Pending>,
    /// Completed statement still collecting following documentation
    held: Option<LogicalLine>,
    ready: VecDeque<LogicalLine>,
    predocs: Vec<String>,
    alt_block: Option<AltBlock>,
    pending_blank: bool,
    last_was_doc: bool,
    eof: bool,
}

impl<R: BufRead> Reader<R> {
    /// Create a reader over free-form source.
    pub fn new(reader: R, path: impl Into<PathBuf>, options: ReaderOptions) -> Self {
        Self {
            reader,
            path: path.into(),
            options,
            line_number: 0,
            current: None,
            held: None,
            ready: VecDeque::new(),
            predocs: Vec::new(),
            alt_block: None,
            pending_blank: false,
            last_was_doc: false,
            eof: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of physical lines consumed so far
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Read the next logical line
    ///
    /// Returns None at EOF
    pub fn next_logical_line(&mut self) -> Result<Option<LogicalLine>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }

            let mut raw_line = String::new();
            let read = self.reader.read_line(&mut raw_line).map_err(|e| {
                if e.kind() == std::io::ErrorKind::InvalidData {
                    Error::Encoding {
                        path: self.path.clone(),
                        encoding: "utf-8".to_string(),
                    }
                } else {
                    Error::io(&self.path, e)
                }
            })?;
            if read == 0 {
                self.finish();
                self.eof = true;
                continue;
            }

            self.line_number += 1;
            let line = raw_line.trim_end_matches(['\n', '\r']);
            self.process_physical_line(line)?;
        }
    }

    fn error(&self, message: &str) -> Error {
        ParseError::new(&self.path, self.line_number, message).into()
    }

    fn continuing(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.continued)
    }

    fn classify_comment(&self, comment: &str) -> CommentKind {
        let mut chars = comment.chars();
        if chars.next() != Some('!') {
            return CommentKind::None;
        }
        match chars.next() {
            Some(c) if c == self.options.docmark => CommentKind::Doc,
            Some(c) if c == self.options.predocmark => CommentKind::Predoc,
            Some(c) if c == self.options.docmark_alt => CommentKind::DocAlt,
            Some(c) if c == self.options.predocmark_alt => CommentKind::PredocAlt,
            _ => CommentKind::Plain,
        }
    }

    fn process_physical_line(&mut self, line: &str) -> Result<()> {
        let continuing = self.continuing();
        if !continuing && line.trim_start().starts_with('#') {
            trace!(line = self.line_number; "skipping preprocessor line");
            return Ok(());
        }

        let mut state = self
            .current
            .as_ref()
            .filter(|c| c.continued)
            .map_or(StringDelimiter::None, |c| c.string_state);
        let (code, comment) = split_comment(line, &mut state);
        let comment = comment.trim_end();
        let kind = self.classify_comment(comment);

        if code.trim().is_empty() {
            self.process_comment_line(comment, kind);
            return Ok(());
        }
        self.alt_block = None;

        let mut code = code.trim();
        let leading_amp = code.starts_with('&');
        if leading_amp {
            if !continuing {
                let message = if self.last_was_doc {
                    "cannot continue a statement with `&` from within documentation"
                } else {
                    "cannot start a new statement with `&`"
                };
                return Err(self.error(message));
            }
            code = &code[1..];
        } else if !continuing {
            self.start_statement();
        }

        // Inside an open string the trailing `&` still continues the statement
        let ends_continued = code.trim_end().ends_with('&');
        if ends_continued {
            code = code.trim_end().trim_end_matches('&');
        }

        let alt_inline = matches!(kind, CommentKind::DocAlt | CommentKind::PredocAlt);
        if alt_inline && (continuing || ends_continued) {
            return Err(self.error("alternate documentation lines cannot be inline"));
        }

        let line_number = self.line_number;
        let strip_comments = self.options.strip_comments;
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        if continuing {
            if leading_amp {
                current.text.push_str(code);
            } else {
                let trimmed_len = current.text.trim_end().len();
                current.text.truncate(trimmed_len);
                current.text.push(' ');
                current.text.push_str(code.trim_start());
            }
        } else {
            current.text.push_str(code);
        }
        current.line_end = line_number;
        current.physical_lines += 1;
        current.continued = ends_continued;
        current.string_state = state;

        let doc_text = comment.get(2..).unwrap_or("").to_string();
        match kind {
            CommentKind::Doc | CommentKind::DocAlt => {
                let offset = current.text.trim_end().len();
                current.docs.push(DocFragment {
                    text: doc_text,
                    placement: DocPlacement::Inline { offset },
                });
            }
            CommentKind::Predoc | CommentKind::PredocAlt => self.predocs.push(doc_text),
            CommentKind::Plain if !strip_comments => current.comments.push(comment.to_string()),
            CommentKind::Plain | CommentKind::None => {}
        }

        if current.physical_lines > MAX_CONTINUATION_LINES {
            return Err(self.error(&format!(
                "statement exceeds maximum continuation lines ({MAX_CONTINUATION_LINES})"
            )));
        }

        if !ends_continued {
            if let Some(done) = self.current.take() {
                self.held = Some(done.into_line());
            }
        }
        self.last_was_doc = false;
        Ok(())
    }

    /// Handle a physical line with no code: blank, plain comment or documentation.
    fn process_comment_line(&mut self, comment: &str, kind: CommentKind) {
        let (doc_block, text) = match kind {
            CommentKind::None => {
                self.alt_block = None;
                if self.held.is_some() && !self.continuing() {
                    self.pending_blank = true;
                }
                self.last_was_doc = false;
                return;
            }
            CommentKind::Plain => match self.alt_block {
                Some(block) => (block, comment.get(1..).unwrap_or("")),
                None => {
                    self.keep_comment(comment);
                    self.last_was_doc = false;
                    return;
                }
            },
            CommentKind::Doc => (AltBlock::Following, comment.get(2..).unwrap_or("")),
            CommentKind::Predoc => (AltBlock::Preceding, comment.get(2..).unwrap_or("")),
            CommentKind::DocAlt => {
                self.alt_block = Some(AltBlock::Following);
                (AltBlock::Following, comment.get(2..).unwrap_or(""))
            }
            CommentKind::PredocAlt => {
                self.alt_block = Some(AltBlock::Preceding);
                (AltBlock::Preceding, comment.get(2..).unwrap_or(""))
            }
        };
        let text = text.to_string();
        self.last_was_doc = true;

        if doc_block == AltBlock::Preceding {
            self.predocs.push(text);
            return;
        }

        if let Some(current) = self.current.as_mut().filter(|c| c.continued) {
            let offset = current.text.trim_end().len();
            current.docs.push(DocFragment {
                text,
                placement: DocPlacement::Inline { offset },
            });
            return;
        }

        let line_number = self.line_number;
        let held = self
            .held
            .get_or_insert_with(|| LogicalLine::doc_only(line_number));
        if self.pending_blank
            && held
                .docs
                .iter()
                .any(|d| d.placement == DocPlacement::Following)
        {
            held.docs.push(DocFragment {
                text: String::new(),
                placement: DocPlacement::Following,
            });
        }
        self.pending_blank = false;
        held.docs.push(DocFragment {
            text,
            placement: DocPlacement::Following,
        });
    }

    fn keep_comment(&mut self, comment: &str) {
        if self.options.strip_comments {
            return;
        }
        let target = match self.current.as_mut().filter(|c| c.continued) {
            Some(current) => &mut current.comments,
            None => match self.held.as_mut() {
                Some(held) => &mut held.comments,
                None => return,
            },
        };
        target.push(comment.to_string());
    }

    /// Begin a new statement: release the held one and claim pending predocs.
    fn start_statement(&mut self) {
        self.release_held();
        let docs = self
            .predocs
            .drain(..)
            .map(|text| DocFragment {
                text,
                placement: DocPlacement::Preceding,
            })
            .collect();
        self.current = Some(Pending {
            docs,
            line_start: self.line_number,
            line_end: self.line_number,
            ..Pending::default()
        });
        self.pending_blank = false;
    }

    fn release_held(&mut self) {
        if let Some(held) = self.held.take() {
            self.ready.extend(split_statements(held));
        }
    }

    fn finish(&mut self) {
        if let Some(current) = self.current.take() {
            self.release_held();
            self.held = Some(current.into_line());
        }
        self.release_held();
        if !self.predocs.is_empty() {
            let mut line = LogicalLine::doc_only(self.line_number);
            line.docs = self
                .predocs
                .drain(..)
                .map(|text| DocFragment {
                    text,
                    placement: DocPlacement::Preceding,
                })
                .collect();
            self.ready.push_back(line);
        }
    }
}

/// Split a logical line on `;` outside strings.
///
/// Preceding documentation goes to the first statement, following documentation
/// to the last, and inline fragments to the statement they trail.
fn split_statements(line: LogicalLine) -> Vec<LogicalLine> {
    let separators = positions_outside_strings(&line.text, ';');
    if separators.is_empty() {
        return vec![line];
    }

    let mut spans = Vec::with_capacity(separators.len() + 1);
    let mut start = 0;
    for pos in separators {
        spans.push((start, pos));
        start = pos + 1;
    }
    spans.push((start, line.text.len()));

    let mut parts: Vec<(usize, LogicalLine)> = spans
        .iter()
        .filter_map(|&(from, to)| {
            let raw = &line.text[from..to];
            let text = raw.trim();
            if text.is_empty() {
                return None;
            }
            let lead = raw.len() - raw.trim_start().len();
            Some((
                from + lead,
                LogicalLine {
                    text: text.to_string(),
                    docs: Vec::new(),
                    comments: Vec::new(),
                    line_start: line.line_start,
                    line_end: line.line_end,
                },
            ))
        })
        .collect();
    if parts.is_empty() {
        return Vec::new();
    }

    let last = parts.len() - 1;
    for doc in line.docs {
        let index = match doc.placement {
            DocPlacement::Preceding => 0,
            DocPlacement::Following => last,
            DocPlacement::Inline { offset } => parts
                .iter()
                .rposition(|(from, _)| *from <= offset)
                .unwrap_or(0),
        };
        let (from, part) = &mut parts[index];
        let placement = match doc.placement {
            DocPlacement::Inline { offset } => DocPlacement::Inline {
                offset: offset.saturating_sub(*from).min(part.text.len()),
            },
            other => other,
        };
        part.docs.push(DocFragment {
            text: doc.text,
            placement,
        });
    }
    if let Some((_, first)) = parts.first_mut() {
        first.comments = line.comments;
    }

    parts.into_iter().map(|(_, part)| part).collect()
}

/// Helper to create a `Reader` from source text, converting fixed form first
impl Reader<Cursor<String>> {
    #[must_use]
    pub fn from_source(source: &str, path: impl Into<PathBuf>, options: ReaderOptions) -> Self {
        let text = if options.fixed {
            convert_to_free(source, options.column_limit)
        } else {
            source.to_string()
        };
        Self::new(Cursor::new(text), path, options)
    }

    /// Free-form reader with default options (for testing)
    #[must_use]
    pub fn from_string(source: &str) -> Self {
        Self::from_source(source, "<string>", ReaderOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(src: &str) -> Vec<LogicalLine> {
        let mut reader = Reader::from_string(src);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_logical_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    fn docs(line: &LogicalLine) -> Vec<&str> {
        line.documentation().collect()
    }

    #[test]
    fn test_single_line() {
        let lines = read_all("x = 5\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "x = 5");
        assert_eq!((lines[0].line_start, lines[0].line_end), (1, 1));
    }

    #[test]
    fn test_continuation() {
        let lines = read_all("call foo(a, &\n         b)\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "call foo(a, b)");
        assert_eq!((lines[0].line_start, lines[0].line_end), (1, 2));
    }

    #[test]
    fn test_leading_ampersand_joins_tokens() {
        let lines = read_all("subroutine fo&\n  &o()\nend\n");
        assert_eq!(lines[0].text, "subroutine foo()");
    }

    #[test]
    fn test_continuation_with_comment_in_middle() {
        let lines = read_all("integer :: a, &\n! just a note\n   b\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "integer :: a, b");
    }

    #[test]
    fn test_ampersand_inside_string_is_not_continuation() {
        let lines = read_all("s = 'a & b'\nt = 1\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "s = 'a & b'");
    }

    #[test]
    fn test_following_docs() {
        let lines = read_all("integer :: x\n  !! doc for x\n  !! more\ny = 1\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(docs(&lines[0]), vec![" doc for x", " more"]);
        assert!(lines[0]
            .docs
            .iter()
            .all(|d| d.placement == DocPlacement::Following));
        assert!(lines[1].docs.is_empty());
    }

    #[test]
    fn test_inline_doc_offset() {
        let lines = read_all("integer :: a, b !! doc for b\n");
        assert_eq!(lines[0].text, "integer :: a, b");
        assert_eq!(
            lines[0].docs[0].placement,
            DocPlacement::Inline { offset: 15 }
        );
    }

    #[test]
    fn test_inline_docs_on_continued_declaration() {
        let lines = read_all("integer :: a, & !! doc for a\n           b   !! doc for b\n");
        assert_eq!(lines[0].text, "integer :: a, b");
        let offsets: Vec<DocPlacement> = lines[0].docs.iter().map(|d| d.placement).collect();
        assert_eq!(
            offsets,
            vec![
                DocPlacement::Inline { offset: 13 },
                DocPlacement::Inline { offset: 15 }
            ]
        );
    }

    #[test]
    fn test_predoc_attaches_to_next_statement() {
        let lines = read_all("x = 1\n!> doc for sub\n!> second\nsubroutine s()\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].docs.is_empty());
        assert_eq!(docs(&lines[1]), vec![" doc for sub", " second"]);
        assert!(lines[1].has_preceding_docs());
    }

    #[test]
    fn test_alt_block_following() {
        let src = "subroutine s()\n!* first\n!  second\n! third\ncall x()\n! plain\n";
        let lines = read_all(src);
        assert_eq!(docs(&lines[0]), vec![" first", "  second", " third"]);
        assert!(lines[1].docs.is_empty());
    }

    #[test]
    fn test_alt_block_preceding() {
        let src = "!| summary\n! details\nmodule m\n";
        let lines = read_all(src);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "module m");
        assert_eq!(docs(&lines[0]), vec![" summary", " details"]);
    }

    #[test]
    fn test_blank_line_inside_docs() {
        let lines = read_all("module m\n!! para one\n\n!! para two\n\ncontains\n");
        assert_eq!(docs(&lines[0]), vec![" para one", "", " para two"]);
    }

    #[test]
    fn test_doc_only_header() {
        let lines = read_all("!! file documentation\nmodule m\n");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_doc_only());
        assert_eq!(docs(&lines[0]), vec![" file documentation"]);
    }

    #[test]
    fn test_semicolon_split() {
        let lines = read_all("!> pre\na = 1; b = 2 !! inline\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a = 1");
        assert_eq!(docs(&lines[0]), vec![" pre"]);
        assert_eq!(lines[1].text, "b = 2");
        assert_eq!(docs(&lines[1]), vec![" inline"]);
    }

    #[test]
    fn test_semicolon_in_string() {
        let lines = read_all("x = \"a;b\"\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "x = \"a;b\"");
    }

    #[test]
    fn test_preprocessor_lines_skipped() {
        let lines = read_all("#ifdef FOO\nx = 1\n#endif\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].line_start, 2);
    }

    #[test]
    fn test_leading_ampersand_without_continuation() {
        let mut reader = Reader::from_string("subroutine x()\n  &continued_from_nothing\n");
        assert!(reader.next_logical_line().is_err());
    }

    #[test]
    fn test_leading_ampersand_after_docs() {
        let mut reader = Reader::from_string("x = 1\n!! doc\n  &y\n");
        let err = reader.next_logical_line().unwrap_err();
        assert!(err.to_string().contains("from within documentation"));
    }

    #[test]
    fn test_inline_alternate_doc_mid_statement() {
        let mut reader = Reader::from_string("integer :: a, & !* doc\n  b\n");
        let err = reader.next_logical_line().unwrap_err();
        assert!(err.to_string().contains("cannot be inline"));
    }

    #[test]
    fn test_comments_kept_when_not_stripping() {
        let options = ReaderOptions {
            strip_comments: false,
            ..ReaderOptions::default()
        };
        let mut reader = Reader::from_source("x = 5 ! note\n", "a.f90", options);
        let line = reader.next_logical_line().unwrap().unwrap();
        assert_eq!(line.text, "x = 5");
        assert_eq!(line.comments, vec!["! note".to_string()]);
    }

    #[test]
    fn test_fixed_form_source() {
        let options = ReaderOptions {
            fixed: true,
            ..ReaderOptions::default()
        };
        let src = "!> Adds numbers\n      SUBROUTINE ADD(A,\n     &               B)\n      END\n";
        let mut reader = Reader::from_source(src, "a.f", options);
        let line = reader.next_logical_line().unwrap().unwrap();
        assert_eq!(line.text, "SUBROUTINE ADD(A, B)");
        assert_eq!(line.documentation().collect::<Vec<_>>(), vec![" Adds numbers"]);
        assert_eq!((line.line_start, line.line_end), (2, 3));
    }

    #[test]
    fn test_fixed_form_overflow_is_comment() {
        let options = ReaderOptions {
            fixed: true,
            strip_comments: false,
            ..ReaderOptions::default()
        };
        let src = format!("{:<72}CARD0001\n      END\n", "      X = 1");
        let mut reader = Reader::from_source(&src, "a.f", options);
        let line = reader.next_logical_line().unwrap().unwrap();
        assert_eq!(line.text, "X = 1");
        assert_eq!(line.comments, vec!["! CARD0001".to_string()]);
    }

    #[test]
    fn test_empty_file() {
        assert!(read_all("").is_empty());
    }
}
