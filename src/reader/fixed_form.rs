//! Fixed-form to free-form conversion.
//!
//! Fixed-form source encodes structure in columns:
//! - column 1 `C`, `c`, `*` or `!` marks a comment line
//! - columns 1-5 hold an optional statement label
//! - a non-blank, non-`0` character in column 6 continues the previous statement
//! - code occupies columns 7 up to the column limit (72 by default)
//!
//! [`convert_to_free`] rewrites each physical line into its free-form
//! equivalent before the regular reader logic runs. The number of lines never
//! changes, so line numbers reported later still point at the original file.

use super::char_filter::{split_comment, StringDelimiter};

/// Standard fixed-form statement width.
pub const DEFAULT_COLUMN_LIMIT: usize = 72;

/// Convert fixed-form source text into free-form text, line for line.
///
/// `column_limit` truncates code after that column; `None` keeps everything.
#[must_use]
pub fn convert_to_free(text: &str, column_limit: Option<usize>) -> String {
    let mut out: Vec<String> = Vec::new();
    // Index into `out` of the last line holding code, which receives the `&`
    // when a continuation line follows (comment lines may sit in between).
    let mut last_code: Option<usize> = None;

    for raw in text.lines() {
        let line = expand_leading_tab(raw.trim_end_matches('\r'));

        match classify(&line) {
            FixedLine::Blank => out.push(String::new()),
            FixedLine::Comment => {
                let rest = line.get(first_char_len(&line)..).unwrap_or("");
                out.push(format!("!{rest}"));
            }
            FixedLine::Verbatim => out.push(line.clone()),
            FixedLine::Continuation => {
                if let Some(idx) = last_code {
                    out[idx] = append_continuation(&out[idx]);
                }
                let code = code_columns(&line, column_limit);
                last_code = Some(out.len());
                out.push(code);
            }
            FixedLine::Statement => {
                let label = slice_columns(&line, 0, 5).trim().to_string();
                let code = code_columns(&line, column_limit);
                let converted = if label.is_empty() {
                    code
                } else {
                    format!("{label} {}", code.trim_start())
                };
                last_code = Some(out.len());
                out.push(converted);
            }
        }
    }

    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedLine {
    Blank,
    Comment,
    /// Kept untouched: preprocessor lines and free-form `!` comments in columns 2-5.
    Verbatim,
    Continuation,
    Statement,
}

fn classify(line: &str) -> FixedLine {
    if line.trim().is_empty() {
        return FixedLine::Blank;
    }
    let first = line.chars().next().unwrap_or(' ');
    if matches!(first, 'c' | 'C' | '*' | '!') {
        return FixedLine::Comment;
    }
    if first == '#' {
        return FixedLine::Verbatim;
    }
    let label_field = slice_columns(line, 0, 5);
    if label_field.trim_start().starts_with('!') {
        return FixedLine::Verbatim;
    }
    match line.chars().nth(5) {
        Some(c) if c != ' ' && c != '0' => FixedLine::Continuation,
        _ => FixedLine::Statement,
    }
}

/// Columns 7 onwards. Text past the column limit becomes a trailing `! `
/// comment, unless a comment has already started before the limit. Inside an
/// open string the overflow is dropped.
fn code_columns(line: &str, column_limit: Option<usize>) -> String {
    let full = slice_columns(line, 6, usize::MAX);
    let Some(limit) = column_limit else {
        return full.to_string();
    };
    let truncated = slice_columns(line, 6, limit);
    let mut state = StringDelimiter::None;
    let (_, comment) = split_comment(truncated, &mut state);
    if !comment.is_empty() {
        return full.to_string();
    }
    let overflow = slice_columns(line, limit, usize::MAX).trim();
    if overflow.is_empty() || state != StringDelimiter::None {
        truncated.to_string()
    } else {
        format!("{truncated}! {overflow}")
    }
}

/// Insert ` &` after the code part of a converted line, ahead of any comment.
fn append_continuation(line: &str) -> String {
    let mut state = StringDelimiter::None;
    let (code, comment) = split_comment(line, &mut state);
    if comment.is_empty() {
        format!("{} &", code.trim_end())
    } else {
        format!("{} & {comment}", code.trim_end())
    }
}

/// Substring between character columns `start` (inclusive) and `end` (exclusive).
fn slice_columns(line: &str, start: usize, end: usize) -> &str {
    let byte_of = |col: usize| {
        line.char_indices()
            .nth(col)
            .map_or(line.len(), |(pos, _)| pos)
    };
    let from = byte_of(start);
    let to = if end == usize::MAX { line.len() } else { byte_of(end) };
    if from >= to {
        ""
    } else {
        &line[from..to]
    }
}

fn first_char_len(line: &str) -> usize {
    line.chars().next().map_or(0, char::len_utf8)
}

/// A tab in column 1 stands for the six label/continuation columns.
fn expand_leading_tab(line: &str) -> String {
    match line.strip_prefix('\t') {
        Some(rest) => format!("      {rest}"),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_lines() {
        let src = "C a comment\n* another\nc!! doc line\n";
        let free = convert_to_free(src, Some(DEFAULT_COLUMN_LIMIT));
        assert_eq!(free, "! a comment\n! another\n!!! doc line\n");
    }

    #[test]
    fn test_continuation_appends_ampersand() {
        let src = "      CALL FOO(A,\n     &         B)\n";
        let free = convert_to_free(src, Some(DEFAULT_COLUMN_LIMIT));
        let lines: Vec<&str> = free.lines().collect();
        assert_eq!(lines[0], "CALL FOO(A, &");
        assert_eq!(lines[1], "         B)");
    }

    #[test]
    fn test_continuation_across_comment() {
        let src = "      X = 1 +\nC     interleaved\n     1    2\n";
        let free = convert_to_free(src, None);
        let lines: Vec<&str> = free.lines().collect();
        assert_eq!(lines, vec!["X = 1 + &", "!     interleaved", "    2"]);
    }

    #[test]
    fn test_label_is_kept() {
        let src = "  100 FORMAT(A)\n";
        let free = convert_to_free(src, Some(DEFAULT_COLUMN_LIMIT));
        assert_eq!(free, "100 FORMAT(A)\n");
    }

    #[test]
    fn test_zero_in_column_six_is_not_continuation() {
        let src = "      A = 1\n     0B = 2\n";
        let free = convert_to_free(src, None);
        assert_eq!(free, "A = 1\nB = 2\n");
    }

    #[test]
    fn test_column_limit_overflow_becomes_comment() {
        let mut src = String::from("      X = 1");
        while src.chars().count() < 72 {
            src.push(' ');
        }
        src.push_str("SEQUENCE NUMBER");
        let free = convert_to_free(&src, Some(DEFAULT_COLUMN_LIMIT));
        let mut state = StringDelimiter::None;
        let (code, comment) = split_comment(&free, &mut state);
        assert_eq!(code.trim_end(), "X = 1");
        assert_eq!(comment, "! SEQUENCE NUMBER");
        assert_eq!(free.find('!'), Some(66));

        let unlimited = convert_to_free(&src, None);
        assert!(unlimited.ends_with("SEQUENCE NUMBER"));
    }

    #[test]
    fn test_overflow_inside_string_is_dropped() {
        let mut src = String::from("      S = 'abc");
        while src.chars().count() < 72 {
            src.push(' ');
        }
        src.push_str("tail");
        let free = convert_to_free(&src, Some(DEFAULT_COLUMN_LIMIT));
        assert!(!free.contains("tail"));
        assert!(!free.contains('!'));
    }

    #[test]
    fn test_overflow_keeps_continuation_before_comment() {
        let mut src = String::from("      X = 1 +");
        while src.chars().count() < 72 {
            src.push(' ');
        }
        src.push_str("00010\n     &    2\n");
        let free = convert_to_free(&src, Some(DEFAULT_COLUMN_LIMIT));
        let first = free.lines().next().unwrap();
        assert_eq!(first, "X = 1 + & ! 00010");
    }

    #[test]
    fn test_line_count_preserved() {
        let src = "C header\n\n      PROGRAM P\n      END\n";
        let free = convert_to_free(src, Some(DEFAULT_COLUMN_LIMIT));
        assert_eq!(free.lines().count(), src.lines().count());
    }
}
