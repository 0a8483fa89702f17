//! Small text utilities for statement parsing: string masking and
//! parenthesis-aware splitting.

use std::collections::HashSet;
use std::ops::Range;

use crate::reader::CharFilter;

/// Replace the contents of string literals with `x`, keeping the quotes.
///
/// The result has the same byte length as `text`, so match ranges found in the
/// masked text can be used to slice the original.
#[must_use]
pub fn mask_strings(text: &str) -> String {
    let outside: HashSet<usize> = CharFilter::new(text, false, true)
        .map(|(pos, _)| pos)
        .collect();
    let mut masked = String::with_capacity(text.len());
    for (pos, c) in text.char_indices() {
        if outside.contains(&pos) || c == '\'' || c == '"' {
            masked.push(c);
        } else {
            for _ in 0..c.len_utf8() {
                masked.push('x');
            }
        }
    }
    masked
}

/// Byte ranges of the pieces of `text` separated by `sep` outside parentheses
/// and brackets.
#[must_use]
pub fn paren_split_spans(text: &str, sep: char) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut level = 0i32;
    let mut blevel = 0i32;
    let mut left = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => level += 1,
            ')' => level -= 1,
            '[' => blevel += 1,
            ']' => blevel -= 1,
            _ if c == sep && level == 0 && blevel == 0 => {
                spans.push(left..i);
                left = i + c.len_utf8();
            }
            _ => {}
        }
    }
    spans.push(left..text.len());
    spans
}

/// Split `text` on `sep` outside parentheses and brackets.
#[must_use]
pub fn paren_split(text: &str, sep: char) -> Vec<&str> {
    paren_split_spans(text, sep)
        .into_iter()
        .map(|r| &text[r])
        .collect()
}

/// Comma-separated list, trimmed, without empty entries.
#[must_use]
pub fn split_list(text: &str) -> Vec<String> {
    paren_split(text, ',')
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// The balanced parenthesised group at the start of `text`, parentheses included.
#[must_use]
pub fn leading_group(text: &str) -> Option<&str> {
    if !text.starts_with('(') {
        return None;
    }
    let mut level = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => level += 1,
            ')' => {
                level -= 1;
                if level == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Contents of the parenthesised group that follows `start`, without the
/// parentheses. `start` must point at or before the opening parenthesis.
#[must_use]
pub fn group_after(text: &str, start: usize) -> Option<&str> {
    let open = start + text[start..].find('(')?;
    leading_group(&text[open..]).map(|g| &g[1..g.len() - 1])
}

/// The segments of `text` at parenthesis depth `depth`, with deeper groups
/// collapsed to `()`.
///
/// Depth 0 is the statement itself; depth 1 the contents of its top-level
/// groups, and so on. Returns an empty list once nothing is that deep.
#[must_use]
pub fn strip_paren(text: &str, depth: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Option<String> = if depth == 0 { Some(String::new()) } else { None };
    let mut level = 0usize;
    for c in text.chars() {
        match c {
            '(' => {
                if level == depth {
                    if let Some(seg) = current.as_mut() {
                        seg.push_str("()");
                    }
                }
                level += 1;
                if level == depth {
                    current = Some(String::new());
                }
            }
            ')' => {
                if level == depth {
                    if let Some(seg) = current.take() {
                        segments.push(seg);
                    }
                }
                level = level.saturating_sub(1);
            }
            _ if level == depth => {
                if let Some(seg) = current.as_mut() {
                    seg.push(c);
                }
            }
            _ => {}
        }
    }
    if let Some(seg) = current {
        if depth == 0 || !seg.is_empty() {
            segments.push(seg);
        }
    }
    segments
}

/// Remove all whitespace.
#[must_use]
pub fn squeeze(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
