//! `CharFilter` - Iterator that skips string literals and comments
//!
//! Wraps a character iterator and tracks whether the current position is
//! inside a quoted string or a `!` comment. The reader uses it to find the
//! comment part of a physical line, continuation ampersands and statement
//! separators without being fooled by quotes; the parser uses it to mask
//! string literals before matching statement patterns.
//!
//! Fortran escapes a quote inside a string by doubling it (`'it''s'`). Treating
//! every matching quote as a toggle handles this without lookahead: the pair
//! closes and immediately reopens the string with nothing in between.

/// Type of string delimiter we're currently inside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringDelimiter {
    #[default]
    None,
    Single, // '...'
    Double, // "..."
}

/// Iterator adapter that filters out strings and comments
///
/// Yields (position, character) pairs for the selected characters only.
pub struct CharFilter<'a> {
    chars: std::str::CharIndices<'a>,
    instring: StringDelimiter,
    incomment: bool,
    filter_comments: bool,
    filter_strings: bool,
}

impl<'a> CharFilter<'a> {
    /// Create a new `CharFilter`
    ///
    /// # Arguments
    /// * `content` - The string to iterate over
    /// * `filter_comments` - Whether to filter out comments (starting with !)
    /// * `filter_strings` - Whether to filter out string contents, quotes included
    #[must_use]
    pub fn new(content: &'a str, filter_comments: bool, filter_strings: bool) -> Self {
        Self::with_string_state(content, filter_comments, filter_strings, StringDelimiter::None)
    }

    /// Create a `CharFilter` that starts inside a string (for continued string literals)
    #[must_use]
    pub fn with_string_state(
        content: &'a str,
        filter_comments: bool,
        filter_strings: bool,
        string_state: StringDelimiter,
    ) -> Self {
        Self {
            chars: content.char_indices(),
            instring: string_state,
            incomment: false,
            filter_comments,
            filter_strings,
        }
    }

    /// Check if we're currently inside a string
    #[must_use]
    pub fn instring(&self) -> bool {
        self.instring != StringDelimiter::None
    }

    /// The delimiter we're currently inside, to carry string state across lines
    #[must_use]
    pub fn string_state(&self) -> StringDelimiter {
        self.instring
    }

    /// Get the filtered content as a string
    pub fn filter_all(&mut self) -> String {
        let mut result = String::new();
        for (_, c) in self.by_ref() {
            result.push(c);
        }
        result
    }
}

impl Iterator for CharFilter<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (pos, c) = self.chars.next()?;

            if self.incomment {
                if self.filter_comments {
                    continue;
                }
                return Some((pos, c));
            }

            match self.instring {
                StringDelimiter::None => match c {
                    '!' => {
                        self.incomment = true;
                        if self.filter_comments {
                            continue;
                        }
                    }
                    '\'' | '"' => {
                        self.instring = if c == '\'' {
                            StringDelimiter::Single
                        } else {
                            StringDelimiter::Double
                        };
                        if self.filter_strings {
                            continue;
                        }
                    }
                    _ => {}
                },
                StringDelimiter::Single | StringDelimiter::Double => {
                    let closing = matches!(
                        (self.instring, c),
                        (StringDelimiter::Single, '\'') | (StringDelimiter::Double, '"')
                    );
                    if closing {
                        self.instring = StringDelimiter::None;
                    }
                    if self.filter_strings {
                        continue;
                    }
                }
            }

            return Some((pos, c));
        }
    }
}

/// Split a physical line into its code and comment parts.
///
/// `state` is the string state at the start of the line and is updated to the
/// state at the end of the code part.
pub fn split_comment<'a>(line: &'a str, state: &mut StringDelimiter) -> (&'a str, &'a str) {
    let mut filter = CharFilter::with_string_state(line, false, false, *state);
    let mut comment_pos = None;
    while let Some((pos, c)) = filter.next() {
        if c == '!' && filter.incomment {
            comment_pos = Some(pos);
            break;
        }
    }
    *state = filter.string_state();

    match comment_pos {
        Some(pos) => (&line[..pos], &line[pos..]),
        None => (line, ""),
    }
}

/// Byte positions of `needle` outside string literals and comments.
#[must_use]
pub fn positions_outside_strings(text: &str, needle: char) -> Vec<usize> {
    CharFilter::new(text, true, true)
        .filter(|&(_, c)| c == needle)
        .map(|(pos, _)| pos)
        .collect()
}

/// Split on `sep` wherever it occurs outside string literals.
#[must_use]
pub fn split_outside_strings(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for pos in positions_outside_strings(text, sep) {
        parts.push(&text[start..pos]);
        start = pos + sep.len_utf8();
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filtering() {
        let input = r#"x = "hello" + 5"#;
        let filter = CharFilter::new(input, false, false);
        let result: String = filter.map(|(_, c)| c).collect();
        assert_eq!(result, input);
    }

    #[test]
    fn test_filter_strings() {
        let input = r#"x = "hello" + 5"#;
        let mut filter = CharFilter::new(input, false, true);
        assert_eq!(filter.filter_all(), "x =  + 5");
    }

    #[test]
    fn test_filter_comments() {
        let input = "x = 5 ! this is a comment";
        let filter = CharFilter::new(input, true, false);
        let result: String = filter.map(|(_, c)| c).collect();
        assert_eq!(result, "x = 5 ");
    }

    #[test]
    fn test_bang_inside_string_is_not_comment() {
        let input = "print *, 'hi!' ! real comment";
        let mut state = StringDelimiter::None;
        let (code, comment) = split_comment(input, &mut state);
        assert_eq!(code, "print *, 'hi!' ");
        assert_eq!(comment, "! real comment");
        assert_eq!(state, StringDelimiter::None);
    }

    #[test]
    fn test_doubled_quote_escape() {
        let input = "s = 'it''s ! here' ! tail";
        let mut state = StringDelimiter::None;
        let (code, comment) = split_comment(input, &mut state);
        assert_eq!(code, "s = 'it''s ! here' ");
        assert_eq!(comment, "! tail");
    }

    #[test]
    fn test_string_state_carries_over() {
        let mut state = StringDelimiter::None;
        let (code, comment) = split_comment("s = 'abc &", &mut state);
        assert_eq!(code, "s = 'abc &");
        assert_eq!(comment, "");
        assert_eq!(state, StringDelimiter::Single);

        let (code, comment) = split_comment("  &def' ! done", &mut state);
        assert_eq!(code, "  &def' ");
        assert_eq!(comment, "! done");
        assert_eq!(state, StringDelimiter::None);
    }

    #[test]
    fn test_split_outside_strings() {
        assert_eq!(
            split_outside_strings("a = 1; b = ';'; c = 2", ';'),
            vec!["a = 1", " b = ';'", " c = 2"]
        );
        assert_eq!(split_outside_strings("x = 1", ';'), vec!["x = 1"]);
    }

    #[test]
    fn test_position_tracking() {
        let input = "x = 5";
        let positions: Vec<usize> = CharFilter::new(input, false, false)
            .map(|(pos, _)| pos)
            .collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    }
}
