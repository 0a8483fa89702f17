//! Documentation metadata and text normalization.
//!
//! An entity's documentation may open with a block of `key: value` lines:
//!
//! ```text
//! !! author: Jane Doe
//! !! version: 1.2
//! !! summary: Solves things.
//! !!     Indented lines continue the previous value.
//! !!
//! !! Narrative starts here.
//! ```
//!
//! Only recognized keys count. A first line such as `Note: read this` is
//! narrative, not metadata.

use log::debug;

/// Keys accepted in a metadata block.
pub const METADATA_KEYS: &[&str] = &[
    "author",
    "date",
    "version",
    "category",
    "summary",
    "deprecated",
    "display",
    "source",
    "graph",
    "proc_internals",
    "license",
    "since",
    "title",
];

/// Structured metadata parsed from the head of a documentation block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub author: Option<String>,
    pub date: Option<String>,
    pub version: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub license: Option<String>,
    pub since: Option<String>,
    pub title: Option<String>,
    pub deprecated: bool,
    /// Requested display set, lower-cased (`public`, `private`, `protected`, `none`)
    pub display: Option<Vec<String>>,
    pub source: Option<bool>,
    pub graph: Option<bool>,
    pub proc_internals: Option<bool>,
}

impl Metadata {
    fn set(&mut self, key: &str, value: String) {
        match key {
            "author" => self.author = Some(value),
            "date" => self.date = Some(value),
            "version" => self.version = Some(value),
            "category" => self.category = Some(value),
            "summary" => self.summary = Some(value),
            "license" => self.license = Some(value),
            "since" => self.since = Some(value),
            "title" => self.title = Some(value),
            "deprecated" => self.deprecated = parse_bool(key, &value).unwrap_or(false),
            "display" => {
                self.display = Some(
                    value
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|s| !s.is_empty())
                        .map(str::to_lowercase)
                        .collect(),
                );
            }
            "source" => self.source = parse_bool(key, &value),
            "graph" => self.graph = parse_bool(key, &value),
            "proc_internals" => self.proc_internals = parse_bool(key, &value),
            _ => {}
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        other => {
            debug!("ignoring metadata `{key}`: `{other}` is not a boolean");
            None
        }
    }
}

/// Split a metadata line into a recognized key and its value.
fn metadata_line(line: &str) -> Option<(String, &str)> {
    if line.starts_with(char::is_whitespace) {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    let key = key.trim().to_ascii_lowercase();
    if METADATA_KEYS.contains(&key.as_str()) {
        Some((key, value.trim()))
    } else {
        None
    }
}

/// Turn raw documentation lines into metadata and dedented narrative markdown.
#[must_use]
pub fn seal_documentation(lines: &[String]) -> (Metadata, String) {
    let lines = dedent(lines);
    let mut meta = Metadata::default();

    let start = lines.iter().position(|l| !l.trim().is_empty());
    let mut body_start = start.unwrap_or(lines.len());
    if let Some(first) = start {
        let mut current: Option<(String, String)> = None;
        let mut idx = first;
        while idx < lines.len() {
            let line = &lines[idx];
            if line.trim().is_empty() {
                break;
            }
            if let Some((key, value)) = metadata_line(line) {
                if let Some((k, v)) = current.take() {
                    meta.set(&k, v);
                }
                current = Some((key, value.to_string()));
            } else if line.starts_with(char::is_whitespace) && current.is_some() {
                if let Some((_, v)) = current.as_mut() {
                    if !v.is_empty() {
                        v.push(' ');
                    }
                    v.push_str(line.trim());
                }
            } else {
                break;
            }
            idx += 1;
        }
        if let Some((k, v)) = current {
            meta.set(&k, v);
            body_start = idx;
        }
    }

    let body = dedent(&lines[body_start..]);
    (meta, trim_blank_lines(&body).join("\n"))
}

/// Remove whitespace common to every non-blank line.
#[must_use]
pub fn dedent(lines: &[String]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.get(indent..).unwrap_or(l.trim_start()).trim_end().to_string()
            }
        })
        .collect()
}

fn trim_blank_lines(lines: &[String]) -> &[String] {
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |e| e + 1);
    &lines[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_plain_narrative() {
        let (meta, text) = seal_documentation(&doc(&[" doc for x"]));
        assert!(meta.is_empty());
        assert_eq!(text, "doc for x");
    }

    #[test]
    fn test_metadata_block() {
        let lines = doc(&[
            " author: Jane Doe",
            " version: 1.2",
            " summary: First part",
            "     continued here",
            "",
            " The narrative.",
        ]);
        let (meta, text) = seal_documentation(&lines);
        assert_eq!(meta.author.as_deref(), Some("Jane Doe"));
        assert_eq!(meta.version.as_deref(), Some("1.2"));
        assert_eq!(meta.summary.as_deref(), Some("First part continued here"));
        assert_eq!(text, "The narrative.");
    }

    #[test]
    fn test_unknown_key_is_narrative() {
        let (meta, text) = seal_documentation(&doc(&[" Note: this is prose"]));
        assert!(meta.is_empty());
        assert_eq!(text, "Note: this is prose");
    }

    #[test]
    fn test_display_and_flags() {
        let lines = doc(&[" display: public, private", " deprecated: true", " graph: false"]);
        let (meta, text) = seal_documentation(&lines);
        assert_eq!(
            meta.display,
            Some(vec!["public".to_string(), "private".to_string()])
        );
        assert!(meta.deprecated);
        assert_eq!(meta.graph, Some(false));
        assert!(text.is_empty());
    }

    #[test]
    fn test_dedent_keeps_relative_indent() {
        let lines = doc(&["   a", "     b", "", "   c"]);
        assert_eq!(dedent(&lines), doc(&["a", "  b", "", "c"]));
    }

    #[test]
    fn test_trailing_blank_lines_trimmed() {
        let (_, text) = seal_documentation(&doc(&["", " one", "", " two", "", ""]));
        assert_eq!(text, "one\n\ntwo");
    }
}
