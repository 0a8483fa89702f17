/// Regex patterns for Fortran statements
///
/// All patterns are compiled once on first use using `LazyLock` and match the
/// trimmed, label-free text of one logical statement. The `regex` crate has no
/// lookaround, so the few places that need it are checked by the caller
/// (`type is`, `class is`, `class default`).
///
/// All regexes use case-insensitive + unicode flags
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// Build a case-insensitive regex from a compile-time constant pattern.
///
/// # Panics
///
/// Panics if the pattern is invalid. This is acceptable because all patterns
/// in this module are compile-time constants that are verified by tests.
/// The panic occurs at first access of the `LazyLock` static.
pub(crate) fn build_re(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .unwrap_or_else(|_| panic!("Invalid regex pattern: {pattern}"))
}

/// Intrinsic type keywords that open a declaration.
pub const VAR_TYPES: &str = r"integer|real|double\s*precision|character|complex|double\s*complex|logical|type|class|procedure|enumerator";

// ===== STRUCTURE =====

pub static CONTAINS_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^contains$"));
pub static PERMISSION_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(public|private|protected)$"));
pub static SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^sequence$"));
pub static FORMAT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^[0-9]+\s+format\s*\(.*\)"));

// Statement label: numeric prefix like "100 " at start of line
pub static LABEL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^\d+\s+"));

// Standalone attribute statements: `public :: a, b`, `dimension x(3)`, `parameter (n = 3)`.
// The `\b` alternative keeps `save_value = 1` from reading as `save _value`.
pub static ATTRIB_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(asynchronous|allocatable|bind\s*\(.*?\)|contiguous|dimension|external|intent\s*\(\s*\w+\s*\)|optional|parameter|pointer|private|protected|public|save|target|value|volatile)(?:\s*::\s*|\b\s*|\s+)((?:/|\(|\w).*?)\s*$",
    )
});

pub static END_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^end\s*(?:(module|submodule|subroutine|function|procedure|program|type|interface|enum|block\s*data|block|associate)(?:\s+(\w.*))?)?$",
    )
});

pub static MODPROC_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?P<module>module\s+)?procedure\s*(?:::|\s)\s*(?P<names>\w.*)$")
});

pub static BLOCK_DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^block\s*data(?:\s+(\w+))?\s*$"));
pub static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^(\w+\s*:)?\s*block\s*$"));
pub static ASSOCIATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?:\w+\s*:)?\s*associate\s*\((?P<associations>.+)\)\s*$")
});

pub static MODULE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^module(?:\s+(?P<name>\w+))?$"));
pub static SUBMODULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^submodule\s*\(\s*(?P<ancestor>\w+)\s*(?::\s*(?P<parent>\w+))?\s*\)\s*(?P<name>\w+)$",
    )
});
pub static PROGRAM_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^program(?:\s+(\w+))?$"));

// SUBROUTINE / FUNCTION headers. Prefixes are validated by the classifier.
pub static SUBROUTINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?:(?P<prefix>.+?)\s+)?subroutine\s+(?P<name>\w+)\s*(?P<arguments>\([^()]*\))?\s*(?P<rest>.*)$",
    )
});
pub static FUNCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?:(?P<prefix>.+?)\s*)?\bfunction\s+(?P<name>\w+)\s*(?P<arguments>\([^()]*\))?\s*(?P<rest>.*)$",
    )
});
pub static RESULT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"\bresult\s*\(\s*(\w+)\s*\)"));
pub static BIND_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"\bbind\s*\("));

// Derived type definition; `type is (...)` is rejected by the classifier
pub static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^type(?:\s+|\s*(?P<attributes>,.*)?::\s*)(?P<name>\w+)\s*(?P<parameters>\([^()]*\))?\s*$")
});
pub static EXTENDS_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"extends\s*\(\s*(?P<base>[^()\s]+)\s*\)"));

pub static INTERFACE_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(abstract\s+)?interface(?:\s+(.+))?$"));
pub static ENUM_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^enum\s*,\s*bind\s*\(.*\)\s*$"));

// Type-bound procedures
pub static BOUNDPROC_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(
        r"^(?P<generic>generic|procedure)\s*(?P<prototype>\([^()]*\))?\s*(?:,\s*(?P<attributes>\w[^:]*))?(?:\s*::)?\s*(?P<names>\w.*)$",
    )
});
pub static FINAL_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^final\s*(?:::)?\s*(\w.*)"));

pub static COMMON_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^common(?:\s*/\s*(\w*)\s*/\s*|\s+)(\w+.*)"));
pub static NAMELIST_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^namelist\s*/\s*(\w+)\s*/\s*(\w.*)$"));
pub static COMMON_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"/\s*(\w*)\s*/"));

pub static USE_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^use(?:\s*(?:,\s*(?:non_)?intrinsic\s*)?::\s*|\s+)(\w+)\s*($|,.*)")
});
pub static ONLY_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^\s*,\s*only\s*:\s*"));
pub static RENAME_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^(\w+)\s*=>\s*(\w+)$"));

// Statements with nothing to document
pub static IGNORED_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?:(?:implicit|import|include|data|entry|equivalence)\b|save$)")
});
pub static ARITH_GOTO_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"go\s*to\s*\([0-9,\s]+\)"));

// ===== DECLARATIONS =====

pub static KIND_RE: LazyLock<Regex> = LazyLock::new(|| build_re(r"^kind\s*=\s*([^,\s]+)"));
pub static LEN_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(?:len\s*=\s*(\w+|\*|:)|(\d+))"));
pub static PROTO_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(\*|\w+)\s*(?:\((.*)\))?"));
pub static ATTRIBSPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^,\s*(\w.*?)::\s*(.*?)\s*$"));
pub static KIND_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| build_re(r"^(?P<initial>.*?)_(?P<kind>[a-z]\w*|\d+)$"));

// ===== CALLS =====

// Function reference with an optional component chain: `a%b()%f()`
pub static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"(?P<call_chain>(?:(?:\s*\w+\s*(?:\(\))?\s*%\s*)+)?(?:\w+\s*\(\)))")
});
pub static SUBCALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    build_re(r"^(?:if\s*\(\)\s*)?call\s+(?P<call_chain>(?:.*%\s*)?(?:\w+\s*(?:\(\))?))")
});

/// Declaration matcher, extended with configured extra type names.
#[derive(Debug, Clone)]
pub struct VariablePattern {
    declaration: Regex,
    keyword: Regex,
}

impl VariablePattern {
    #[must_use]
    pub fn new(extra_vartypes: &[String]) -> Self {
        let extra: String = extra_vartypes
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| format!("|{}", regex::escape(t.trim())))
            .collect();
        Self {
            declaration: build_re(&format!(r"^({VAR_TYPES}{extra})\s*((?:\(|\s\w|[:,*]).*)$")),
            keyword: build_re(&format!(r"^({VAR_TYPES}{extra})")),
        }
    }

    /// True for declaration statements, excluding `type is`, `class is` and
    /// `class default` guards of `select type`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        let Some(caps) = self.declaration.captures(text) else {
            return false;
        };
        let keyword = caps[1].to_ascii_lowercase();
        let rest = caps[2].trim_start().to_ascii_lowercase();
        let guard = match keyword.as_str() {
            "type" => starts_with_word(&rest, "is"),
            "class" => starts_with_word(&rest, "is") || starts_with_word(&rest, "default"),
            _ => false,
        };
        !guard
    }

    /// Leading type keyword and the text after it.
    #[must_use]
    pub fn split<'a>(&self, text: &'a str) -> Option<(&'a str, &'a str)> {
        let m = self.keyword.find(text)?;
        Some((&text[..m.end()], &text[m.end()..]))
    }
}

impl Default for VariablePattern {
    fn default() -> Self {
        Self::new(&[])
    }
}

fn starts_with_word(text: &str, word: &str) -> bool {
    text.strip_prefix(word)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}
