//! Project settings.
//!
//! This module provides the [`Settings`] struct which controls discovery,
//! reading, parsing and correlation. Settings are loaded from a TOML project
//! file and then overridden by CLI arguments; once [`Settings::validate`]
//! passes they are treated as immutable.
//!
//! ```toml
//! project = "heat"
//! src_dir = ["src"]
//! exclude_dir = ["build*"]
//! display = ["public", "protected"]
//!
//! [extra_mods]
//! netcdf = "https://docs.unidata.ucar.edu/netcdf-fortran/current/"
//!
//! [external]
//! mathlib = "../mathlib/links.json"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::correlate::CorrelateOptions;
use crate::error::{Error, Result};
use crate::parser::ParseSettings;
use crate::preprocess::DEFAULT_COMMAND;
use crate::reader::fixed_form::DEFAULT_COLUMN_LIMIT;
use crate::reader::ReaderOptions;

/// How one source file is read, chosen by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceForm {
    pub fixed: bool,
    pub preprocess: bool,
}

// Serde default functions
fn default_project() -> String {
    "Untitled Project".to_string()
}
fn default_src_dir() -> Vec<PathBuf> {
    vec![PathBuf::from("./src")]
}
fn default_extensions() -> Vec<String> {
    strings(&["f90", "f95", "f03", "f08", "f15"])
}
fn default_fixed_extensions() -> Vec<String> {
    strings(&["f", "for", "F", "FOR"])
}
fn default_fpp_extensions() -> Vec<String> {
    strings(&["F90", "F95", "F03", "F08", "F15", "F", "FOR", "fpp"])
}
fn default_encoding() -> String {
    "utf-8".to_string()
}
fn default_docmark() -> String {
    "!".to_string()
}
fn default_docmark_alt() -> String {
    "*".to_string()
}
fn default_predocmark() -> String {
    ">".to_string()
}
fn default_predocmark_alt() -> String {
    "|".to_string()
}
fn default_display() -> Vec<String> {
    strings(&["public", "protected"])
}
fn default_preprocessor() -> String {
    DEFAULT_COMMAND.to_string()
}
fn default_true() -> bool {
    true
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Project name (default: "Untitled Project")
    #[serde(default = "default_project")]
    pub project: String,

    /// Directories searched recursively for sources (default: `./src`)
    #[serde(default = "default_src_dir")]
    pub src_dir: Vec<PathBuf>,

    /// Free-form extensions
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Fixed-form extensions
    #[serde(default = "default_fixed_extensions")]
    pub fixed_extensions: Vec<String>,

    /// Extensions of files that go through the preprocessor first
    #[serde(default = "default_fpp_extensions")]
    pub fpp_extensions: Vec<String>,

    /// Ignore fixed-form text past column 72 (default: true)
    #[serde(default = "default_true")]
    pub fixed_length_limit: bool,

    /// `utf-8` or `latin-1` (default: utf-8)
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Glob patterns of files to skip
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Glob patterns of directories to skip
    #[serde(default)]
    pub exclude_dir: Vec<String>,

    #[serde(default = "default_docmark")]
    pub docmark: String,
    #[serde(default = "default_docmark_alt")]
    pub docmark_alt: String,
    #[serde(default = "default_predocmark")]
    pub predocmark: String,
    #[serde(default = "default_predocmark_alt")]
    pub predocmark_alt: String,

    /// Modules documented elsewhere, name to URL
    #[serde(default)]
    pub extra_mods: BTreeMap<String, String>,

    /// Link directories of other projects, label to JSON file
    #[serde(default)]
    pub external: BTreeMap<String, PathBuf>,

    /// Additional type keywords accepted in declarations
    #[serde(default)]
    pub extra_vartypes: Vec<String>,

    /// Permissions shown by default (default: public, protected)
    #[serde(default = "default_display")]
    pub display: Vec<String>,

    /// Lower-case all statements before parsing (default: false)
    #[serde(default)]
    pub lower: bool,

    /// Report unresolved names (default: false)
    #[serde(default)]
    pub warn: bool,

    /// Drop files that fail to parse instead of aborting (default: false)
    #[serde(default)]
    pub force: bool,

    /// Unrecognized statements are errors (default: false)
    #[serde(default)]
    pub strict: bool,

    /// Parser threads; 0 parses sequentially (default: 0)
    #[serde(default)]
    pub jobs: usize,

    /// Run the preprocessor on `fpp_extensions` files (default: true)
    #[serde(default = "default_true")]
    pub preprocess: bool,

    /// Preprocessor command line
    #[serde(default = "default_preprocessor")]
    pub preprocessor: String,

    /// Macros passed to the preprocessor as `-D`
    #[serde(default, rename = "macro")]
    pub macros: Vec<String>,

    /// Include directories passed to the preprocessor as `-I`
    #[serde(default)]
    pub include: Vec<PathBuf>,

    /// Base URL of the generated documentation
    #[serde(default)]
    pub project_url: String,

    /// Renderer hints, carried through untouched
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub graph: bool,
    #[serde(default)]
    pub proc_internals: bool,
}

/// Partial settings for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialSettings {
    pub project: Option<String>,
    pub src_dir: Option<Vec<PathBuf>>,
    pub extensions: Option<Vec<String>>,
    pub fixed_extensions: Option<Vec<String>>,
    pub fpp_extensions: Option<Vec<String>>,
    pub fixed_length_limit: Option<bool>,
    pub encoding: Option<String>,
    pub exclude: Option<Vec<String>>,
    pub exclude_dir: Option<Vec<String>>,
    pub docmark: Option<String>,
    pub docmark_alt: Option<String>,
    pub predocmark: Option<String>,
    pub predocmark_alt: Option<String>,
    #[serde(default)]
    pub extra_mods: BTreeMap<String, String>,
    #[serde(default)]
    pub external: BTreeMap<String, PathBuf>,
    pub extra_vartypes: Option<Vec<String>>,
    pub display: Option<Vec<String>>,
    pub lower: Option<bool>,
    pub warn: Option<bool>,
    pub force: Option<bool>,
    pub strict: Option<bool>,
    pub jobs: Option<usize>,
    pub preprocess: Option<bool>,
    pub preprocessor: Option<String>,
    #[serde(rename = "macro")]
    pub macros: Option<Vec<String>>,
    pub include: Option<Vec<PathBuf>>,
    pub project_url: Option<String>,
    pub source: Option<bool>,
    pub graph: Option<bool>,
    pub proc_internals: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            project: default_project(),
            src_dir: default_src_dir(),
            extensions: default_extensions(),
            fixed_extensions: default_fixed_extensions(),
            fpp_extensions: default_fpp_extensions(),
            fixed_length_limit: true,
            encoding: default_encoding(),
            exclude: Vec::new(),
            exclude_dir: Vec::new(),
            docmark: default_docmark(),
            docmark_alt: default_docmark_alt(),
            predocmark: default_predocmark(),
            predocmark_alt: default_predocmark_alt(),
            extra_mods: BTreeMap::new(),
            external: BTreeMap::new(),
            extra_vartypes: Vec::new(),
            display: default_display(),
            lower: false,
            warn: false,
            force: false,
            strict: false,
            jobs: 0,
            preprocess: true,
            preprocessor: default_preprocessor(),
            macros: Vec::new(),
            include: Vec::new(),
            project_url: String::new(),
            source: false,
            graph: false,
            proc_internals: false,
        }
    }
}

impl Settings {
    /// Values accepted in `display`
    const DISPLAY_VALUES: &'static [&'static str] = &["public", "private", "protected", "none"];
    /// Upper bound on parser threads
    const MAX_JOBS: usize = 1024;

    /// Validate settings before any file is read
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        let marks = [
            ("docmark", &self.docmark),
            ("docmark_alt", &self.docmark_alt),
            ("predocmark", &self.predocmark),
            ("predocmark_alt", &self.predocmark_alt),
        ];
        for (key, mark) in &marks {
            if mark.chars().count() != 1 {
                return Some(format!("{key} must be a single character, got `{mark}`"));
            }
        }
        for (i, (key, mark)) in marks.iter().enumerate() {
            if let Some((other, _)) = marks[i + 1..].iter().find(|(_, m)| m == mark) {
                return Some(format!("{key} and {other} are both `{mark}`"));
            }
        }
        if let Some(ext) = self.fixed_extensions.iter().find(|e| self.extensions.contains(e)) {
            return Some(format!(
                "extension `{ext}` is listed as both free and fixed form"
            ));
        }
        if let Some(value) = self
            .display
            .iter()
            .find(|v| !Self::DISPLAY_VALUES.contains(&v.to_ascii_lowercase().as_str()))
        {
            return Some(format!(
                "display value `{value}` is not one of {}",
                Self::DISPLAY_VALUES.join(", ")
            ));
        }
        for (name, path) in &self.external {
            if name.trim().is_empty() || path.as_os_str().is_empty() {
                return Some(format!(
                    "external entry `{name}` needs a name and a link directory path"
                ));
            }
        }
        for (name, url) in &self.extra_mods {
            if name.trim().is_empty() || url.trim().is_empty() {
                return Some(format!("extra_mods entry `{name}` needs a module name and a URL"));
            }
        }
        if self.src_dir.is_empty() {
            return Some("src_dir must name at least one directory".to_string());
        }
        if self.jobs > Self::MAX_JOBS {
            return Some(format!(
                "jobs {} exceeds maximum of {}",
                self.jobs,
                Self::MAX_JOBS
            ));
        }
        None
    }

    /// Load settings from a TOML project file
    ///
    /// Relative paths are taken relative to the file's directory.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut settings = Self::from_toml_str(&contents)
            .map_err(|e| Error::Configuration(format!("{}: {e}", path.display())))?;
        if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            settings.rebase(base);
        }
        Ok(settings)
    }

    /// Parse settings from TOML text, starting from the defaults.
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        let partial: PartialSettings = toml::from_str(contents)?;
        let mut settings = Self::default();
        settings.apply_partial(partial);
        Ok(settings)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: PartialSettings) {
        if let Some(v) = partial.project {
            self.project = v;
        }
        if let Some(v) = partial.src_dir {
            self.src_dir = v;
        }
        if let Some(v) = partial.extensions {
            self.extensions = v;
        }
        if let Some(v) = partial.fixed_extensions {
            self.fixed_extensions = v;
        }
        if let Some(v) = partial.fpp_extensions {
            self.fpp_extensions = v;
        }
        if let Some(v) = partial.fixed_length_limit {
            self.fixed_length_limit = v;
        }
        if let Some(v) = partial.encoding {
            self.encoding = v;
        }
        if let Some(v) = partial.exclude {
            self.exclude = v;
        }
        if let Some(v) = partial.exclude_dir {
            self.exclude_dir = v;
        }
        if let Some(v) = partial.docmark {
            self.docmark = v;
        }
        if let Some(v) = partial.docmark_alt {
            self.docmark_alt = v;
        }
        if let Some(v) = partial.predocmark {
            self.predocmark = v;
        }
        if let Some(v) = partial.predocmark_alt {
            self.predocmark_alt = v;
        }
        if let Some(v) = partial.extra_vartypes {
            self.extra_vartypes = v;
        }
        if let Some(v) = partial.display {
            self.display = v;
        }
        if let Some(v) = partial.lower {
            self.lower = v;
        }
        if let Some(v) = partial.warn {
            self.warn = v;
        }
        if let Some(v) = partial.force {
            self.force = v;
        }
        if let Some(v) = partial.strict {
            self.strict = v;
        }
        if let Some(v) = partial.jobs {
            self.jobs = v;
        }
        if let Some(v) = partial.preprocess {
            self.preprocess = v;
        }
        if let Some(v) = partial.preprocessor {
            self.preprocessor = v;
        }
        if let Some(v) = partial.macros {
            self.macros = v;
        }
        if let Some(v) = partial.include {
            self.include = v;
        }
        if let Some(v) = partial.project_url {
            self.project_url = v;
        }
        if let Some(v) = partial.source {
            self.source = v;
        }
        if let Some(v) = partial.graph {
            self.graph = v;
        }
        if let Some(v) = partial.proc_internals {
            self.proc_internals = v;
        }
        // Merge tables (partial values override)
        for (k, v) in partial.extra_mods {
            self.extra_mods.insert(k.to_ascii_lowercase(), v);
        }
        for (k, v) in partial.external {
            self.external.insert(k, v);
        }
    }

    fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.src_dir.iter_mut().for_each(join);
        self.include.iter_mut().for_each(join);
        self.external.values_mut().for_each(join);
    }

    /// Reading and parsing mode for `path`, `None` if it is not a source file.
    #[must_use]
    pub fn source_form(&self, path: &Path) -> Option<SourceForm> {
        let ext = path.extension()?.to_str()?;
        let preprocess = self.fpp_extensions.iter().any(|e| e == ext);
        let fixed = self.fixed_extensions.iter().any(|e| e == ext);
        let free = self.extensions.iter().any(|e| e == ext);
        if !(preprocess || fixed || free) {
            return None;
        }
        let fixed = fixed
            || (!free
                && self
                    .fixed_extensions
                    .iter()
                    .any(|e| e.eq_ignore_ascii_case(ext)));
        Some(SourceForm { fixed, preprocess })
    }

    #[must_use]
    pub fn reader_options(&self, fixed: bool) -> ReaderOptions {
        let mark = |s: &str, fallback: char| s.chars().next().unwrap_or(fallback);
        let defaults = ReaderOptions::default();
        ReaderOptions {
            docmark: mark(&self.docmark, defaults.docmark),
            docmark_alt: mark(&self.docmark_alt, defaults.docmark_alt),
            predocmark: mark(&self.predocmark, defaults.predocmark),
            predocmark_alt: mark(&self.predocmark_alt, defaults.predocmark_alt),
            fixed,
            column_limit: self.fixed_length_limit.then_some(DEFAULT_COLUMN_LIMIT),
            strip_comments: true,
        }
    }

    #[must_use]
    pub fn parse_settings(&self, form: SourceForm) -> ParseSettings {
        ParseSettings {
            reader: self.reader_options(form.fixed),
            extra_vartypes: self.extra_vartypes.clone(),
            lower: self.lower,
            strict: self.strict,
        }
    }

    #[must_use]
    pub fn correlate_options(&self) -> CorrelateOptions {
        CorrelateOptions {
            display: self.display.iter().filter_map(|d| d.parse().ok()).collect(),
            extra_mods: self
                .extra_mods
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            warn: self.warn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Permission;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.src_dir, vec![PathBuf::from("./src")]);
        assert_eq!(settings.docmark, "!");
        assert_eq!(settings.jobs, 0);
        assert!(settings.preprocess);
        assert!(settings.validate().is_none());
    }

    #[test]
    fn test_from_toml_str() {
        let settings = Settings::from_toml_str(
            r#"
            project = "heat"
            src_dir = ["lib", "app"]
            docmark = "<"
            macro = ["DEBUG"]
            jobs = 4

            [extra_mods]
            NetCDF = "https://netcdf.example/"
            "#,
        )
        .unwrap();
        assert_eq!(settings.project, "heat");
        assert_eq!(settings.src_dir.len(), 2);
        assert_eq!(settings.docmark, "<");
        assert_eq!(settings.macros, vec!["DEBUG".to_string()]);
        assert_eq!(settings.jobs, 4);
        assert_eq!(
            settings.extra_mods.get("netcdf").map(String::as_str),
            Some("https://netcdf.example/")
        );
        // untouched keys keep their defaults
        assert_eq!(settings.docmark_alt, "*");
        assert!(settings.fixed_length_limit);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::from_toml_str("colour = true").is_err());
    }

    #[test]
    fn test_apply_partial_preserves_unset() {
        let mut base = Settings {
            warn: true,
            ..Default::default()
        };
        let partial = PartialSettings {
            lower: Some(true),
            ..Default::default()
        };
        base.apply_partial(partial);
        assert!(base.warn);
        assert!(base.lower);
    }

    #[test]
    fn test_from_toml_file_rebases_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fordoc.toml");
        std::fs::write(
            &path,
            "src_dir = [\"src\"]\n[external]\nmath = \"links/math.json\"\n",
        )
        .unwrap();
        let settings = Settings::from_toml_file(&path).unwrap();
        assert_eq!(settings.src_dir, vec![tmp.path().join("src")]);
        assert_eq!(settings.external["math"], tmp.path().join("links/math.json"));
    }

    #[test]
    fn test_from_toml_file_bad_syntax() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("fordoc.toml");
        std::fs::write(&path, "src_dir = [").unwrap();
        let err = Settings::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_validate_docmark_length() {
        let settings = Settings {
            docmark: "!!".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().unwrap().contains("docmark"));
    }

    #[test]
    fn test_validate_docmarks_distinct() {
        let settings = Settings {
            predocmark: "!".to_string(),
            ..Default::default()
        };
        let message = settings.validate().unwrap();
        assert!(message.contains("docmark and predocmark"));
    }

    #[test]
    fn test_validate_extension_overlap() {
        let settings = Settings {
            fixed_extensions: vec!["f90".to_string()],
            ..Default::default()
        };
        assert!(settings.validate().unwrap().contains("f90"));
    }

    #[test]
    fn test_validate_display_values() {
        let settings = Settings {
            display: vec!["public".to_string(), "secret".to_string()],
            ..Default::default()
        };
        assert!(settings.validate().unwrap().contains("secret"));
    }

    #[test]
    fn test_validate_external_entries() {
        let mut settings = Settings::default();
        settings.external.insert("math".to_string(), PathBuf::new());
        assert!(settings.validate().unwrap().contains("math"));
    }

    #[test]
    fn test_source_form_by_extension() {
        let settings = Settings::default();
        let form = |p: &str| settings.source_form(Path::new(p));
        assert_eq!(
            form("a.f90"),
            Some(SourceForm {
                fixed: false,
                preprocess: false
            })
        );
        assert_eq!(
            form("a.f"),
            Some(SourceForm {
                fixed: true,
                preprocess: false
            })
        );
        assert_eq!(
            form("a.F90"),
            Some(SourceForm {
                fixed: false,
                preprocess: true
            })
        );
        assert_eq!(
            form("a.F"),
            Some(SourceForm {
                fixed: true,
                preprocess: true
            })
        );
        assert_eq!(form("a.c"), None);
        assert_eq!(form("Makefile"), None);
    }

    #[test]
    fn test_reader_options_follow_settings() {
        let settings = Settings {
            docmark: "<".to_string(),
            fixed_length_limit: false,
            ..Default::default()
        };
        let options = settings.reader_options(true);
        assert_eq!(options.docmark, '<');
        assert!(options.fixed);
        assert_eq!(options.column_limit, None);
    }

    #[test]
    fn test_correlate_options() {
        let settings = Settings {
            display: vec!["public".to_string(), "private".to_string()],
            warn: true,
            ..Default::default()
        };
        let options = settings.correlate_options();
        assert_eq!(options.display, vec![Permission::Public, Permission::Private]);
        assert!(options.warn);
    }
}
