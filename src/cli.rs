//! Command-line interface for fordoc.
//!
//! Defines CLI arguments using clap builder API

use std::path::PathBuf;

use clap::{Arg, ArgAction, Command};

use crate::config::Settings;

/// Project file read when none is given on the command line
pub const DEFAULT_PROJECT_FILE: &str = "fordoc.toml";

/// CLI arguments parsed from command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// TOML project file
    pub project_file: Option<PathBuf>,

    /// Source directories, replacing `src_dir` from the project file
    pub src_dir: Vec<PathBuf>,

    /// Additional file exclude globs
    pub exclude: Vec<String>,

    /// Additional directory exclude globs
    pub exclude_dir: Vec<String>,

    /// Preprocessor macros (`-D`)
    pub macros: Vec<String>,

    /// Preprocessor include directories (`-I`)
    pub include: Vec<PathBuf>,

    /// Parser threads (0 = sequential)
    pub jobs: Option<usize>,

    /// Drop files that fail to parse
    pub force: bool,

    /// Unrecognized statements are errors
    pub strict: bool,

    /// Report unresolved names
    pub warn: bool,

    /// Lower-case statements before parsing
    pub lower: bool,

    /// Skip the preprocessor
    pub no_preprocess: bool,

    /// Print the entity tree
    pub tree: bool,

    /// Write the link directory to this file
    pub links: Option<PathBuf>,

    /// Base URL for link directory entries
    pub base_url: Option<String>,

    /// Log level filter (error, warn, info, debug, trace)
    pub log_level: Option<String>,

    /// Enable debug output
    pub debug: bool,

    /// Only print diagnostics
    pub quiet: bool,
}

impl CliArgs {
    /// Override project file settings with the options given on the command line
    pub fn apply_to(&self, settings: &mut Settings) {
        if !self.src_dir.is_empty() {
            settings.src_dir.clone_from(&self.src_dir);
        }
        settings.exclude.extend(self.exclude.iter().cloned());
        settings.exclude_dir.extend(self.exclude_dir.iter().cloned());
        settings.macros.extend(self.macros.iter().cloned());
        settings.include.extend(self.include.iter().cloned());
        if let Some(jobs) = self.jobs {
            settings.jobs = jobs;
        }
        settings.force |= self.force;
        settings.strict |= self.strict;
        settings.warn |= self.warn;
        settings.lower |= self.lower;
        if self.no_preprocess {
            settings.preprocess = false;
        }
        if let Some(url) = &self.base_url {
            settings.project_url.clone_from(url);
        }
    }
}

/// Build the clap Command for parsing CLI arguments
#[must_use]
pub fn build_cli() -> Command {
    Command::new("fordoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Documentation front-end for modern Fortran projects")
        .arg(
            Arg::new("project-file")
                .help("TOML project file [default: fordoc.toml if present]")
                .value_name("FILE")
                .required(false)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("src-dir")
                .short('d')
                .long("src-dir")
                .help("Source directory (can be repeated, replaces src_dir)")
                .value_name("DIR")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("exclude")
                .short('e')
                .long("exclude")
                .help("Exclude files matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("exclude-dir")
                .long("exclude-dir")
                .help("Exclude directories matching pattern (glob syntax, can be repeated)")
                .value_name("PATTERN")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("macro")
                .short('m')
                .long("macro")
                .help("Preprocessor macro, NAME or NAME=VALUE (can be repeated)")
                .value_name("MACRO")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("include")
                .short('I')
                .long("include")
                .help("Preprocessor include directory (can be repeated)")
                .value_name("DIR")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .help("Number of parser threads (0=sequential)")
                .value_name("NUM")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("force")
                .short('f')
                .long("force")
                .help("Skip files that fail to parse instead of stopping")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Treat unrecognized statements as errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("warn")
                .short('w')
                .long("warn")
                .help("Report names that cannot be resolved")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lower")
                .long("lower")
                .help("Lower-case source statements before parsing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-preprocess")
                .long("no-preprocess")
                .help("Do not run the preprocessor on fpp_extensions files")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tree")
                .short('t')
                .long("tree")
                .help("Print the entity tree")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("links")
                .short('o')
                .long("links")
                .help("Write the external link directory (JSON) to FILE")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Documentation base URL used in the link directory [default: project_url]")
                .value_name("URL"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("Log level: error, warn, info, debug, trace [default: warn]")
                .value_name("LEVEL")
                .value_parser(["error", "warn", "info", "debug", "trace"]),
        )
        .arg(
            Arg::new("debug")
                .short('D')
                .long("debug")
                .help("Enable debug output (same as --log-level debug)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print diagnostics")
                .action(ArgAction::SetTrue),
        )
}

/// Parse CLI arguments from command line
#[must_use]
pub fn parse_args() -> CliArgs {
    args_from_matches(&build_cli().get_matches())
}

/// Parse CLI arguments from an iterator (for testing)
#[must_use]
pub fn parse_args_from<I, T>(args: I) -> CliArgs
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    args_from_matches(&build_cli().get_matches_from(args))
}

/// Convert clap `ArgMatches` to `CliArgs`
fn args_from_matches(matches: &clap::ArgMatches) -> CliArgs {
    let strings = |id: &str| -> Vec<String> {
        matches
            .get_many::<String>(id)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default()
    };
    let paths = |id: &str| -> Vec<PathBuf> {
        matches
            .get_many::<PathBuf>(id)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default()
    };

    CliArgs {
        project_file: matches.get_one::<PathBuf>("project-file").cloned(),
        src_dir: paths("src-dir"),
        exclude: strings("exclude"),
        exclude_dir: strings("exclude-dir"),
        macros: strings("macro"),
        include: paths("include"),
        jobs: matches.get_one::<usize>("jobs").copied(),
        force: matches.get_flag("force"),
        strict: matches.get_flag("strict"),
        warn: matches.get_flag("warn"),
        lower: matches.get_flag("lower"),
        no_preprocess: matches.get_flag("no-preprocess"),
        tree: matches.get_flag("tree"),
        links: matches.get_one::<PathBuf>("links").cloned(),
        base_url: matches.get_one::<String>("base-url").cloned(),
        log_level: matches.get_one::<String>("log-level").cloned(),
        debug: matches.get_flag("debug"),
        quiet: matches.get_flag("quiet"),
    }
}
