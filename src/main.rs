//! fordoc - Documentation front-end for modern Fortran projects

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use fordoc::cli::DEFAULT_PROJECT_FILE;
use fordoc::{parse_args, CliArgs, EntityId, Project, Settings, Severity};
use log::{debug, info, LevelFilter};

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(&args);
    debug!(args:?; "parsed arguments");

    let settings = build_settings(&args)?;
    let mut project = Project::load(settings).context("failed to load project")?;
    project.correlate();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if !args.quiet {
        print_summary(&mut out, &project)?;
    }
    if args.tree {
        for &file in project.files() {
            print_tree(&mut out, &project, file, 0)?;
        }
    }

    let mut errors = 0;
    for diagnostic in project.diagnostics() {
        let label = match diagnostic.severity {
            Severity::Warning => "warning",
            Severity::Error => {
                errors += 1;
                "error"
            }
        };
        eprintln!("{label}: {diagnostic}");
    }

    if let Some(path) = &args.links {
        let base_url = &project.settings().project_url;
        project
            .link_directory(base_url)
            .save(path)
            .with_context(|| format!("failed to write link directory {}", path.display()))?;
        info!(path:? = path; "link directory written");
    }

    if errors > 0 && !project.settings().force {
        bail!("{errors} error(s) reported");
    }
    Ok(())
}

fn init_logging(args: &CliArgs) {
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        args.log_level
            .as_deref()
            .and_then(|l| LevelFilter::from_str(l).ok())
            .unwrap_or(LevelFilter::Warn)
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();
}

/// Load the project file (explicit, or `fordoc.toml` when present) and apply
/// command-line overrides.
fn build_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = match &args.project_file {
        Some(path) => Settings::from_toml_file(path)
            .with_context(|| format!("failed to read project file {}", path.display()))?,
        None if Path::new(DEFAULT_PROJECT_FILE).is_file() => {
            Settings::from_toml_file(Path::new(DEFAULT_PROJECT_FILE))?
        }
        None => Settings::default(),
    };
    args.apply_to(&mut settings);
    if let Some(problem) = settings.validate() {
        bail!("invalid configuration: {problem}");
    }
    debug!(settings:?; "effective settings");
    Ok(settings)
}

fn print_summary(out: &mut impl Write, project: &Project) -> io::Result<()> {
    writeln!(out, "{}", project.settings().project)?;
    let counts = [
        ("files", project.files().len()),
        ("modules", project.modules().len()),
        ("submodules", project.submodules().len()),
        ("programs", project.programs().len()),
        ("procedures", project.procedures().len()),
        ("interfaces", project.interfaces().len()),
        ("abstract interfaces", project.abstract_interfaces().len()),
        ("types", project.types().len()),
        ("block data", project.block_data().len()),
    ];
    for (label, count) in counts {
        writeln!(out, "  {label:<20} {count}")?;
    }
    Ok(())
}

fn print_tree(
    out: &mut impl Write,
    project: &Project,
    id: EntityId,
    depth: usize,
) -> io::Result<()> {
    let entity = project.entity(id);
    let location = entity.location;
    write!(
        out,
        "{:indent$}{} {} [{}] ({}-{})",
        "",
        entity.class(),
        entity.name,
        entity.permission,
        location.line_start,
        location.line_end,
        indent = depth * 2
    )?;
    if let Some(summary) = entity.doc.lines().find(|l| !l.trim().is_empty()) {
        write!(out, "  {}", summary.trim())?;
    }
    writeln!(out)?;
    for &child in project.children(id) {
        print_tree(out, project, child, depth + 1)?;
    }
    Ok(())
}
