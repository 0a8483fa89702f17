//! The project: every parsed file in one arena, plus registries.
//!
//! [`Project::load`] discovers, decodes, preprocesses and parses the files of
//! a project, in parallel when `jobs` is set, then merges the per-file trees in
//! path order so the result never depends on scheduling. [`Project::correlate`]
//! resolves names across files afterwards.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use log::{debug, info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::{Settings, SourceForm};
use crate::correlate;
use crate::entity::{Entity, EntityClass, EntityId, EntityKind, EntityTree, Link, Permission};
use crate::error::{Diagnostic, DiagnosticKind, Error, Result, Severity};
use crate::external::{ExternalIndex, LinkDirectory, LinkEntry, SCOPE_SEPARATOR};
use crate::parser::{parse_source, ParsedFile};
use crate::preprocess::{CommandPreprocessor, Preprocessor};

/// Flattened lists of the entities other code looks up by name.
///
/// Every list is in arena order, which is file path order and then
/// declaration order within a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub files: Vec<EntityId>,
    pub modules: Vec<EntityId>,
    pub submodules: Vec<EntityId>,
    pub programs: Vec<EntityId>,
    /// Top-level and module-level procedures
    pub procedures: Vec<EntityId>,
    pub interfaces: Vec<EntityId>,
    pub abstract_interfaces: Vec<EntityId>,
    pub types: Vec<EntityId>,
    pub block_data: Vec<EntityId>,
    /// Common blocks sharing a name across the project, keyed by lower-case name
    pub common: BTreeMap<String, Vec<EntityId>>,
}

impl Registry {
    #[must_use]
    pub fn build(tree: &EntityTree) -> Self {
        let mut registry = Self::default();
        for file in tree.roots() {
            registry.files.push(file);
            for &unit in &tree[file].children {
                match tree[unit].class() {
                    EntityClass::Module => {
                        registry.modules.push(unit);
                        registry.add_members(tree, unit);
                    }
                    EntityClass::Submodule => {
                        registry.submodules.push(unit);
                        registry.add_members(tree, unit);
                    }
                    EntityClass::Program => registry.programs.push(unit),
                    EntityClass::BlockData => registry.block_data.push(unit),
                    _ => registry.add_member(tree, unit),
                }
            }
        }
        for (id, entity) in tree.iter() {
            if entity.class() == EntityClass::CommonBlock {
                registry.common.entry(entity.key()).or_default().push(id);
            }
        }
        registry
    }

    fn add_members(&mut self, tree: &EntityTree, unit: EntityId) {
        for &member in &tree[unit].children {
            self.add_member(tree, member);
        }
    }

    fn add_member(&mut self, tree: &EntityTree, id: EntityId) {
        match tree[id].class() {
            EntityClass::Procedure => self.procedures.push(id),
            EntityClass::Interface => self.interfaces.push(id),
            EntityClass::AbstractInterface => self.abstract_interfaces.push(id),
            EntityClass::DerivedType => self.types.push(id),
            _ => {}
        }
    }

    /// Every registered entity except common blocks, in arena order.
    #[must_use]
    pub fn all(&self) -> Vec<EntityId> {
        let mut all: Vec<EntityId> = [
            &self.files,
            &self.modules,
            &self.submodules,
            &self.programs,
            &self.procedures,
            &self.interfaces,
            &self.abstract_interfaces,
            &self.types,
            &self.block_data,
        ]
        .into_iter()
        .flatten()
        .copied()
        .collect();
        all.sort_unstable();
        all
    }
}

#[derive(Debug, Clone)]
pub struct Project {
    settings: Settings,
    tree: EntityTree,
    registry: Registry,
    external: ExternalIndex,
    diagnostics: Vec<Diagnostic>,
    correlation: Vec<Diagnostic>,
}

impl Project {
    /// Discover and parse every source file named by `settings`, running
    /// `fpp_extensions` files through the configured preprocessor command.
    pub fn load(settings: Settings) -> Result<Self> {
        let command = command_preprocessor(&settings);
        Self::load_with(settings, command.as_ref().map(|c| c as &dyn Preprocessor))
    }

    /// As [`Project::load`], with `preprocessor` in place of the configured
    /// command. `None`, or `preprocess = false`, leaves sources untouched.
    pub fn load_with(settings: Settings, preprocessor: Option<&dyn Preprocessor>) -> Result<Self> {
        if let Some(problem) = settings.validate() {
            return Err(Error::Configuration(problem));
        }
        let files = collect_files(&settings);
        info!(files = files.len(), jobs = settings.jobs; "discovered source files");

        let preprocessor = preprocessor.filter(|_| settings.preprocess);
        let load = |path: &PathBuf| {
            let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
            let source = decode(&bytes, &settings.encoding, path)?;
            parse_file(&settings, preprocessor, path, &source)
        };
        let results = run_jobs(settings.jobs, &files, load);
        let mut project = Self::assemble(settings, files.into_iter().zip(results).collect())?;
        project.load_external()?;
        Ok(project)
    }

    /// Parse in-memory sources as if they had been read from their paths.
    pub fn from_sources<P, I>(sources: I, settings: Settings) -> Result<Self>
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (P, String)>,
    {
        let command = command_preprocessor(&settings);
        Self::from_sources_with(
            sources,
            settings,
            command.as_ref().map(|c| c as &dyn Preprocessor),
        )
    }

    /// As [`Project::from_sources`], with `preprocessor` in place of the
    /// configured command.
    pub fn from_sources_with<P, I>(
        sources: I,
        settings: Settings,
        preprocessor: Option<&dyn Preprocessor>,
    ) -> Result<Self>
    where
        P: Into<PathBuf>,
        I: IntoIterator<Item = (P, String)>,
    {
        if let Some(problem) = settings.validate() {
            return Err(Error::Configuration(problem));
        }
        let mut inputs: Vec<(PathBuf, String)> =
            sources.into_iter().map(|(p, s)| (p.into(), s)).collect();
        inputs.sort_by(|a, b| a.0.cmp(&b.0));

        let preprocessor = preprocessor.filter(|_| settings.preprocess);
        let parse = |(path, source): &(PathBuf, String)| {
            parse_file(&settings, preprocessor, path, source)
        };
        let results = run_jobs(settings.jobs, &inputs, parse);
        let paths = inputs.into_iter().map(|(p, _)| p);
        let mut project = Self::assemble(settings, paths.zip(results).collect())?;
        project.load_external()?;
        Ok(project)
    }

    /// Merge per-file results in path order. A failed file aborts the load
    /// unless `force` is set, in which case it is dropped with a diagnostic.
    fn assemble(
        settings: Settings,
        mut results: Vec<(PathBuf, Result<ParsedFile>)>,
    ) -> Result<Self> {
        results.sort_by(|a, b| a.0.cmp(&b.0));
        let mut tree = EntityTree::new();
        let mut diagnostics = Vec::new();
        for (path, result) in results {
            match result {
                Ok(file) => {
                    diagnostics.extend(file.diagnostics);
                    tree.absorb(file.tree);
                }
                Err(e) if settings.force => {
                    warn!(file:? = path, error:% = e; "dropping file");
                    let kind = match e {
                        Error::Parse(_) | Error::UnrecognizedStatement { .. } => {
                            DiagnosticKind::StructuralParse
                        }
                        _ => DiagnosticKind::Input,
                    };
                    diagnostics.push(
                        Diagnostic::warning(kind, format!("file dropped: {e}"))
                            .in_file(&path)
                            .with_severity(Severity::Error),
                    );
                }
                Err(e) => return Err(e),
            }
        }
        let registry = Registry::build(&tree);
        info!(
            files = registry.files.len(), modules = registry.modules.len(),
            procedures = registry.procedures.len(), entities = tree.len();
            "project assembled"
        );
        Ok(Self {
            settings,
            tree,
            registry,
            external: ExternalIndex::new(),
            diagnostics,
            correlation: Vec::new(),
        })
    }

    fn load_external(&mut self) -> Result<()> {
        for (label, path) in &self.settings.external {
            debug!(label = label.as_str(), path:? = path; "loading link directory");
            let directory = LinkDirectory::load(path)?;
            self.external.add(&directory);
        }
        Ok(())
    }

    /// Make the modules of another project's link directory available to `use`.
    pub fn add_external(&mut self, directory: &LinkDirectory) {
        self.external.add(directory);
    }

    /// Resolve names across the project. Replaces the results of any earlier run.
    pub fn correlate(&mut self) {
        let options = self.settings.correlate_options();
        self.correlation =
            correlate::correlate(&mut self.tree, &self.registry, &self.external, &options);
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn tree(&self) -> &EntityTree {
        &self.tree
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.tree[id]
    }

    #[must_use]
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        &self.tree[id].children
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn files(&self) -> &[EntityId] {
        &self.registry.files
    }

    #[must_use]
    pub fn modules(&self) -> &[EntityId] {
        &self.registry.modules
    }

    #[must_use]
    pub fn submodules(&self) -> &[EntityId] {
        &self.registry.submodules
    }

    #[must_use]
    pub fn programs(&self) -> &[EntityId] {
        &self.registry.programs
    }

    #[must_use]
    pub fn procedures(&self) -> &[EntityId] {
        &self.registry.procedures
    }

    #[must_use]
    pub fn types(&self) -> &[EntityId] {
        &self.registry.types
    }

    #[must_use]
    pub fn interfaces(&self) -> &[EntityId] {
        &self.registry.interfaces
    }

    #[must_use]
    pub fn abstract_interfaces(&self) -> &[EntityId] {
        &self.registry.abstract_interfaces
    }

    #[must_use]
    pub fn block_data(&self) -> &[EntityId] {
        &self.registry.block_data
    }

    /// Common blocks declared under `name` anywhere in the project.
    #[must_use]
    pub fn common_blocks(&self, name: &str) -> &[EntityId] {
        self.registry
            .common
            .get(&name.to_ascii_lowercase())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Parse diagnostics followed by those of the last correlation.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().chain(&self.correlation)
    }

    /// First registered entity called `name`, optionally of one kind.
    ///
    /// Names are not unique across a project; declaration order decides.
    #[must_use]
    pub fn lookup(&self, name: &str, class: Option<EntityClass>) -> Option<EntityId> {
        self.registry.all().into_iter().find(|&id| {
            let entity = &self.tree[id];
            entity.is_named(name) && class.map_or(true, |k| entity.class() == k)
        })
    }

    /// Procedures and interfaces `id` calls, in call order, without repeats.
    /// Calls that resolved to variables or types are skipped.
    #[must_use]
    pub fn callees(&self, id: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        for call in self.tree[id].kind.calls() {
            if let Link::Entity(target) = call.link {
                if self.tree[target].is_callable() && !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        out
    }

    /// Link directory of this project's modules and their public entities.
    #[must_use]
    pub fn link_directory(&self, base_url: &str) -> LinkDirectory {
        let base = base_url.trim_end_matches('/');
        let mut entries = Vec::new();
        for &module in &self.registry.modules {
            let entity = &self.tree[module];
            let module_name = entity.key();
            let page = format!("{base}/module/{module_name}.html");
            entries.push(LinkEntry {
                name: module_name.clone(),
                kind: EntityClass::Module.as_str().to_string(),
                url: page.clone(),
            });
            let EntityKind::Module(data) = &entity.kind else {
                continue;
            };
            let mut members: Vec<EntityId> = Vec::new();
            for &child in &entity.children {
                if self.tree[child].class() == EntityClass::Enum {
                    members.extend(&self.tree[child].children);
                } else {
                    members.push(child);
                }
            }
            for member in members {
                let member = &self.tree[member];
                let key = member.key();
                if key.is_empty()
                    || member.permission == Permission::Private
                    || !data.public_names.contains(&key)
                {
                    continue;
                }
                let class = member.class();
                let url = match class {
                    EntityClass::Procedure => format!("{base}/proc/{key}.html"),
                    EntityClass::Interface => format!("{base}/interface/{key}.html"),
                    EntityClass::AbstractInterface => format!("{base}/absinterface/{key}.html"),
                    EntityClass::DerivedType => format!("{base}/type/{key}.html"),
                    _ => format!("{page}#{}-{key}", class.as_str()),
                };
                entries.push(LinkEntry {
                    name: format!("{module_name}{SCOPE_SEPARATOR}{key}"),
                    kind: class.as_str().to_string(),
                    url,
                });
            }
        }
        LinkDirectory {
            version: LinkDirectory::VERSION,
            entries,
        }
    }
}

fn command_preprocessor(settings: &Settings) -> Option<CommandPreprocessor> {
    if settings.preprocess {
        CommandPreprocessor::new(&settings.preprocessor, &settings.macros, &settings.include)
    } else {
        None
    }
}

fn parse_file(
    settings: &Settings,
    preprocessor: Option<&dyn Preprocessor>,
    path: &Path,
    source: &str,
) -> Result<ParsedFile> {
    let form = settings.source_form(path).unwrap_or(SourceForm {
        fixed: false,
        preprocess: false,
    });
    let parse_settings = settings.parse_settings(form);
    match preprocessor {
        Some(pp) if form.preprocess => {
            let text = pp.preprocess(source, path)?;
            parse_source(&text, path, &parse_settings)
        }
        _ => parse_source(source, path, &parse_settings),
    }
}

/// Run `f` over `items`, on a pool of `jobs` threads or sequentially for 0.
/// Results keep the order of `items`.
fn run_jobs<T, F>(jobs: usize, items: &[T], f: F) -> Vec<Result<ParsedFile>>
where
    T: Sync,
    F: Fn(&T) -> Result<ParsedFile> + Sync,
{
    if jobs == 0 {
        return items.iter().map(f).collect();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| items.par_iter().map(&f).collect()),
        Err(e) => {
            warn!(jobs, error:% = e; "thread pool unavailable, parsing sequentially");
            items.iter().map(f).collect()
        }
    }
}

fn decode(bytes: &[u8], encoding: &str, path: &Path) -> Result<String> {
    let failure = || Error::Encoding {
        path: path.to_path_buf(),
        encoding: encoding.to_string(),
    };
    match encoding.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" => {
            let text = std::str::from_utf8(bytes).map_err(|_| failure())?;
            Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
        "latin-1" | "latin1" | "iso-8859-1" => Ok(bytes.iter().copied().map(char::from).collect()),
        _ => Err(failure()),
    }
}

/// Source files under every `src_dir`, sorted, honouring the exclude globs.
fn collect_files(settings: &Settings) -> Vec<PathBuf> {
    let exclude = patterns(&settings.exclude);
    let exclude_dir = patterns(&settings.exclude_dir);

    let mut files = Vec::new();
    for dir in &settings.src_dir {
        if !dir.is_dir() {
            warn!(dir:? = dir; "source directory not found");
            continue;
        }
        // WalkDir reports symlink loops as errors, which are skipped.
        let walker = WalkDir::new(dir)
            .follow_links(true)
            .max_depth(256)
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() > 0
                    && e.file_type().is_dir()
                    && is_excluded(relative(e.path(), dir), &exclude_dir))
            })
            .filter_map(std::result::Result::ok);
        for entry in walker {
            let path = entry.path();
            if path.is_file()
                && settings.source_form(path).is_some()
                && !is_excluded(relative(path, dir), &exclude)
            {
                files.push(path.to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    files
}

fn patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                warn!(pattern = p.as_str(), error:% = e; "ignoring invalid glob");
                None
            }
        })
        .collect()
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Whether a glob matches the path, its file name or any of its components.
fn is_excluded(path: &Path, patterns: &[Pattern]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let path_str = path.to_string_lossy();
    patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            || path.components().any(|component| match component {
                Component::Normal(c) => pattern.matches(&c.to_string_lossy()),
                _ => false,
            })
    })
}
