//! Recursive-descent construction of the entity tree of one source file.
//!
//! Every open container has a [`Scope`] holding the state that only matters
//! while its body is read: whether `contains` was seen, the default
//! permission for new children, attribute statements still to apply and the
//! documentation collected so far. Nested containers recurse; their `end`
//! statement seals the entity and hands control back to the parent.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::PathBuf;

use log::{debug, trace};

use super::calls::{scan_calls, Associations};
use super::declaration::{parse_type, Declaration};
use super::patterns::{VariablePattern, KIND_SUFFIX_RE};
use super::statement::{
    classify, NamedGroup, ProcedureHeader, Statement, StatementContext, TypeHeader,
};
use super::text::{mask_strings, split_list, squeeze};
use super::ParseSettings;
use crate::entity::metadata::seal_documentation;
use crate::entity::{
    CommonData, Entity, EntityClass, EntityId, EntityKind, EntityTree, EnumData, InterfaceData,
    InterfaceKind, Location, ModuleData, NamelistData, Permission, ProcedureData, ProcedureKind,
    ProgramData, Reference, SubmoduleData, TypeData, UnitData, VariableData,
};
use crate::error::{Diagnostic, DiagnosticKind, Error, ParseError, Result, Severity};
use crate::reader::{DocPlacement, LineCursor, LogicalLine};

/// Deepest container nesting accepted before the file is rejected.
pub const MAX_NESTING: usize = 64;

/// One name named by an attribute statement such as `public :: a, b`.
#[derive(Debug, Clone)]
struct AttributeEntry {
    /// Lower-cased, whitespace removed
    name: String,
    /// Attribute as written, whitespace removed
    attribute: String,
    dimension: Option<String>,
}

/// Parse state of an open container.
#[derive(Debug)]
struct Scope {
    id: EntityId,
    class: EntityClass,
    in_contains: bool,
    /// Permission given to new children without an explicit one
    child_permission: Permission,
    /// Children whose permission follows the module default
    defaulted: Vec<EntityId>,
    block_level: usize,
    associations: Associations,
    attributes: Vec<AttributeEntry>,
    /// Values from `parameter (name = value)` statements
    params: HashMap<String, String>,
    docs: Vec<String>,
}

impl Scope {
    fn new(id: EntityId, class: EntityClass, docs: Vec<String>) -> Self {
        let child_permission = if class == EntityClass::Submodule {
            Permission::Private
        } else {
            Permission::Public
        };
        Self {
            id,
            class,
            in_contains: false,
            child_permission,
            defaulted: Vec::new(),
            block_level: 0,
            associations: Associations::default(),
            attributes: Vec::new(),
            params: HashMap::new(),
            docs,
        }
    }

    fn is_module_like(&self) -> bool {
        matches!(self.class, EntityClass::Module | EntityClass::Submodule)
    }

    fn has_executable_part(&self) -> bool {
        matches!(self.class, EntityClass::Procedure | EntityClass::Program)
    }

    fn context(&self) -> StatementContext {
        StatementContext {
            in_block: self.block_level > 0,
            in_interface: self.class == EntityClass::Interface,
            in_type_contains: self.class == EntityClass::DerivedType && self.in_contains,
        }
    }
}

/// Documentation of a line, optionally filtered by placement.
fn docs_where(line: &LogicalLine, keep: impl Fn(DocPlacement) -> bool) -> Vec<String> {
    line.docs
        .iter()
        .filter(|d| keep(d.placement))
        .map(|d| d.text.clone())
        .collect()
}

fn all_docs(line: &LogicalLine) -> Vec<String> {
    docs_where(line, |_| true)
}

/// Compare names ignoring case and whitespace, so `operator (+)` matches `operator(+)`.
fn same_name(a: &str, b: &str) -> bool {
    squeeze(a).eq_ignore_ascii_case(&squeeze(b))
}

/// Implicit typing: names starting with `i` to `n` are integers.
fn implicit_type(name: &str) -> &'static str {
    match name.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('i'..='n') => "integer",
        _ => "real",
    }
}

/// Builds one file's entity tree from its logical lines.
pub struct Parser<'s, R: BufRead> {
    cursor: LineCursor<R>,
    path: PathBuf,
    settings: &'s ParseSettings,
    vars: VariablePattern,
    tree: EntityTree,
    diagnostics: Vec<Diagnostic>,
    programs: usize,
}

impl<'s, R: BufRead> Parser<'s, R> {
    pub fn new(cursor: LineCursor<R>, settings: &'s ParseSettings) -> Self {
        let path = cursor.path().to_path_buf();
        Self {
            cursor,
            path,
            settings,
            vars: VariablePattern::new(&settings.extra_vartypes),
            tree: EntityTree::new(),
            diagnostics: Vec::new(),
            programs: 0,
        }
    }

    /// Parse the whole file under a `SourceFile` root.
    pub fn parse(mut self, root: Entity) -> Result<(EntityTree, EntityId, Vec<Diagnostic>)> {
        let root_id = self.tree.add(None, root);
        let mut scope = Scope::new(root_id, EntityClass::SourceFile, Vec::new());
        self.parse_scope(&mut scope, 0)?;
        let (meta, doc) = seal_documentation(&scope.docs);
        let file = &mut self.tree[root_id];
        file.meta = meta;
        file.doc = doc;
        file.location.line_start = 1;
        file.location.line_end = self.cursor.line_number();
        Ok((self.tree, root_id, self.diagnostics))
    }

    fn structural(&self, line: usize, message: impl Into<String>) -> Error {
        ParseError::new(&self.path, line, message).into()
    }

    fn diagnose(&mut self, kind: DiagnosticKind, line: usize, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(kind, message).at(&self.path, line);
        debug!(file:? = self.path, line = line; "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// A statement with no place in `scope`: a diagnostic, or an error in strict mode.
    fn unrecognized(&mut self, scope: &Scope, line: &LogicalLine, text: &str) -> Result<()> {
        if self.settings.strict {
            return Err(Error::UnrecognizedStatement {
                file: self.path.clone(),
                line: line.line_start,
                statement: text.to_string(),
            });
        }
        let message = format!(
            "unrecognized statement in {} `{}`: {text}",
            scope.class,
            self.tree[scope.id].name
        );
        self.diagnose(DiagnosticKind::UnrecognizedStatement, line.line_start, message);
        Ok(())
    }

    fn misplaced(&mut self, scope: &Scope, line: &LogicalLine, what: &str) {
        let message = format!(
            "{what} is not allowed in {} `{}`",
            scope.class,
            self.tree[scope.id].name
        );
        self.diagnose(DiagnosticKind::Structure, line.line_start, message);
    }

    /// Read statements into `scope` until its `end` statement (or the end of
    /// the file for the file scope). Returns documentation following the
    /// `end` statement, which belongs to the parent.
    fn parse_scope(&mut self, scope: &mut Scope, depth: usize) -> Result<Vec<String>> {
        loop {
            let Some(line) = self.cursor.advance()? else {
                if scope.class == EntityClass::SourceFile {
                    return Ok(Vec::new());
                }
                let line_number = self.cursor.line_number();
                return Err(self.structural(
                    line_number,
                    format!(
                        "file ended while still nested in {} `{}`",
                        scope.class,
                        self.tree[scope.id].name
                    ),
                ));
            };
            if line.is_doc_only() {
                scope.docs.extend(all_docs(&line));
                continue;
            }
            if let Some(following) = self.statement(scope, &line, depth)? {
                return Ok(following);
            }
        }
    }

    /// Handle one statement. Returns `Some(docs)` when it closed `scope`.
    fn statement(
        &mut self,
        scope: &mut Scope,
        line: &LogicalLine,
        depth: usize,
    ) -> Result<Option<Vec<String>>> {
        let lead = line.text.len() - line.text.trim_start().len();
        let text = if self.settings.lower {
            line.text.to_ascii_lowercase()
        } else {
            line.text.clone()
        };
        let body = &text[lead..];
        trace!(line = line.line_start; "statement: {body}");

        match classify(body, &self.vars, scope.context()) {
            Statement::End { kind, name } => {
                return self.end_statement(scope, line, kind.as_deref(), name.as_deref());
            }
            Statement::Contains => {
                scope.docs.extend(all_docs(line));
                let allowed = matches!(
                    scope.class,
                    EntityClass::Module
                        | EntityClass::Submodule
                        | EntityClass::Program
                        | EntityClass::Procedure
                        | EntityClass::DerivedType
                );
                if !allowed || scope.in_contains {
                    self.misplaced(scope, line, "`contains`");
                }
                scope.in_contains = true;
                if scope.class == EntityClass::DerivedType {
                    scope.child_permission = Permission::Public;
                }
            }
            Statement::Permission(permission) => {
                scope.docs.extend(all_docs(line));
                self.permission_statement(scope, line, permission);
            }
            Statement::Sequence => {
                scope.docs.extend(all_docs(line));
                if let EntityKind::DerivedType(t) = &mut self.tree[scope.id].kind {
                    t.sequence = true;
                } else {
                    self.misplaced(scope, line, "`sequence`");
                }
            }
            Statement::Format | Statement::Ignored => scope.docs.extend(all_docs(line)),
            Statement::Attribute { attribute, names } => {
                scope.docs.extend(all_docs(line));
                record_attribute(scope, &attribute, &names);
            }
            Statement::ModuleProcedures { module, names } => {
                if scope.class == EntityClass::Interface {
                    scope.docs.extend(all_docs(line));
                    if let EntityKind::Interface(i) = &mut self.tree[scope.id].kind {
                        i.procedures.extend(names.into_iter().map(Reference::new));
                    }
                } else if module && names.len() == 1 && scope.in_contains && scope.is_module_like()
                {
                    let name = names.into_iter().next().unwrap_or_default();
                    let mut data = ProcedureData::new(ProcedureKind::ModuleProcedure);
                    data.module_interface = Some(Reference::new(name.clone()));
                    let entity = Entity::new(name, EntityKind::Procedure(data));
                    self.open(scope, entity, None, line, depth)?;
                } else {
                    scope.docs.extend(all_docs(line));
                    self.misplaced(scope, line, "`module procedure`");
                }
            }
            Statement::BlockData { name } => {
                if scope.class != EntityClass::SourceFile {
                    self.misplaced(scope, line, "`block data`");
                }
                let entity = Entity::new(
                    name.unwrap_or_default(),
                    EntityKind::BlockData(UnitData { uses: Vec::new() }),
                );
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Block => {
                scope.docs.extend(all_docs(line));
                scope.block_level += 1;
            }
            Statement::Associate { associations } => {
                scope.docs.extend(all_docs(line));
                scope.associations.add_batch(&associations);
            }
            Statement::Module { name } => {
                if scope.class != EntityClass::SourceFile {
                    self.misplaced(scope, line, "`module`");
                }
                let entity = Entity::new(
                    name,
                    EntityKind::Module(ModuleData {
                        uses: Vec::new(),
                        default_permission: Permission::Public,
                        public_names: Vec::new(),
                    }),
                );
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Submodule {
                ancestor,
                parent,
                name,
            } => {
                if scope.class != EntityClass::SourceFile {
                    self.misplaced(scope, line, "`submodule`");
                }
                let entity = Entity::new(
                    name,
                    EntityKind::Submodule(SubmoduleData {
                        uses: Vec::new(),
                        ancestor: Reference::new(ancestor),
                        parent_submodule: parent.map(Reference::new),
                        default_permission: Permission::Private,
                    }),
                );
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Program { name } => {
                if scope.class != EntityClass::SourceFile {
                    self.misplaced(scope, line, "`program`");
                }
                self.programs += 1;
                if self.programs > 1 {
                    self.diagnose(
                        DiagnosticKind::Structure,
                        line.line_start,
                        "more than one program in file",
                    );
                }
                let entity = Entity::new(
                    name.unwrap_or_default(),
                    EntityKind::Program(ProgramData {
                        uses: Vec::new(),
                        calls: Vec::new(),
                    }),
                );
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Procedure(header) => {
                let allowed = match scope.class {
                    EntityClass::SourceFile | EntityClass::Interface => true,
                    EntityClass::Module
                    | EntityClass::Submodule
                    | EntityClass::Program
                    | EntityClass::Procedure => scope.in_contains,
                    _ => false,
                };
                if !allowed {
                    self.misplaced(scope, line, "procedure definition");
                }
                let entity = procedure_entity(header);
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Type(header) => {
                if !self.definition_allowed(scope) {
                    self.misplaced(scope, line, "derived type definition");
                }
                let permission = header.permission;
                let entity = type_entity(header);
                self.open(scope, entity, permission, line, depth)?;
            }
            Statement::Interface { is_abstract, name } => {
                if !self.definition_allowed(scope) {
                    self.misplaced(scope, line, "interface block");
                }
                match name {
                    Some(name) if !is_abstract => {
                        let entity = Entity::new(
                            name,
                            EntityKind::Interface(InterfaceData {
                                interface_kind: InterfaceKind::Generic,
                                procedures: Vec::new(),
                            }),
                        );
                        self.open(scope, entity, None, line, depth)?;
                    }
                    _ => {
                        let following =
                            self.interface_block(scope, is_abstract, all_docs(line), depth)?;
                        scope.docs.extend(following);
                    }
                }
            }
            Statement::Enum => {
                if !self.definition_allowed(scope) {
                    self.misplaced(scope, line, "enum");
                }
                let entity = Entity::new("", EntityKind::Enum(EnumData { bind_c: true }));
                self.open(scope, entity, None, line, depth)?;
            }
            Statement::Binding(binding) => {
                let docs = all_docs(line);
                let (_, doc) = seal_documentation(&docs);
                let bindings = binding.into_bindings(scope.child_permission);
                if let EntityKind::DerivedType(t) = &mut self.tree[scope.id].kind {
                    t.bindings.extend(bindings.into_iter().map(|mut b| {
                        b.doc.clone_from(&doc);
                        b
                    }));
                }
            }
            Statement::Common(groups) => {
                if matches!(
                    scope.class,
                    EntityClass::SourceFile | EntityClass::DerivedType | EntityClass::Interface
                ) {
                    self.misplaced(scope, line, "`common`");
                }
                self.common(scope, line, groups);
            }
            Statement::Namelist(groups) => {
                let allowed = matches!(
                    scope.class,
                    EntityClass::Module
                        | EntityClass::Submodule
                        | EntityClass::Program
                        | EntityClass::Procedure
                );
                if allowed && !scope.in_contains {
                    self.namelist(scope, line, groups);
                } else {
                    self.misplaced(scope, line, "`namelist`");
                }
            }
            Statement::Final(names) => {
                scope.docs.extend(all_docs(line));
                if let EntityKind::DerivedType(t) = &mut self.tree[scope.id].kind {
                    t.finals.extend(names.into_iter().map(Reference::new));
                }
            }
            Statement::Declaration(declaration) => {
                if matches!(
                    scope.class,
                    EntityClass::SourceFile | EntityClass::Interface
                ) || (scope.class == EntityClass::DerivedType && scope.in_contains)
                {
                    scope.docs.extend(all_docs(line));
                    return self.unrecognized(scope, line, body).map(|()| None);
                }
                self.declare(scope, line, lead, declaration);
            }
            Statement::Use(statement) => {
                scope.docs.extend(all_docs(line));
                if let Some(uses) = self.tree[scope.id].kind.uses_mut() {
                    uses.push(statement);
                } else {
                    self.misplaced(scope, line, "`use`");
                }
            }
            Statement::Executable => {
                scope.docs.extend(all_docs(line));
                if scope.has_executable_part() {
                    let masked = mask_strings(body);
                    if let Some(calls) = self.tree[scope.id].kind.calls_mut() {
                        scan_calls(&masked, &scope.associations, calls);
                    }
                } else {
                    self.unrecognized(scope, line, body)?;
                }
            }
        }
        Ok(None)
    }

    fn definition_allowed(&self, scope: &Scope) -> bool {
        match scope.class {
            EntityClass::Module | EntityClass::Submodule => !scope.in_contains,
            EntityClass::Program | EntityClass::Procedure | EntityClass::BlockData => true,
            _ => false,
        }
    }

    fn permission_statement(&mut self, scope: &mut Scope, line: &LogicalLine, p: Permission) {
        let applied = p != Permission::Protected
            && match &mut self.tree[scope.id].kind {
                EntityKind::Module(m) => {
                    m.default_permission = p;
                    true
                }
                EntityKind::Submodule(s) => {
                    s.default_permission = p;
                    true
                }
                EntityKind::DerivedType(_) => true,
                _ => false,
            };
        if applied {
            scope.child_permission = p;
        } else {
            self.misplaced(scope, line, &format!("bare `{p}` statement"));
        }
    }

    /// Add `entity` as a child of `scope`, attach the header documentation and
    /// parse its body.
    fn open(
        &mut self,
        scope: &mut Scope,
        entity: Entity,
        permission: Option<Permission>,
        line: &LogicalLine,
        depth: usize,
    ) -> Result<()> {
        let id = self.add_child(scope, entity, permission, line);
        let following = self.descend(id, all_docs(line), depth)?;
        scope.docs.extend(following);
        Ok(())
    }

    fn add_child(
        &mut self,
        scope: &mut Scope,
        mut entity: Entity,
        permission: Option<Permission>,
        line: &LogicalLine,
    ) -> EntityId {
        entity.permission = permission.unwrap_or(scope.child_permission);
        entity.location.line_start = line.line_start;
        entity.location.line_end = line.line_end;
        let id = self.tree.add(Some(scope.id), entity);
        if permission.is_none() && scope.is_module_like() {
            scope.defaulted.push(id);
        }
        id
    }

    /// Parse the body of the freshly created container `id`.
    fn descend(&mut self, id: EntityId, docs: Vec<String>, depth: usize) -> Result<Vec<String>> {
        if depth + 1 > MAX_NESTING {
            let line = self.tree[id].location.line_start;
            return Err(self.structural(
                line,
                format!("containers nested deeper than {MAX_NESTING} levels"),
            ));
        }
        let mut child = Scope::new(id, self.tree[id].class(), docs);
        self.parse_scope(&mut child, depth + 1)
    }

    /// An `end` statement: closes `scope` unless it ends a `block` or
    /// `associate` construct.
    fn end_statement(
        &mut self,
        scope: &mut Scope,
        line: &LogicalLine,
        kind: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<Vec<String>>> {
        match kind {
            Some("block") if scope.block_level > 0 => {
                scope.docs.extend(all_docs(line));
                scope.block_level -= 1;
                return Ok(None);
            }
            Some("associate") => {
                scope.docs.extend(all_docs(line));
                scope.associations.remove_last_batch();
                return Ok(None);
            }
            _ => {}
        }
        if scope.class == EntityClass::SourceFile {
            return Err(self.structural(line.line_start, "END statement outside of any nesting"));
        }
        if let Some(name) = name {
            let expected = &self.tree[scope.id].name;
            if !same_name(name, expected) {
                let message = format!(
                    "END statement name `{name}` does not match {} `{expected}`",
                    scope.class
                );
                return Err(self.structural(line.line_start, message));
            }
        }

        scope
            .docs
            .extend(docs_where(line, |p| p != DocPlacement::Following));
        self.tree[scope.id].location.line_end = line.line_end;
        self.seal(scope);
        Ok(Some(docs_where(line, |p| p == DocPlacement::Following)))
    }

    /// Body of an unnamed or abstract interface block. Each procedure in it
    /// gets a wrapper entity in the enclosing scope.
    fn interface_block(
        &mut self,
        scope: &mut Scope,
        is_abstract: bool,
        mut block_docs: Vec<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        if depth + 1 > MAX_NESTING {
            let line = self.cursor.line_number();
            return Err(self.structural(
                line,
                format!("containers nested deeper than {MAX_NESTING} levels"),
            ));
        }
        let ctx = StatementContext {
            in_interface: true,
            ..StatementContext::default()
        };
        loop {
            let Some(line) = self.cursor.advance()? else {
                let line_number = self.cursor.line_number();
                return Err(self.structural(
                    line_number,
                    "file ended while still nested in interface block",
                ));
            };
            if line.is_doc_only() {
                block_docs.extend(all_docs(&line));
                continue;
            }
            let text = if self.settings.lower {
                line.text.trim().to_ascii_lowercase()
            } else {
                line.text.trim().to_string()
            };
            match classify(&text, &self.vars, ctx) {
                Statement::End { .. } => {
                    return Ok(all_docs(&line));
                }
                Statement::Procedure(header) => {
                    let kind = if is_abstract {
                        EntityKind::AbstractInterface
                    } else {
                        EntityKind::Interface(InterfaceData {
                            interface_kind: InterfaceKind::Explicit,
                            procedures: Vec::new(),
                        })
                    };
                    let wrapper_entity = Entity::new(header.name.clone(), kind);
                    let wrapper = self.add_child(scope, wrapper_entity, None, &line);

                    let mut wrapper_scope = Scope::new(
                        wrapper,
                        self.tree[wrapper].class(),
                        std::mem::take(&mut block_docs),
                    );
                    let procedure = procedure_entity(header);
                    let proc_id = self.add_child(&mut wrapper_scope, procedure, None, &line);
                    let following = self.descend(proc_id, all_docs(&line), depth + 1)?;
                    wrapper_scope.docs.extend(following);

                    let end_line = self.tree[proc_id].location.line_end;
                    self.tree[wrapper].location.line_end = end_line;
                    self.seal_docs(&wrapper_scope);
                    if self.tree[wrapper].doc.is_empty() && self.tree[wrapper].meta.is_empty() {
                        let (doc, meta) = {
                            let inner = &self.tree[proc_id];
                            (inner.doc.clone(), inner.meta.clone())
                        };
                        let outer = &mut self.tree[wrapper];
                        outer.doc = doc;
                        outer.meta = meta;
                    }
                }
                Statement::Use(_) | Statement::Ignored | Statement::Format => {
                    block_docs.extend(all_docs(&line));
                }
                Statement::ModuleProcedures { .. } => {
                    block_docs.extend(all_docs(&line));
                    self.diagnose(
                        DiagnosticKind::Structure,
                        line.line_start,
                        "procedure list in an interface block without a generic name",
                    );
                }
                _ => {
                    block_docs.extend(all_docs(&line));
                    if self.settings.strict {
                        return Err(Error::UnrecognizedStatement {
                            file: self.path.clone(),
                            line: line.line_start,
                            statement: text,
                        });
                    }
                    self.diagnose(
                        DiagnosticKind::UnrecognizedStatement,
                        line.line_start,
                        format!("unrecognized statement in interface block: {text}"),
                    );
                }
            }
        }
    }

    /// Create one variable per declared name.
    fn declare(
        &mut self,
        scope: &mut Scope,
        line: &LogicalLine,
        lead: usize,
        declaration: Declaration,
    ) {
        let starts: Vec<usize> = declaration.names.iter().map(|n| lead + n.offset).collect();

        let mut own_docs: Vec<Vec<String>> = vec![Vec::new(); declaration.names.len()];
        let mut preceding: Vec<String> = Vec::new();
        let mut following: Vec<String> = Vec::new();
        for doc in &line.docs {
            match doc.placement {
                DocPlacement::Inline { offset } => {
                    match starts.iter().rposition(|&start| start < offset) {
                        Some(owner) => own_docs[owner].push(doc.text.clone()),
                        None => preceding.push(doc.text.clone()),
                    }
                }
                DocPlacement::Preceding => preceding.push(doc.text.clone()),
                DocPlacement::Following => following.push(doc.text.clone()),
            }
        }
        let base = &declaration.base;
        for (declared, own) in declaration.names.iter().zip(own_docs) {
            let data = VariableData {
                vartype: base.vartype.clone(),
                kind: base.kind.clone(),
                strlen: declared.strlen.clone().or_else(|| base.strlen.clone()),
                proto: base.proto.as_deref().map(Reference::new),
                attributes: declaration.attributes.clone(),
                intent: declaration.intent.clone(),
                optional: declaration.optional,
                value: declaration.value,
                parameter: declaration.parameter,
                points: declared.points,
                initial: declared.initial.clone(),
                dimension: declared
                    .dimension
                    .clone()
                    .or_else(|| declaration.dimension.clone()),
            };
            let mut entity = Entity::new(declared.name.clone(), EntityKind::Variable(data));
            let docs: Vec<String> = preceding
                .iter()
                .cloned()
                .chain(own)
                .chain(following.iter().cloned())
                .collect();
            let (meta, doc) = seal_documentation(&docs);
            entity.meta = meta;
            entity.doc = doc;
            self.add_child(scope, entity, declaration.permission, line);
        }
    }

    fn common(&mut self, scope: &mut Scope, line: &LogicalLine, groups: Vec<NamedGroup>) {
        let (meta, doc) = seal_documentation(&all_docs(line));
        for group in groups {
            let members = group.members.into_iter().map(Reference::new);
            let existing = self
                .tree
                .find_child(scope.id, &group.name, Some(EntityClass::CommonBlock));
            if let Some(id) = existing {
                if let EntityKind::CommonBlock(c) = &mut self.tree[id].kind {
                    c.members.extend(members);
                }
                continue;
            }
            let mut entity = Entity::new(
                group.name,
                EntityKind::CommonBlock(CommonData {
                    members: members.collect(),
                }),
            );
            entity.meta = meta.clone();
            entity.doc.clone_from(&doc);
            self.add_child(scope, entity, Some(Permission::Public), line);
        }
    }

    /// A group named again later in the same unit extends the first one.
    fn namelist(&mut self, scope: &mut Scope, line: &LogicalLine, groups: Vec<NamedGroup>) {
        let (meta, doc) = seal_documentation(&all_docs(line));
        for group in groups {
            let members = group.members.into_iter().map(Reference::new);
            let existing = self
                .tree
                .find_child(scope.id, &group.name, Some(EntityClass::Namelist));
            if let Some(id) = existing {
                if let EntityKind::Namelist(n) = &mut self.tree[id].kind {
                    n.members.extend(members);
                }
                continue;
            }
            let mut entity = Entity::new(
                group.name,
                EntityKind::Namelist(NamelistData {
                    members: members.collect(),
                }),
            );
            entity.meta = meta.clone();
            entity.doc.clone_from(&doc);
            self.add_child(scope, entity, None, line);
        }
    }

    fn seal_docs(&mut self, scope: &Scope) {
        let (meta, doc) = seal_documentation(&scope.docs);
        let entity = &mut self.tree[scope.id];
        entity.meta = meta;
        entity.doc = doc;
    }

    /// Finish a container at its `end` statement.
    fn seal(&mut self, scope: &Scope) {
        self.seal_docs(scope);

        let default = match &self.tree[scope.id].kind {
            EntityKind::Module(m) => Some(m.default_permission),
            EntityKind::Submodule(s) => Some(s.default_permission),
            _ => None,
        };
        if let Some(default) = default {
            for &child in &scope.defaulted {
                self.tree[child].permission = default;
            }
        }

        if scope.class == EntityClass::Procedure {
            self.match_arguments(scope);
        }
        let leftover = self.apply_attributes(scope);
        if scope.class == EntityClass::Enum {
            self.number_enumerators(scope);
        }
        if scope.class == EntityClass::Module {
            self.public_names(scope, &leftover);
        } else {
            for entry in leftover {
                debug!(
                    scope = self.tree[scope.id].name.as_str(), name = entry.name.as_str();
                    "`{}` applied to undeclared name", entry.attribute
                );
            }
        }
    }

    /// Link arguments and the function result to their declarations,
    /// creating implicitly typed variables where none exist.
    fn match_arguments(&mut self, scope: &Scope) {
        let Some(data) = self.tree[scope.id].as_procedure() else {
            return;
        };
        let arg_names = data.arg_names.clone();
        let is_function = data.proc_kind == ProcedureKind::Function;
        let result_name = data.result_name.clone();
        let prefix_type = data.prefix_type.clone();
        let proc_name = self.tree[scope.id].name.clone();
        let line = self.tree[scope.id].location;

        let mut args = Vec::new();
        for name in arg_names.iter().filter(|n| n.as_str() != "*") {
            let declared = self
                .tree
                .find_child(scope.id, name, Some(EntityClass::Variable))
                .or_else(|| {
                    self.tree
                        .find_child(scope.id, name, Some(EntityClass::Interface))
                        .and_then(|iface| self.tree[iface].children.first().copied())
                });
            let id = declared.unwrap_or_else(|| {
                let data = VariableData {
                    vartype: implicit_type(name).to_string(),
                    ..VariableData::default()
                };
                self.implicit_child(scope.id, name, data, line)
            });
            args.push(id);
        }

        let mut return_variable = None;
        if is_function {
            let name = result_name.unwrap_or(proc_name);
            let declared = self
                .tree
                .find_child(scope.id, &name, Some(EntityClass::Variable));
            return_variable = Some(declared.unwrap_or_else(|| {
                let parsed = prefix_type
                    .as_deref()
                    .and_then(|t| parse_type(t, &self.vars));
                let data = match parsed {
                    Some(t) => VariableData {
                        vartype: t.vartype,
                        kind: t.kind,
                        strlen: t.strlen,
                        proto: t.proto.map(Reference::new),
                        ..VariableData::default()
                    },
                    None => VariableData {
                        vartype: implicit_type(&name).to_string(),
                        ..VariableData::default()
                    },
                };
                self.implicit_child(scope.id, &name, data, line)
            }));
        }

        if let EntityKind::Procedure(p) = &mut self.tree[scope.id].kind {
            p.args = args;
            p.return_variable = return_variable;
        }
    }

    fn implicit_child(
        &mut self,
        parent: EntityId,
        name: &str,
        data: VariableData,
        location: Location,
    ) -> EntityId {
        let mut entity = Entity::new(name, EntityKind::Variable(data));
        entity.location = location;
        self.tree.add(Some(parent), entity)
    }

    /// Apply recorded attribute statements to the children they name. Returns
    /// the entries that named nothing in this scope.
    fn apply_attributes(&mut self, scope: &Scope) -> Vec<AttributeEntry> {
        let mut leftover = Vec::new();
        for entry in &scope.attributes {
            let target = self.tree[scope.id]
                .children
                .iter()
                .copied()
                .find(|&c| same_name(&self.tree[c].name, &entry.name));
            let Some(target) = target else {
                leftover.push(entry.clone());
                continue;
            };
            let key = entry.attribute.to_ascii_lowercase();
            let entity = &mut self.tree[target];
            if let Ok(permission) = key.parse::<Permission>() {
                entity.permission = permission;
                continue;
            }
            match &mut entity.kind {
                EntityKind::Variable(v) => {
                    if let Some(intent) = key
                        .strip_prefix("intent(")
                        .and_then(|s| s.strip_suffix(')'))
                    {
                        v.intent = Some(intent.to_string());
                    } else {
                        match key.as_str() {
                            "optional" => v.optional = true,
                            "value" => v.value = true,
                            "parameter" => {
                                v.parameter = true;
                                if let Some(value) = scope.params.get(&entry.name) {
                                    v.initial = Some(value.clone());
                                }
                            }
                            "dimension" => {}
                            _ => v.attributes.push(entry.attribute.clone()),
                        }
                        if entry.dimension.is_some() {
                            v.dimension.clone_from(&entry.dimension);
                        }
                    }
                }
                EntityKind::Procedure(p) => {
                    if key.starts_with("bind(") {
                        let inner = &entry.attribute["bind(".len()..entry.attribute.len() - 1];
                        p.bind = Some(inner.to_string());
                    } else {
                        p.attributes.push(entry.attribute.clone());
                    }
                }
                EntityKind::DerivedType(t) => t.attributes.push(entry.attribute.clone()),
                _ => leftover.push(entry.clone()),
            }
        }
        leftover
    }

    fn number_enumerators(&mut self, scope: &Scope) {
        let mut previous: i64 = -1;
        for child in self.tree[scope.id].children.clone() {
            let line = self.tree[child].location.line_start;
            let name = self.tree[child].name.clone();
            let EntityKind::Variable(v) = &mut self.tree[child].kind else {
                continue;
            };
            let Some(initial) = v.initial.clone() else {
                previous += 1;
                v.initial = Some(previous.to_string());
                continue;
            };
            let value = KIND_SUFFIX_RE
                .captures(&initial)
                .map_or(initial.as_str(), |c| c.name("initial").map_or("", |m| m.as_str()))
                .trim()
                .to_string();
            match value.parse::<i64>() {
                Ok(n) => previous = n,
                Err(_) => {
                    let message =
                        format!("non-integer value `{initial}` assigned to enumerator `{name}`");
                    self.diagnostics.push(
                        Diagnostic::warning(DiagnosticKind::Structure, message)
                            .at(&self.path, line)
                            .with_severity(Severity::Error),
                    );
                    previous += 1;
                }
            }
        }
    }

    /// Lower-cased names a module exports.
    fn public_names(&mut self, scope: &Scope, leftover: &[AttributeEntry]) {
        let mut names: Vec<String> = Vec::new();
        let mut push = |name: String| {
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        };
        for &child in &self.tree[scope.id].children {
            let entity = &self.tree[child];
            if entity.permission == Permission::Private {
                continue;
            }
            if entity.class() == EntityClass::Enum {
                for &enumerator in &entity.children {
                    push(squeeze(&self.tree[enumerator].name).to_ascii_lowercase());
                }
            }
            push(squeeze(&entity.name).to_ascii_lowercase());
        }
        for entry in leftover {
            match entry.attribute.to_ascii_lowercase().as_str() {
                "public" | "protected" => push(entry.name.clone()),
                other => debug!(
                    module = self.tree[scope.id].name.as_str(), name = entry.name.as_str();
                    "`{other}` applied to undeclared name"
                ),
            }
        }
        if let EntityKind::Module(m) = &mut self.tree[scope.id].kind {
            m.public_names = names;
        }
    }
}

fn procedure_entity(header: ProcedureHeader) -> Entity {
    let mut data = ProcedureData::new(header.proc_kind);
    data.attributes = header.attributes;
    data.prefix_type = header.prefix_type;
    data.arg_names = header.arguments;
    data.result_name = header.result_name;
    data.bind = header.bind;
    Entity::new(header.name, EntityKind::Procedure(data))
}

fn type_entity(header: TypeHeader) -> Entity {
    Entity::new(
        header.name,
        EntityKind::DerivedType(TypeData {
            extends: header.extends.map(Reference::new),
            attributes: header.attributes,
            parameters: header.parameters,
            sequence: false,
            bindings: Vec::new(),
            finals: Vec::new(),
            constructor: None,
        }),
    )
}

/// Remember an attribute statement until the scope is sealed.
fn record_attribute(scope: &mut Scope, attribute: &str, names: &str) {
    let attribute = squeeze(attribute);
    if attribute.eq_ignore_ascii_case("parameter") {
        let inner = names
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .unwrap_or(names);
        for item in split_list(inner) {
            if let Some((name, value)) = item.split_once('=') {
                let name = name.trim().to_ascii_lowercase();
                scope.params.insert(name.clone(), value.trim().to_string());
                scope.attributes.push(AttributeEntry {
                    name,
                    attribute: attribute.clone(),
                    dimension: None,
                });
            }
        }
        return;
    }
    for item in split_list(names) {
        if item.starts_with('/') {
            continue;
        }
        let split = item
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(item.len());
        let word = item[..split].to_ascii_lowercase();
        if word.is_empty() {
            continue;
        }
        let (name, dimension) = if word == "operator" || word == "assignment" {
            (squeeze(&item).to_ascii_lowercase(), None)
        } else {
            let rest = item[split..].trim();
            (word, rest.starts_with('(').then(|| rest.to_string()))
        };
        scope.attributes.push(AttributeEntry {
            name,
            attribute: attribute.clone(),
            dimension,
        });
    }
}
