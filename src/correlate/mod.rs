//! Cross-file name resolution.
//!
//! Parsing leaves every cross-reference as a name. Once all files share one
//! arena the [`Correlator`] turns those names into [`Link`]s, in phases:
//!
//! 0. display sets inherited down the tree
//! 1. `use` statements and submodule ancestry
//! 2. type extension, constructors and declared prototypes
//! 3. type-bound procedures, finalizers, generic interfaces, common block and
//!    namelist members, separate module procedures
//! 4. call chains
//!
//! Each phase overwrites the links it owns, so running the correlator again
//! over the same arena yields the same graph.

pub mod namespace;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use log::{debug, info};

use self::namespace::{Candidate, Layer};
use crate::entity::{
    Binding, CommonData, EntityClass, EntityId, EntityKind, EntityTree, Link, NamelistData,
    Permission, ProcedureKind, Reference, UseStatement,
};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::external::ExternalIndex;
use crate::intrinsics::intrinsic_module_url;
use crate::project::Registry;

/// Longest `extends` chain or host chain followed before giving up.
pub const MAX_CHAIN_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelateOptions {
    /// Permissions shown for members of top-level units
    pub display: Vec<Permission>,
    /// Modules documented elsewhere: lower-case name to URL
    pub extra_mods: BTreeMap<String, String>,
    /// Report names that stay unresolved
    pub warn: bool,
}

impl Default for CorrelateOptions {
    fn default() -> Self {
        Self {
            display: vec![Permission::Public, Permission::Protected],
            extra_mods: BTreeMap::new(),
            warn: false,
        }
    }
}

/// Resolve every name in `tree` against the project.
pub fn correlate(
    tree: &mut EntityTree,
    registry: &Registry,
    external: &ExternalIndex,
    options: &CorrelateOptions,
) -> Vec<Diagnostic> {
    Correlator::new(tree, registry, external, options).run()
}

pub struct Correlator<'p> {
    tree: &'p mut EntityTree,
    registry: &'p Registry,
    external: &'p ExternalIndex,
    options: &'p CorrelateOptions,
    layers: HashMap<EntityId, Layer>,
    exports: HashMap<EntityId, Vec<(String, Candidate)>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'p> Correlator<'p> {
    pub fn new(
        tree: &'p mut EntityTree,
        registry: &'p Registry,
        external: &'p ExternalIndex,
        options: &'p CorrelateOptions,
    ) -> Self {
        Self {
            tree,
            registry,
            external,
            options,
            layers: HashMap::new(),
            exports: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(mut self) -> Vec<Diagnostic> {
        self.resolve_display();
        self.resolve_uses();
        self.resolve_ancestry();
        self.resolve_types();
        self.resolve_specific_bindings();
        self.resolve_generic_bindings();
        self.resolve_interfaces();
        self.resolve_calls();
        info!(
            entities = self.tree.len(), diagnostics = self.diagnostics.len();
            "correlation finished"
        );
        self.diagnostics
    }

    // Phase 0

    fn resolve_display(&mut self) {
        let registry = self.registry;
        for &file in &registry.files {
            for id in self.tree.descendants(file) {
                let inherited = match self.tree[id].parent {
                    Some(parent) => self.tree[parent].display.clone(),
                    None => self.options.display.clone(),
                };
                let display = self.tree[id]
                    .meta
                    .display
                    .as_ref()
                    .map_or(inherited, |values| {
                        values.iter().filter_map(|v| v.parse().ok()).collect()
                    });
                self.tree[id].display = display;
            }
        }
    }

    // Phase 1

    fn resolve_uses(&mut self) {
        let ids: Vec<EntityId> = self.tree.ids().collect();
        for id in ids {
            let modules: Vec<String> = self.tree[id]
                .kind
                .uses()
                .iter()
                .map(|u| u.module.name.clone())
                .collect();
            if modules.is_empty() {
                continue;
            }
            let links: Vec<Link> = modules.iter().map(|m| self.module_link(m)).collect();
            for (module, link) in modules.iter().zip(&links) {
                if !link.is_resolved() {
                    self.unresolved(id, "module", module);
                }
            }
            if let Some(uses) = self.tree[id].kind.uses_mut() {
                for (statement, link) in uses.iter_mut().zip(links) {
                    statement.module.link = link;
                }
            }
        }
    }

    fn module_link(&self, name: &str) -> Link {
        let local = self
            .registry
            .modules
            .iter()
            .copied()
            .find(|&m| self.tree[m].is_named(name));
        if let Some(module) = local {
            return Link::Entity(module);
        }
        if let Some(url) = intrinsic_module_url(name) {
            return Link::Intrinsic {
                url: url.to_string(),
            };
        }
        let extra = self
            .options
            .extra_mods
            .iter()
            .find(|(module, _)| module.eq_ignore_ascii_case(name));
        if let Some((_, url)) = extra {
            return Link::External { url: url.clone() };
        }
        match self.external.module(name) {
            Some(module) => Link::External {
                url: module.url.clone(),
            },
            None => Link::Unresolved,
        }
    }

    fn resolve_ancestry(&mut self) {
        let registry = self.registry;
        for &sub in &registry.submodules {
            let EntityKind::Submodule(data) = &self.tree[sub].kind else {
                continue;
            };
            let ancestor = data.ancestor.name.clone();
            let parent = data.parent_submodule.as_ref().map(|p| p.name.clone());

            let ancestor_link = self
                .registry
                .modules
                .iter()
                .copied()
                .find(|&m| self.tree[m].is_named(&ancestor))
                .map_or(Link::Unresolved, Link::Entity);
            let parent_link = parent.as_deref().map(|name| {
                self.registry
                    .submodules
                    .iter()
                    .copied()
                    .find(|&s| s != sub && self.tree[s].is_named(name))
                    .map_or(Link::Unresolved, Link::Entity)
            });

            if !ancestor_link.is_resolved() {
                let message = format!(
                    "submodule `{}` extends module `{ancestor}`, which is not part of the project",
                    self.tree[sub].name
                );
                self.report(DiagnosticKind::Structure, sub, message);
            }
            if let (Some(name), Some(Link::Unresolved)) = (&parent, &parent_link) {
                let message = format!(
                    "submodule `{}` extends submodule `{name}`, which is not part of the project",
                    self.tree[sub].name
                );
                self.report(DiagnosticKind::Structure, sub, message);
            }

            if let EntityKind::Submodule(data) = &mut self.tree[sub].kind {
                data.ancestor.link = ancestor_link;
                if let (Some(reference), Some(link)) = (&mut data.parent_submodule, parent_link) {
                    reference.link = link;
                }
            }
        }
    }

    // Phase 2

    fn resolve_types(&mut self) {
        let ids: Vec<EntityId> = self.tree.ids().collect();
        for id in ids {
            let Some(scope) = self.tree[id].parent else {
                continue;
            };
            match &self.tree[id].kind {
                EntityKind::DerivedType(data) => {
                    let extends = data.extends.as_ref().map(|r| r.name.clone());
                    let name = self.tree[id].name.clone();
                    let extends_link = extends.as_deref().map(|parent| {
                        self.find(scope, parent, |c| c.is(EntityClass::DerivedType))
                            .map_or(Link::Unresolved, |c| c.link)
                    });
                    let constructor = self
                        .find(scope, &name, |c| {
                            c.is(EntityClass::Procedure) || c.is(EntityClass::Interface)
                        })
                        .map(|c| Reference {
                            name: name.clone(),
                            link: c.link,
                        });
                    if let (Some(parent), Some(Link::Unresolved)) = (&extends, &extends_link) {
                        self.unresolved(id, "parent type", parent);
                    }
                    if let EntityKind::DerivedType(data) = &mut self.tree[id].kind {
                        if let (Some(reference), Some(link)) = (&mut data.extends, extends_link) {
                            reference.link = link;
                        }
                        data.constructor = constructor;
                    }
                }
                EntityKind::Variable(data) => {
                    let Some(proto) = data.proto.as_ref().map(|p| p.name.clone()) else {
                        continue;
                    };
                    let vartype = data.vartype.clone();
                    if proto == "*" {
                        continue;
                    }
                    let link = match vartype.as_str() {
                        "type" | "class" => {
                            self.find(scope, &proto, |c| c.is(EntityClass::DerivedType))
                        }
                        "procedure" => self.find(scope, &proto, Candidate::is_callable),
                        _ => continue,
                    }
                    .map_or(Link::Unresolved, |c| c.link);
                    if !link.is_resolved() {
                        self.unresolved(id, "type", &proto);
                    }
                    if let EntityKind::Variable(data) = &mut self.tree[id].kind {
                        if let Some(reference) = &mut data.proto {
                            reference.link = link;
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // Phase 3

    fn resolve_specific_bindings(&mut self) {
        for ty in self.registered_types() {
            let Some(scope) = self.tree[ty].parent else {
                continue;
            };
            let Some(data) = self.tree[ty].as_type() else {
                continue;
            };
            let mut bindings = data.bindings.clone();
            let mut finals = data.finals.clone();

            for binding in bindings.iter_mut().filter(|b| !b.generic) {
                if let Some(proto) = &mut binding.proto {
                    proto.link = self.callable_link(scope, &proto.name);
                }
                for target in &mut binding.targets {
                    target.link = self.callable_link(scope, &target.name);
                }
            }
            for finalizer in &mut finals {
                finalizer.link = self
                    .find(scope, &finalizer.name, |c| c.is(EntityClass::Procedure))
                    .map_or(Link::Unresolved, |c| c.link);
            }

            let missing: Vec<String> = bindings
                .iter()
                .filter(|b| !b.generic)
                .flat_map(|b| b.proto.iter().chain(&b.targets))
                .chain(&finals)
                .filter(|r| !r.link.is_resolved())
                .map(|r| r.name.clone())
                .collect();
            for name in missing {
                self.unresolved(ty, "procedure", &name);
            }

            if let EntityKind::DerivedType(data) = &mut self.tree[ty].kind {
                data.bindings = bindings;
                data.finals = finals;
            }
        }
    }

    /// Generic bindings name specific bindings, own or inherited; they run
    /// after every specific binding is resolved so the result does not depend
    /// on type order.
    fn resolve_generic_bindings(&mut self) {
        for ty in self.registered_types() {
            let Some(scope) = self.tree[ty].parent else {
                continue;
            };
            let Some(data) = self.tree[ty].as_type() else {
                continue;
            };
            let mut bindings = data.bindings.clone();
            for i in 0..bindings.len() {
                if !bindings[i].generic {
                    continue;
                }
                let names: Vec<String> =
                    bindings[i].targets.iter().map(|t| t.name.clone()).collect();
                for (j, name) in names.iter().enumerate() {
                    let link = self
                        .binding_link(ty, name)
                        .filter(Link::is_resolved)
                        .unwrap_or_else(|| self.callable_link(scope, name));
                    if !link.is_resolved() {
                        self.unresolved(ty, "binding", name);
                    }
                    bindings[i].targets[j].link = link;
                }
            }
            if let EntityKind::DerivedType(data) = &mut self.tree[ty].kind {
                data.bindings = bindings;
            }
        }
    }

    fn resolve_interfaces(&mut self) {
        let ids: Vec<EntityId> = self.tree.ids().collect();
        for id in ids {
            let Some(scope) = self.tree[id].parent else {
                continue;
            };
            match &self.tree[id].kind {
                EntityKind::Interface(data) => {
                    let mut procedures = data.procedures.clone();
                    for procedure in &mut procedures {
                        let itself = Link::Entity(id);
                        procedure.link = self
                            .find(scope, &procedure.name, |c| c.is(EntityClass::Procedure))
                            .or_else(|| {
                                self.find(scope, &procedure.name, |c| {
                                    c.is_callable() && c.link != itself
                                })
                            })
                            .map_or(Link::Unresolved, |c| c.link);
                        if !procedure.link.is_resolved() {
                            self.unresolved(id, "procedure", &procedure.name);
                        }
                    }
                    if let EntityKind::Interface(data) = &mut self.tree[id].kind {
                        data.procedures = procedures;
                    }
                }
                EntityKind::CommonBlock(CommonData { members })
                | EntityKind::Namelist(NamelistData { members }) => {
                    let mut members = members.clone();
                    for member in &mut members {
                        member.link = self
                            .find(scope, &member.name, |c| c.is(EntityClass::Variable))
                            .map_or(Link::Unresolved, |c| c.link);
                    }
                    if let EntityKind::CommonBlock(CommonData { members: resolved })
                    | EntityKind::Namelist(NamelistData { members: resolved }) =
                        &mut self.tree[id].kind
                    {
                        *resolved = members;
                    }
                }
                EntityKind::Procedure(data) => {
                    let separate = data.proc_kind == ProcedureKind::ModuleProcedure
                        || data.attributes.iter().any(|a| a.eq_ignore_ascii_case("module"));
                    if !separate || self.tree[scope].class() != EntityClass::Submodule {
                        continue;
                    }
                    let name = self.tree[id].name.clone();
                    let link = self
                        .find(scope, &name, |c| c.is(EntityClass::Interface))
                        .map_or(Link::Unresolved, |c| c.link);
                    if !link.is_resolved() {
                        self.unresolved(id, "interface", &name);
                    }
                    if let EntityKind::Procedure(data) = &mut self.tree[id].kind {
                        data.module_interface = Some(Reference { name, link });
                    }
                }
                _ => {}
            }
        }
    }

    // Phase 4

    fn resolve_calls(&mut self) {
        let ids: Vec<EntityId> = self.tree.ids().collect();
        for id in ids {
            let chains: Vec<Vec<String>> = self.tree[id]
                .kind
                .calls()
                .iter()
                .map(|c| c.chain.clone())
                .collect();
            if chains.is_empty() {
                continue;
            }
            let links: Vec<Link> = chains.iter().map(|chain| self.call_link(id, chain)).collect();
            for (chain, link) in chains.iter().zip(&links) {
                if !link.is_resolved() {
                    self.unresolved(id, "call", &chain.join("%"));
                }
            }
            if let Some(calls) = self.tree[id].kind.calls_mut() {
                for (call, link) in calls.iter_mut().zip(links) {
                    call.link = link;
                }
            }
        }
    }

    fn call_link(&mut self, scope: EntityId, chain: &[String]) -> Link {
        let Some((head, rest)) = chain.split_first() else {
            return Link::Unresolved;
        };
        let candidates = self.visible(scope, head);
        if rest.is_empty() {
            return candidates
                .iter()
                .find(|c| c.is_callable())
                .or_else(|| candidates.first())
                .map_or(Link::Unresolved, |c| c.link.clone());
        }

        let Some(mut current) = candidates.iter().find_map(|c| {
            c.link
                .entity()
                .filter(|&e| self.tree[e].class() == EntityClass::Variable)
        }) else {
            return Link::Unresolved;
        };
        for (i, part) in rest.iter().enumerate() {
            let Some(ty) = self.variable_type(current) else {
                return Link::Unresolved;
            };
            if i + 1 < rest.len() {
                match self.component(ty, part) {
                    Some(component) => current = component,
                    None => return Link::Unresolved,
                }
                continue;
            }
            if let Some(link) = self.binding_link(ty, part) {
                return link;
            }
            return match self.component(ty, part) {
                Some(component) => {
                    let pointer = self.tree[component]
                        .as_variable()
                        .filter(|v| v.vartype == "procedure")
                        .and_then(|v| v.proto.as_ref())
                        .map(|p| p.link.clone())
                        .filter(Link::is_resolved);
                    pointer.unwrap_or(Link::Entity(component))
                }
                None => Link::Unresolved,
            };
        }
        Link::Unresolved
    }

    // Type helpers

    fn registered_types(&self) -> Vec<EntityId> {
        self.tree
            .iter()
            .filter(|(_, e)| e.class() == EntityClass::DerivedType)
            .map(|(id, _)| id)
            .collect()
    }

    fn variable_type(&self, variable: EntityId) -> Option<EntityId> {
        let data = self.tree[variable].as_variable()?;
        if !matches!(data.vartype.as_str(), "type" | "class") {
            return None;
        }
        data.proto
            .as_ref()?
            .link
            .entity()
            .filter(|&t| self.tree[t].class() == EntityClass::DerivedType)
    }

    /// `ty` followed by its ancestors through `extends`.
    fn type_chain(&self, ty: EntityId) -> Vec<EntityId> {
        let mut chain = vec![ty];
        let mut current = ty;
        while chain.len() < MAX_CHAIN_DEPTH {
            let parent = self.tree[current]
                .as_type()
                .and_then(|t| t.extends.as_ref())
                .and_then(|r| r.link.entity());
            match parent {
                Some(parent) if !chain.contains(&parent) => {
                    chain.push(parent);
                    current = parent;
                }
                _ => break,
            }
        }
        chain
    }

    fn component(&self, ty: EntityId, name: &str) -> Option<EntityId> {
        self.type_chain(ty)
            .into_iter()
            .find_map(|t| self.tree.find_child(t, name, Some(EntityClass::Variable)))
    }

    /// Link of the binding called `name` on `ty` or an ancestor type.
    fn binding_link(&self, ty: EntityId, name: &str) -> Option<Link> {
        self.type_chain(ty).into_iter().find_map(|t| {
            self.tree[t]
                .as_type()?
                .bindings
                .iter()
                .find(|b| b.name.eq_ignore_ascii_case(name))
                .map(binding_target)
        })
    }

    // Name lookup

    /// Scopes searched from `scope` outwards.
    fn scopes(&self, scope: EntityId) -> Vec<EntityId> {
        let mut chain = vec![scope];
        let mut current = scope;
        while let Some(host) = self.host(current) {
            if chain.contains(&host) || chain.len() >= MAX_CHAIN_DEPTH {
                break;
            }
            chain.push(host);
            current = host;
        }
        chain
    }

    fn host(&self, scope: EntityId) -> Option<EntityId> {
        match &self.tree[scope].kind {
            EntityKind::Submodule(data) => data
                .parent_submodule
                .as_ref()
                .and_then(|p| p.link.entity())
                .or_else(|| data.ancestor.link.entity()),
            EntityKind::SourceFile(_) => None,
            _ => self.tree[scope].parent,
        }
    }

    /// Candidates of the innermost scope that knows `name`.
    fn visible(&mut self, scope: EntityId, name: &str) -> Vec<Candidate> {
        for s in self.scopes(scope) {
            if let Some(found) = self.layer(s).get(name) {
                return found.to_vec();
            }
        }
        self.global(name)
    }

    /// First candidate accepted by `accept`, innermost scope first.
    fn find(
        &mut self,
        scope: EntityId,
        name: &str,
        accept: impl Fn(&Candidate) -> bool,
    ) -> Option<Candidate> {
        for s in self.scopes(scope) {
            let found = self
                .layer(s)
                .get(name)
                .and_then(|candidates| candidates.iter().find(|c| accept(c)));
            if let Some(candidate) = found {
                return Some(candidate.clone());
            }
        }
        self.global(name).into_iter().find(|c| accept(c))
    }

    fn callable_link(&mut self, scope: EntityId, name: &str) -> Link {
        self.find(scope, name, Candidate::is_callable)
            .map_or(Link::Unresolved, |c| c.link)
    }

    /// External procedures declared at file level anywhere in the project.
    fn global(&self, name: &str) -> Vec<Candidate> {
        self.registry
            .procedures
            .iter()
            .copied()
            .filter(|&p| {
                let entity = &self.tree[p];
                entity.is_named(name)
                    && entity
                        .parent
                        .is_some_and(|f| self.tree[f].class() == EntityClass::SourceFile)
            })
            .map(|p| Candidate::entity(p, EntityClass::Procedure))
            .collect()
    }

    fn layer(&mut self, scope: EntityId) -> &Layer {
        if !self.layers.contains_key(&scope) {
            let layer = self.build_layer(scope);
            self.layers.insert(scope, layer);
        }
        &self.layers[&scope]
    }

    /// Local declarations first, then names imported by `use`. A local name
    /// hides an imported one.
    fn build_layer(&mut self, scope: EntityId) -> Layer {
        let mut layer = Layer::default();
        for &child in &self.tree[scope].children {
            let entity = &self.tree[child];
            if entity.class() == EntityClass::Enum {
                for &enumerator in &entity.children {
                    layer.insert(
                        &self.tree[enumerator].name,
                        Candidate::entity(enumerator, EntityClass::Variable),
                    );
                }
            }
            layer.insert(&entity.name, Candidate::entity(child, entity.class()));
        }

        let uses = self.tree[scope].kind.uses().to_vec();
        let mut visiting = HashSet::new();
        let mut imported = Vec::new();
        for statement in &uses {
            imported.extend(self.imports(statement, &mut visiting));
        }
        let local = layer.clone();
        for (name, candidate) in imported {
            if !local.contains(&name) {
                layer.insert(&name, candidate);
            }
        }
        layer
    }

    /// Names a `use` statement brings into scope, under their local names.
    fn imports(
        &mut self,
        statement: &UseStatement,
        visiting: &mut HashSet<EntityId>,
    ) -> Vec<(String, Candidate)> {
        let exported = match &statement.module.link {
            Link::Entity(module) => self.exports(*module, visiting),
            Link::External { .. } => self
                .external
                .module(&statement.module.name)
                .map(|module| {
                    module
                        .members
                        .iter()
                        .map(|m| (m.name.clone(), Candidate::external(m.url.clone(), m.class)))
                        .collect()
                })
                .unwrap_or_default(),
            Link::Intrinsic { .. } | Link::Unresolved => return Vec::new(),
        };
        exported
            .into_iter()
            .filter_map(|(name, candidate)| {
                statement
                    .local_name_for(&name)
                    .map(|local| (namespace::key(&local), candidate))
            })
            .collect()
    }

    /// Public names of `module`, including names it re-exports from modules
    /// it uses.
    fn exports(
        &mut self,
        module: EntityId,
        visiting: &mut HashSet<EntityId>,
    ) -> Vec<(String, Candidate)> {
        if let Some(cached) = self.exports.get(&module) {
            return cached.clone();
        }
        let EntityKind::Module(data) = &self.tree[module].kind else {
            return Vec::new();
        };
        if visiting.contains(&module) {
            debug!(module = self.tree[module].name.as_str(); "use cycle");
            return Vec::new();
        }
        let public = data.public_names.clone();
        let reexport_all = data.default_permission != Permission::Private;
        let uses = data.uses.clone();
        visiting.insert(module);

        let mut out = Vec::new();
        let mut local = HashSet::new();
        for &child in &self.tree[module].children {
            let entity = &self.tree[child];
            if entity.class() == EntityClass::Enum {
                for &enumerator in &entity.children {
                    let key = namespace::key(&self.tree[enumerator].name);
                    if public.contains(&key) {
                        local.insert(key.clone());
                        out.push((key, Candidate::entity(enumerator, EntityClass::Variable)));
                    }
                }
                continue;
            }
            let key = namespace::key(&entity.name);
            if entity.permission != Permission::Private && public.contains(&key) {
                local.insert(key.clone());
                out.push((key, Candidate::entity(child, entity.class())));
            }
        }
        for statement in &uses {
            for (name, candidate) in self.imports(statement, visiting) {
                if !local.contains(&name) && (reexport_all || public.contains(&name)) {
                    out.push((name, candidate));
                }
            }
        }

        visiting.remove(&module);
        self.exports.insert(module, out.clone());
        out
    }

    // Diagnostics

    fn file_of(&self, id: EntityId) -> Option<PathBuf> {
        std::iter::once(id)
            .chain(self.tree.ancestors(id))
            .find_map(|a| match &self.tree[a].kind {
                EntityKind::SourceFile(file) => Some(file.path.clone()),
                _ => None,
            })
    }

    fn report(&mut self, kind: DiagnosticKind, at: EntityId, message: String) {
        let mut diagnostic = Diagnostic::warning(kind, message);
        if let Some(file) = self.file_of(at) {
            diagnostic = diagnostic.at(file, self.tree[at].location.line_start);
        }
        debug!(diagnostic:% = diagnostic; "correlation");
        self.diagnostics.push(diagnostic);
    }

    fn unresolved(&mut self, at: EntityId, what: &str, name: &str) {
        if !self.options.warn {
            return;
        }
        let entity = &self.tree[at];
        let message = format!(
            "{what} `{name}` referenced in {} `{}` could not be resolved",
            entity.class(),
            entity.name
        );
        self.report(DiagnosticKind::UnresolvedReference, at, message);
    }
}

/// Where calling a binding ends up.
fn binding_target(binding: &Binding) -> Link {
    if binding.deferred {
        if let Some(proto) = &binding.proto {
            return proto.link.clone();
        }
    }
    binding
        .targets
        .first()
        .map_or(Link::Unresolved, |t| t.link.clone())
}
