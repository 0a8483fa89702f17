//! Variant-specific data carried by each kind of entity.

use std::path::PathBuf;

use super::{EntityId, Permission};

/// Where a name points once correlation has run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Link {
    #[default]
    Unresolved,
    /// An entity of this project
    Entity(EntityId),
    /// A compiler-provided module or procedure, with its reference page
    Intrinsic { url: String },
    /// An entity documented by another project
    External { url: String },
}

impl Link {
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// A name as written in the source together with what it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub name: String,
    pub link: Link,
}

impl Reference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: Link::Unresolved,
        }
    }
}

/// One `local => original` pair from a `use` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseName {
    pub local: String,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseStatement {
    pub module: Reference,
    /// An `only:` list restricts the import to `names`
    pub only: bool,
    pub names: Vec<UseName>,
}

impl UseStatement {
    /// The local name under which `original` is visible, if it is imported at all.
    #[must_use]
    pub fn local_name_for(&self, original: &str) -> Option<String> {
        let renamed = self
            .names
            .iter()
            .find(|n| n.original.eq_ignore_ascii_case(original));
        match (renamed, self.only) {
            (Some(n), _) => Some(n.local.clone()),
            (None, true) => None,
            (None, false) => Some(original.to_string()),
        }
    }
}

/// A procedure reference found in executable code: `foo` or `obj%comp%method`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRef {
    pub chain: Vec<String>,
    pub link: Link,
}

impl CallRef {
    #[must_use]
    pub fn name(&self) -> &str {
        self.chain.last().map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileData {
    pub path: PathBuf,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleData {
    pub uses: Vec<UseStatement>,
    pub default_permission: Permission,
    /// Lower-cased names this module makes public, including re-exports
    pub public_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmoduleData {
    pub uses: Vec<UseStatement>,
    pub ancestor: Reference,
    pub parent_submodule: Option<Reference>,
    pub default_permission: Permission,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramData {
    pub uses: Vec<UseStatement>,
    pub calls: Vec<CallRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitData {
    pub uses: Vec<UseStatement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureKind {
    Subroutine,
    Function,
    /// `module procedure name` implementing a separate module procedure interface
    ModuleProcedure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureData {
    pub proc_kind: ProcedureKind,
    /// Prefix attributes such as `pure`, `elemental`, `recursive`, `module`
    pub attributes: Vec<String>,
    /// Return type written in a function header (`integer function f()`)
    pub prefix_type: Option<String>,
    pub arg_names: Vec<String>,
    /// Argument entities, in argument order, once matched at the `end` statement
    pub args: Vec<EntityId>,
    pub return_variable: Option<EntityId>,
    pub result_name: Option<String>,
    pub bind: Option<String>,
    pub uses: Vec<UseStatement>,
    pub calls: Vec<CallRef>,
    /// For separate module procedures: the interface they implement
    pub module_interface: Option<Reference>,
}

impl ProcedureData {
    #[must_use]
    pub fn new(proc_kind: ProcedureKind) -> Self {
        Self {
            proc_kind,
            attributes: Vec::new(),
            prefix_type: None,
            arg_names: Vec::new(),
            args: Vec::new(),
            return_variable: None,
            result_name: None,
            bind: None,
            uses: Vec::new(),
            calls: Vec::new(),
            module_interface: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// Named interface grouping specific procedures under one generic name
    Generic,
    /// Unnamed interface block describing a single external procedure
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceData {
    pub interface_kind: InterfaceKind,
    /// `module procedure` names listed in a generic interface
    pub procedures: Vec<Reference>,
}

/// A type-bound procedure binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub generic: bool,
    pub deferred: bool,
    pub permission: Permission,
    pub attributes: Vec<String>,
    /// `procedure(iface)` prototype of a deferred binding
    pub proto: Option<Reference>,
    /// Implementing procedures; for generic bindings the specific binding names
    pub targets: Vec<Reference>,
    pub doc: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeData {
    pub extends: Option<Reference>,
    pub attributes: Vec<String>,
    /// Kind and length parameter names
    pub parameters: Vec<String>,
    pub sequence: bool,
    pub bindings: Vec<Binding>,
    pub finals: Vec<Reference>,
    /// Procedure or generic interface sharing the type's name
    pub constructor: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableData {
    /// Lower-cased base type: `integer`, `real`, `type`, `class`, `procedure`, ...
    pub vartype: String,
    pub kind: Option<String>,
    pub strlen: Option<String>,
    /// Derived type, class or procedure interface named in the declaration
    pub proto: Option<Reference>,
    pub attributes: Vec<String>,
    pub intent: Option<String>,
    pub optional: bool,
    /// Dummy argument passed by value
    pub value: bool,
    pub parameter: bool,
    /// Initialized with `=>`
    pub points: bool,
    pub initial: Option<String>,
    pub dimension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonData {
    pub members: Vec<Reference>,
}

/// A `namelist /group/ a, b` group; members link to the variables they name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamelistData {
    pub members: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumData {
    pub bind_c: bool,
}

/// The closed set of entity kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    SourceFile(SourceFileData),
    Module(ModuleData),
    Submodule(SubmoduleData),
    Program(ProgramData),
    Procedure(ProcedureData),
    Interface(InterfaceData),
    AbstractInterface,
    DerivedType(TypeData),
    Variable(VariableData),
    BlockData(UnitData),
    CommonBlock(CommonData),
    Namelist(NamelistData),
    Enum(EnumData),
}

impl EntityKind {
    #[must_use]
    pub fn uses(&self) -> &[UseStatement] {
        match self {
            Self::Module(m) => &m.uses,
            Self::Submodule(s) => &s.uses,
            Self::Program(p) => &p.uses,
            Self::Procedure(p) => &p.uses,
            Self::BlockData(b) => &b.uses,
            _ => &[],
        }
    }

    pub fn uses_mut(&mut self) -> Option<&mut Vec<UseStatement>> {
        match self {
            Self::Module(m) => Some(&mut m.uses),
            Self::Submodule(s) => Some(&mut s.uses),
            Self::Program(p) => Some(&mut p.uses),
            Self::Procedure(p) => Some(&mut p.uses),
            Self::BlockData(b) => Some(&mut b.uses),
            _ => None,
        }
    }

    #[must_use]
    pub fn calls(&self) -> &[CallRef] {
        match self {
            Self::Program(p) => &p.calls,
            Self::Procedure(p) => &p.calls,
            _ => &[],
        }
    }

    pub fn calls_mut(&mut self) -> Option<&mut Vec<CallRef>> {
        match self {
            Self::Program(p) => Some(&mut p.calls),
            Self::Procedure(p) => Some(&mut p.calls),
            _ => None,
        }
    }

    /// Rewrite every entity id held by this variant.
    pub(crate) fn remap_ids(&mut self, f: &impl Fn(EntityId) -> EntityId) {
        fn remap_link(link: &mut Link, f: &impl Fn(EntityId) -> EntityId) {
            if let Link::Entity(id) = link {
                *id = f(*id);
            }
        }
        fn remap_uses(uses: &mut [UseStatement], f: &impl Fn(EntityId) -> EntityId) {
            for u in uses {
                remap_link(&mut u.module.link, f);
            }
        }
        fn remap_calls(calls: &mut [CallRef], f: &impl Fn(EntityId) -> EntityId) {
            for c in calls {
                remap_link(&mut c.link, f);
            }
        }

        match self {
            Self::SourceFile(_) | Self::AbstractInterface | Self::Enum(_) => {}
            Self::Module(m) => remap_uses(&mut m.uses, f),
            Self::Submodule(s) => {
                remap_uses(&mut s.uses, f);
                remap_link(&mut s.ancestor.link, f);
                if let Some(p) = &mut s.parent_submodule {
                    remap_link(&mut p.link, f);
                }
            }
            Self::Program(p) => {
                remap_uses(&mut p.uses, f);
                remap_calls(&mut p.calls, f);
            }
            Self::Procedure(p) => {
                remap_uses(&mut p.uses, f);
                remap_calls(&mut p.calls, f);
                for arg in &mut p.args {
                    *arg = f(*arg);
                }
                if let Some(ret) = &mut p.return_variable {
                    *ret = f(*ret);
                }
                if let Some(iface) = &mut p.module_interface {
                    remap_link(&mut iface.link, f);
                }
            }
            Self::Interface(i) => {
                for r in &mut i.procedures {
                    remap_link(&mut r.link, f);
                }
            }
            Self::DerivedType(t) => {
                if let Some(ext) = &mut t.extends {
                    remap_link(&mut ext.link, f);
                }
                if let Some(ctor) = &mut t.constructor {
                    remap_link(&mut ctor.link, f);
                }
                for r in &mut t.finals {
                    remap_link(&mut r.link, f);
                }
                for b in &mut t.bindings {
                    if let Some(proto) = &mut b.proto {
                        remap_link(&mut proto.link, f);
                    }
                    for r in &mut b.targets {
                        remap_link(&mut r.link, f);
                    }
                }
            }
            Self::Variable(v) => {
                if let Some(proto) = &mut v.proto {
                    remap_link(&mut proto.link, f);
                }
            }
            Self::BlockData(b) => remap_uses(&mut b.uses, f),
            Self::CommonBlock(CommonData { members })
            | Self::Namelist(NamelistData { members }) => {
                for r in members {
                    remap_link(&mut r.link, f);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_local_names() {
        let plain = UseStatement {
            module: Reference::new("m"),
            only: false,
            names: vec![UseName {
                local: "b".to_string(),
                original: "a".to_string(),
            }],
        };
        assert_eq!(plain.local_name_for("A").as_deref(), Some("b"));
        assert_eq!(plain.local_name_for("c").as_deref(), Some("c"));

        let only = UseStatement { only: true, ..plain };
        assert_eq!(only.local_name_for("a").as_deref(), Some("b"));
        assert_eq!(only.local_name_for("c"), None);
    }

    #[test]
    fn test_remap_ids() {
        let mut data = ProcedureData::new(ProcedureKind::Function);
        data.args = vec![EntityId(1), EntityId(2)];
        data.return_variable = Some(EntityId(3));
        let mut kind = EntityKind::Procedure(data);
        kind.remap_ids(&|id| EntityId(id.0 + 10));
        let EntityKind::Procedure(data) = kind else {
            panic!("variant changed");
        };
        assert_eq!(data.args, vec![EntityId(11), EntityId(12)]);
        assert_eq!(data.return_variable, Some(EntityId(13)));
    }
}
