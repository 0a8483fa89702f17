//! The entity model.
//!
//! Every documented construct is an [`Entity`]: a shared record (name,
//! documentation, metadata, permission, location, parent and children) plus an
//! [`EntityKind`] variant holding the data specific to that construct.
//!
//! Entities live in an [`EntityTree`] arena and refer to each other through
//! [`EntityId`] indices. Children are owned by their parent's `children` list;
//! every other relation (parent, resolved links) is a plain index lookup.

pub mod kinds;
pub mod metadata;
pub mod tree;

use std::fmt;
use std::str::FromStr;

pub use kinds::{
    Binding, CallRef, CommonData, EntityKind, EnumData, InterfaceData, InterfaceKind, Link,
    ModuleData, NamelistData, ProcedureData, ProcedureKind, ProgramData, Reference,
    SourceFileData, SubmoduleData, TypeData, UnitData, UseName, UseStatement, VariableData,
};
pub use metadata::Metadata;
pub use tree::EntityTree;

/// Index of an entity in its [`EntityTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

impl EntityId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Permission {
    #[default]
    Public,
    Private,
    Protected,
}

impl Permission {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
        }
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "protected" => Ok(Self::Protected),
            other => Err(format!("unknown permission `{other}`")),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an entity without its data, used for lookups with a kind qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityClass {
    SourceFile,
    Module,
    Submodule,
    Program,
    Procedure,
    Interface,
    AbstractInterface,
    DerivedType,
    Variable,
    BlockData,
    CommonBlock,
    Namelist,
    Enum,
}

impl EntityClass {
    /// Qualifier spelling used in links such as `[[name:type]]`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceFile => "sourcefile",
            Self::Module => "module",
            Self::Submodule => "submodule",
            Self::Program => "program",
            Self::Procedure => "procedure",
            Self::Interface => "interface",
            Self::AbstractInterface => "absinterface",
            Self::DerivedType => "type",
            Self::Variable => "variable",
            Self::BlockData => "blockdata",
            Self::CommonBlock => "common",
            Self::Namelist => "namelist",
            Self::Enum => "enum",
        }
    }
}

impl FromStr for EntityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "sourcefile" | "file" => Self::SourceFile,
            "module" => Self::Module,
            "submodule" => Self::Submodule,
            "program" => Self::Program,
            "procedure" | "proc" | "subroutine" | "function" => Self::Procedure,
            "interface" => Self::Interface,
            "absinterface" => Self::AbstractInterface,
            "type" => Self::DerivedType,
            "variable" => Self::Variable,
            "blockdata" => Self::BlockData,
            "common" => Self::CommonBlock,
            "namelist" => Self::Namelist,
            "enum" => Self::Enum,
            other => return Err(format!("unknown entity kind `{other}`")),
        })
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source lines covered by an entity (1-based, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line_start: usize,
    pub line_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Name as written; compare with [`Entity::is_named`]
    pub name: String,
    pub kind: EntityKind,
    /// Narrative documentation (raw markdown, metadata removed)
    pub doc: String,
    pub meta: Metadata,
    pub permission: Permission,
    pub location: Location,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    /// Permissions shown for this entity's members, resolved during correlation
    pub display: Vec<Permission>,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            doc: String::new(),
            meta: Metadata::default(),
            permission: Permission::Public,
            location: Location::default(),
            parent: None,
            children: Vec::new(),
            display: Vec::new(),
        }
    }

    #[must_use]
    pub fn class(&self) -> EntityClass {
        match &self.kind {
            EntityKind::SourceFile(_) => EntityClass::SourceFile,
            EntityKind::Module(_) => EntityClass::Module,
            EntityKind::Submodule(_) => EntityClass::Submodule,
            EntityKind::Program(_) => EntityClass::Program,
            EntityKind::Procedure(_) => EntityClass::Procedure,
            EntityKind::Interface(_) => EntityClass::Interface,
            EntityKind::AbstractInterface => EntityClass::AbstractInterface,
            EntityKind::DerivedType(_) => EntityClass::DerivedType,
            EntityKind::Variable(_) => EntityClass::Variable,
            EntityKind::BlockData(_) => EntityClass::BlockData,
            EntityKind::CommonBlock(_) => EntityClass::CommonBlock,
            EntityKind::Namelist(_) => EntityClass::Namelist,
            EntityKind::Enum(_) => EntityClass::Enum,
        }
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    #[must_use]
    pub fn key(&self) -> String {
        self.name.to_ascii_lowercase()
    }

    /// Whether the entity's own permission is in its parent's display set.
    ///
    /// Only meaningful after correlation.
    #[must_use]
    pub fn is_displayed_in(&self, parent_display: &[Permission]) -> bool {
        parent_display.contains(&self.permission)
    }

    #[must_use]
    pub fn as_procedure(&self) -> Option<&ProcedureData> {
        match &self.kind {
            EntityKind::Procedure(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_variable(&self) -> Option<&VariableData> {
        match &self.kind {
            EntityKind::Variable(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_type(&self) -> Option<&TypeData> {
        match &self.kind {
            EntityKind::DerivedType(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_interface(&self) -> Option<&InterfaceData> {
        match &self.kind {
            EntityKind::Interface(i) => Some(i),
            _ => None,
        }
    }

    /// Procedures, interfaces and abstract interfaces can be called or bound.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(
            self.class(),
            EntityClass::Procedure | EntityClass::Interface | EntityClass::AbstractInterface
        )
    }
}
