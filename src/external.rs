//! Link directories shared between independently documented projects.
//!
//! A project publishes a [`LinkDirectory`] listing its modules and their
//! public entities with documentation URLs. Another project loads it into an
//! [`ExternalIndex`] so that `use` statements naming those modules, and the
//! entities imported through them, resolve to external links.
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     { "name": "geometry", "kind": "module", "url": "https://docs.example/module/geometry.html" },
//!     { "name": "geometry::circle", "kind": "type", "url": "https://docs.example/type/circle.html" }
//!   ]
//! }
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::entity::EntityClass;
use crate::error::{Error, Result};

/// Separator between a module and one of its entities in an entry name.
pub const SCOPE_SEPARATOR: &str = "::";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    /// `module` or `module::entity`, lower case
    pub name: String,
    /// Entity kind qualifier (`module`, `type`, `procedure`, ...)
    pub kind: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDirectory {
    pub version: u32,
    #[serde(default)]
    pub entries: Vec<LinkEntry>,
}

impl Default for LinkDirectory {
    fn default() -> Self {
        Self {
            version: Self::VERSION,
            entries: Vec::new(),
        }
    }
}

impl LinkDirectory {
    pub const VERSION: u32 = 1;

    pub fn from_json(text: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| Error::LinkDirectory {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text, path)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json().map_err(|source| Error::LinkDirectory {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}

/// An entity published by another project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEntity {
    pub name: String,
    pub class: Option<EntityClass>,
    pub url: String,
}

/// A module published by another project, with its public entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalModule {
    pub name: String,
    pub url: String,
    pub members: Vec<ExternalEntity>,
}

/// Modules of all loaded link directories, first loaded first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalIndex {
    modules: Vec<ExternalModule>,
}

impl ExternalIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Add the modules and members of `directory`. Members whose module is
    /// not listed in the same directory are dropped.
    pub fn add(&mut self, directory: &LinkDirectory) {
        let first_new = self.modules.len();
        for entry in &directory.entries {
            let name = entry.name.trim().to_ascii_lowercase();
            if name.contains(SCOPE_SEPARATOR) {
                continue;
            }
            self.modules.push(ExternalModule {
                name,
                url: entry.url.clone(),
                members: Vec::new(),
            });
        }
        for entry in &directory.entries {
            let Some((module, member)) = entry.name.split_once(SCOPE_SEPARATOR) else {
                continue;
            };
            let module = module.trim().to_ascii_lowercase();
            let target = self.modules[first_new..]
                .iter_mut()
                .find(|m| m.name == module);
            match target {
                Some(target) => target.members.push(ExternalEntity {
                    name: member.trim().to_ascii_lowercase(),
                    class: entry.kind.parse().ok(),
                    url: entry.url.clone(),
                }),
                None => debug!(entry = entry.name.as_str(); "external entry without its module"),
            }
        }
    }

    /// First loaded module with this name, case-insensitively.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ExternalModule> {
        self.modules.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn modules(&self) -> impl Iterator<Item = &ExternalModule> {
        self.modules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: &str, url: &str) -> LinkEntry {
        LinkEntry {
            name: name.to_string(),
            kind: kind.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_parse_directory() {
        let json = r#"{
            "version": 1,
            "entries": [
                {"name": "geometry", "kind": "module", "url": "https://x/module/geometry.html"},
                {"name": "geometry::circle", "kind": "type", "url": "https://x/type/circle.html"}
            ]
        }"#;
        let dir = LinkDirectory::from_json(json, Path::new("links.json")).unwrap();
        assert_eq!(dir.version, 1);
        assert_eq!(dir.entries.len(), 2);
        assert_eq!(dir.entries[1].kind, "type");
    }

    #[test]
    fn test_invalid_json_is_link_directory_error() {
        let err = LinkDirectory::from_json("{ not json", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, Error::LinkDirectory { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn test_index_groups_members() {
        let dir = LinkDirectory {
            version: LinkDirectory::VERSION,
            entries: vec![
                entry("Geometry", "module", "u/m"),
                entry("geometry::Circle", "type", "u/t"),
                entry("geometry::area", "procedure", "u/p"),
                entry("orphan::x", "variable", "u/x"),
            ],
        };
        let mut index = ExternalIndex::new();
        index.add(&dir);
        let module = index.module("GEOMETRY").unwrap();
        assert_eq!(module.url, "u/m");
        assert_eq!(module.members.len(), 2);
        assert_eq!(module.members[0].name, "circle");
        assert_eq!(module.members[0].class, Some(EntityClass::DerivedType));
        assert!(index.module("orphan").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = LinkDirectory {
            version: LinkDirectory::VERSION,
            entries: vec![entry("m", "module", "u/m")],
        };
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("links.json");
        dir.save(&path).unwrap();
        assert_eq!(LinkDirectory::load(&path).unwrap(), dir);
    }
}
