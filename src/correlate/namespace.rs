//! Names visible in a scope.
//!
//! A [`Layer`] holds what one scope declares or imports. Host association is
//! not copied into layers: lookups walk from the innermost scope outwards and
//! stop at the first layer that knows the name, so local names shadow host
//! names without any bookkeeping.

use std::collections::HashMap;

use crate::entity::{EntityClass, EntityId, Link};
use crate::parser::text::squeeze;

/// Normalized lookup key: lower case, whitespace removed.
#[must_use]
pub fn key(name: &str) -> String {
    squeeze(name).to_ascii_lowercase()
}

/// One thing a name may refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub link: Link,
    /// `None` for external entries whose kind was not recognized
    pub class: Option<EntityClass>,
}

impl Candidate {
    #[must_use]
    pub fn entity(id: EntityId, class: EntityClass) -> Self {
        Self {
            link: Link::Entity(id),
            class: Some(class),
        }
    }

    #[must_use]
    pub fn external(url: impl Into<String>, class: Option<EntityClass>) -> Self {
        Self {
            link: Link::External { url: url.into() },
            class,
        }
    }

    #[must_use]
    pub fn is(&self, class: EntityClass) -> bool {
        self.class == Some(class)
    }

    /// Procedures and interfaces, which calls and bindings may target.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(
            self.class,
            Some(EntityClass::Procedure | EntityClass::Interface | EntityClass::AbstractInterface)
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Layer {
    names: HashMap<String, Vec<Candidate>>,
}

impl Layer {
    /// Add a candidate for `name`, ignoring unnamed entities and repeats.
    pub fn insert(&mut self, name: &str, candidate: Candidate) {
        let name = key(name);
        if name.is_empty() {
            return;
        }
        let slot = self.names.entry(name).or_default();
        if !slot.contains(&candidate) {
            slot.push(candidate);
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Candidate]> {
        self.names.get(&key(name)).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&key(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
