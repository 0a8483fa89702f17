//! Arena holding a forest of entities.

use std::ops::{Index, IndexMut};

use super::{Entity, EntityClass, EntityId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTree {
    entities: Vec<Entity>,
}

impl EntityTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Add an entity, appending it to its parent's children.
    pub fn add(&mut self, parent: Option<EntityId>, mut entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        entity.parent = parent;
        self.entities.push(entity);
        if let Some(parent) = parent {
            self.entities[parent.0].children.push(id);
        }
        id
    }

    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.entities.len()).map(EntityId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i), e))
    }

    /// Entities without a parent, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.iter()
            .filter(|(_, e)| e.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Parent chain, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::successors(self[id].parent, move |p| self[*p].parent)
    }

    /// First child with the given name (case-insensitive) and optional kind.
    #[must_use]
    pub fn find_child(
        &self,
        parent: EntityId,
        name: &str,
        class: Option<EntityClass>,
    ) -> Option<EntityId> {
        self[parent].children.iter().copied().find(|&c| {
            let child = &self[c];
            child.is_named(name) && class.map_or(true, |k| child.class() == k)
        })
    }

    /// Children of one kind.
    pub fn children_of(
        &self,
        parent: EntityId,
        class: EntityClass,
    ) -> impl Iterator<Item = EntityId> + '_ {
        self[parent]
            .children
            .iter()
            .copied()
            .filter(move |&c| self[c].class() == class)
    }

    /// Depth-first walk of `root` and its descendants, parents first.
    #[must_use]
    pub fn descendants(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self[id].children.iter().rev().copied());
        }
        out
    }

    /// Move all entities of `other` into this arena, returning the id offset.
    pub fn absorb(&mut self, other: EntityTree) -> usize {
        let offset = self.entities.len();
        let shift = |id: EntityId| EntityId(id.0 + offset);
        for mut entity in other.entities {
            entity.parent = entity.parent.map(shift);
            for child in &mut entity.children {
                *child = shift(*child);
            }
            entity.kind.remap_ids(&shift);
            self.entities.push(entity);
        }
        offset
    }
}

impl Index<EntityId> for EntityTree {
    type Output = Entity;

    fn index(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }
}

impl IndexMut<EntityId> for EntityTree {
    fn index_mut(&mut self, id: EntityId) -> &mut Entity {
        &mut self.entities[id.0]
    }
}
