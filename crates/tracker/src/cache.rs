use std::collections::HashMap;

use crate::model::Entity;

/// The most recently fetched snapshot of the fleet.
///
/// Entities keep the order of the response they came from. The cache is only
/// ever replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct FleetCache {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl FleetCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry with `entities`. A duplicate id keeps the last
    /// occurrence, at the position of the first.
    pub fn replace(&mut self, entities: Vec<Entity>) {
        self.entities.clear();
        self.index.clear();

        for entity in entities {
            if let Some(&slot) = self.index.get(&entity.id) {
                self.entities[slot] = entity;
            } else {
                self.index.insert(entity.id.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&slot| &self.entities[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
