use crate::api::types::EntityId;

/// Anything that can live in a [`Scene`].
pub trait SceneEntity {
    fn id(&self) -> EntityId;
}

/// Simple entity storage using a flat Vec.
/// Iteration order is spawn order; despawn keeps the order of the rest.
#[derive(Debug, Clone)]
pub struct Scene<E> {
    entities: Vec<E>,
}

impl<E: SceneEntity> Scene<E> {
    pub fn new() -> Self {
        Self {
            entities: Vec::with_capacity(32),
        }
    }

    /// Add an entity to the scene.
    pub fn spawn(&mut self, entity: E) {
        self.entities.push(entity);
    }

    /// Remove an entity by ID. Returns the removed entity if found.
    pub fn despawn(&mut self, id: EntityId) -> Option<E> {
        let idx = self.entities.iter().position(|e| e.id() == id)?;
        Some(self.entities.remove(idx))
    }

    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut E> {
        self.entities.iter_mut().find(|e| e.id() == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entities.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entities.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Remove every entity for which `keep` returns false.
    pub fn retain(&mut self, keep: impl FnMut(&E) -> bool) {
        self.entities.retain(keep);
    }
}

impl<E: SceneEntity> Default for Scene<E> {
    fn default() -> Self {
        Self::new()
    }
}
