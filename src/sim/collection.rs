//! Entity Collection Manager
//!
//! Owns one category of live entities (bullets, hazards, ...). A sweep walks
//! the list from the back so removal never shifts an element that has not been
//! visited yet, drops whatever was flagged dead, and updates the rest.
//! Insertions are staged and only become visible after `flush`, so nothing
//! lands in a list while it is being swept.

use super::entity::{Entity, EntityId, FrameCtx};

#[derive(Debug, Clone)]
pub struct EntityList<T> {
    items: Vec<T>,
    pending: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl<T: Entity> EntityList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an entity; it joins the list on the next `flush`
    pub fn push(&mut self, entity: T) {
        self.pending.push(entity);
    }

    /// Move staged entities into the live list, in insertion order.
    /// Returns how many were added.
    pub fn flush(&mut self) -> usize {
        let added = self.pending.len();
        self.items.append(&mut self.pending);
        added
    }

    /// One pass over the list: flagged entities are removed and handed to
    /// `on_remove`, survivors are updated. Survivor order is preserved.
    ///
    /// An entity that flags itself during this update stays in the list until
    /// the next sweep.
    pub fn sweep<F>(&mut self, ctx: &mut FrameCtx<'_>, mut on_remove: F)
    where
        F: FnMut(T),
    {
        for i in (0..self.items.len()).rev() {
            if self.items[i].is_alive() {
                self.items[i].update(ctx);
            } else {
                on_remove(self.items.remove(i));
            }
        }
    }

    /// Drop flagged entities without updating anyone
    pub fn purge<F>(&mut self, mut on_remove: F)
    where
        F: FnMut(T),
    {
        for i in (0..self.items.len()).rev() {
            if !self.items[i].is_alive() {
                on_remove(self.items.remove(i));
            }
        }
    }

    /// Forget everything, staged entities included
    pub fn clear(&mut self) {
        self.items.clear();
        self.pending.clear();
    }

    /// Number of entities in the live list (staged ones excluded)
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entities waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Live entities that have not been flagged
    pub fn alive_count(&self) -> usize {
        self.items.iter().filter(|e| e.is_alive()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn first_mut(&mut self) -> Option<&mut T> {
        self.items.first_mut()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|e| e.id() == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|e| e.id() == id)
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
