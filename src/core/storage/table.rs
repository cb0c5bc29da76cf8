// src/core/storage/table.rs

//! Defines `EntityTable`, the identifier-indexed arena behind each repository.

use crate::core::errors::StoreError;
use crate::core::model::Entity;
use crate::core::page::{self, Page, PageMetadata};
use indexmap::IndexMap;
use std::collections::HashSet;

/// An identifier-indexed store of entities with sequential ID allocation.
///
/// The table is not synchronized on its own; each repository keeps it behind
/// its single lock together with its connection index. Entries enumerate in
/// insertion order, so position-based windows are reproducible.
#[derive(Debug)]
pub struct EntityTable<T: Entity> {
    entries: IndexMap<String, T>,
    /// Advanced once per stored entity, and past any generated value already
    /// in use. Never decremented, even on removal. It also backs the `total`
    /// reported in pages.
    counter: u64,
}

impl<T: Entity> Default for EntityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> EntityTable<T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            counter: 0,
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Looks an entity up by identifier.
    pub fn retrieve(&self, id: &str) -> Result<T, StoreError> {
        self.get(id).cloned().ok_or(StoreError::NotFound)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    /// Stores a batch atomically. Entities without an identifier get the next
    /// free zero-padded sequence number; values already in use, by the table
    /// or by the batch, are skipped. A caller-supplied identifier that is
    /// already taken rejects the whole batch: nothing is stored and the
    /// counter does not move.
    pub fn insert_batch(&mut self, mut batch: Vec<T>) -> Result<Vec<T>, StoreError> {
        let mut taken = HashSet::with_capacity(batch.len());
        for entity in batch.iter().filter(|e| !e.id().is_empty()) {
            if self.entries.contains_key(entity.id()) || !taken.insert(entity.id().to_string()) {
                return Err(StoreError::Conflict);
            }
        }

        let mut counter = self.counter;
        for entity in batch.iter_mut() {
            counter += 1;
            if !entity.id().is_empty() {
                continue;
            }
            let mut id = format!("{counter:03}");
            while self.entries.contains_key(&id) || taken.contains(&id) {
                counter += 1;
                id = format!("{counter:03}");
            }
            taken.insert(id.clone());
            entity.set_id(id);
        }

        self.counter = counter;
        for entity in &batch {
            self.entries.insert(entity.id().to_string(), entity.clone());
        }
        Ok(batch)
    }

    /// Replaces the stored record with the same identifier.
    pub fn replace(&mut self, entity: T) -> Result<(), StoreError> {
        match self.entries.get_mut(entity.id()) {
            Some(slot) => {
                *slot = entity;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    /// Removes a single entity, keeping the enumeration order of the rest.
    pub fn remove(&mut self, id: &str) -> Result<T, StoreError> {
        self.entries.shift_remove(id).ok_or(StoreError::NotFound)
    }

    /// Windows the whole table by enumeration position.
    pub fn page_by_position(&self, query: &PageMetadata) -> Page<T> {
        let items = page::window_by_position(self.entries.values(), query);
        Page::new(items, query, self.counter)
    }

    /// Collects the entities of the given groups whose identifier ordinal falls
    /// in the query window, then applies the name filter and the sort contract.
    pub fn page_by_groups(&self, group_ids: &[String], query: &PageMetadata) -> Page<T> {
        if query.limit == 0 {
            return Page::empty(query, self.counter);
        }
        let groups: HashSet<&str> = group_ids.iter().map(String::as_str).collect();
        let candidates = self
            .entries
            .values()
            .filter(|e| groups.contains(e.group_id()));
        let items = page::window_by_ordinal(candidates, query);
        page::finish_page(items, query, self.counter)
    }
}
