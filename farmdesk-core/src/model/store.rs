//! ``src/model/store.rs``
//! ============================================================================
//! # `EntityStore`: canonical, unfiltered records of one entity
//!
//! Backed by an `IndexMap` so lookups by id are O(1) while insertion order is
//! kept as the sort tiebreak. Identifiers are unique at all times.

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    error::{ListError, ListResult},
    model::record::Record,
};

#[derive(Debug, Clone)]
pub struct EntityStore<R: Record> {
    records: IndexMap<R::Id, R, ahash::RandomState>,
}

impl<R: Record> Default for EntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> EntityStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: IndexMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Build a store from a fetched list.
    ///
    /// # Errors
    /// `ListError::DuplicateId` if two records share an id.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> ListResult<Self> {
        let mut store = Self::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &R::Id) -> Option<&R> {
        self.records.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &R::Id) -> bool {
        self.records.contains_key(id)
    }

    /// Position of `id` in insertion order.
    #[must_use]
    pub fn position(&self, id: &R::Id) -> Option<usize> {
        self.records.get_index_of(id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }

    /// Append a record.
    ///
    /// # Errors
    /// `ListError::DuplicateId` if the id is already present.
    pub fn insert(&mut self, record: R) -> ListResult<()> {
        let id = record.id().clone();
        if self.records.contains_key(&id) {
            return Err(ListError::duplicate_id(&id));
        }
        trace!(id = %id, "store insert");
        self.records.insert(id, record);
        Ok(())
    }

    /// Insert at `index` (clamped to the current length). Used to undo a
    /// delete without moving the record to the end.
    ///
    /// # Errors
    /// `ListError::DuplicateId` if the id is already present.
    pub fn insert_at(&mut self, index: usize, record: R) -> ListResult<()> {
        let id = record.id().clone();
        if self.records.contains_key(&id) {
            return Err(ListError::duplicate_id(&id));
        }
        let index = index.min(self.records.len());
        self.records.shift_insert(index, id, record);
        Ok(())
    }

    /// Replace the record stored under `id` with `record`, keeping its
    /// position. The replacement may carry a different id (a provisional id
    /// swapped for the server's).
    ///
    /// # Errors
    /// `ListError::NotFound` if `id` is absent, `ListError::DuplicateId` if the
    /// new id already belongs to another record.
    pub fn replace(&mut self, id: &R::Id, record: R) -> ListResult<()> {
        let index = self
            .records
            .get_index_of(id)
            .ok_or_else(|| ListError::not_found(id))?;

        let new_id = record.id().clone();
        if &new_id == id {
            self.records[index] = record;
            return Ok(());
        }
        if self.records.contains_key(&new_id) {
            return Err(ListError::duplicate_id(&new_id));
        }
        self.records.shift_remove_index(index);
        self.records.shift_insert(index, new_id, record);
        Ok(())
    }

    /// Merge `patch` into the record with `id` and return the prior value.
    ///
    /// # Errors
    /// `ListError::NotFound` if `id` is absent.
    pub fn patch(&mut self, id: &R::Id, patch: &R::Patch) -> ListResult<R> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| ListError::not_found(id))?;
        let previous = record.clone();
        record.apply_patch(patch);
        Ok(previous)
    }

    /// Remove a record, returning it with its former position.
    pub fn remove(&mut self, id: &R::Id) -> Option<(usize, R)> {
        self.records
            .shift_remove_full(id)
            .map(|(index, _, record)| (index, record))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Identifiers in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &R::Id> {
        self.records.keys()
    }
}
