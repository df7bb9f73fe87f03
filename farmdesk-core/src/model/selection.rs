//! ``src/model/selection.rs``
//! ============================================================================
//! # Selection tracker for bulk operations
//!
//! Holds identifiers drawn from the current filtered view. The controller
//! prunes it whenever the view changes and removes an id in the same update
//! that deletes its record, so bulk actions never see stale ids.

use std::hash::Hash;

use indexmap::IndexSet;

/// Header checkbox state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    None,
    Partial,
    All,
}

#[derive(Debug, Clone)]
pub struct Selection<Id> {
    ids: IndexSet<Id, ahash::RandomState>,
}

impl<Id> Default for Selection<Id> {
    fn default() -> Self {
        Self {
            ids: IndexSet::with_hasher(ahash::RandomState::new()),
        }
    }
}

impl<Id: Clone + Eq + Hash> Selection<Id> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    /// Selected ids in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &Id> {
        self.ids.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Id> {
        self.ids.iter().cloned().collect()
    }

    /// Flip membership of `id`. Returns true if it is now selected.
    pub fn toggle(&mut self, id: Id) -> bool {
        if self.ids.shift_remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Header checkbox click: clear when everything in view is selected,
    /// otherwise select exactly the view.
    pub fn toggle_all<'a, I>(&mut self, view_ids: I)
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let view: IndexSet<&Id, ahash::RandomState> = view_ids.into_iter().collect();
        if self.ids.len() == view.len() {
            self.ids.clear();
        } else {
            self.ids = view.into_iter().cloned().collect();
        }
    }

    /// Tri-state for the header checkbox relative to the visible ids.
    #[must_use]
    pub fn state<'a, I>(&self, view_ids: I) -> SelectAllState
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let mut visible = 0usize;
        let mut selected = 0usize;
        for id in view_ids {
            visible += 1;
            if self.ids.contains(id) {
                selected += 1;
            }
        }
        if selected == 0 {
            SelectAllState::None
        } else if selected == visible {
            SelectAllState::All
        } else {
            SelectAllState::Partial
        }
    }

    /// Drop ids that left the view. Returns how many were dropped.
    pub fn retain<'a, I>(&mut self, view_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a Id>,
        Id: 'a,
    {
        let view: IndexSet<&Id, ahash::RandomState> = view_ids.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| view.contains(id));
        before - self.ids.len()
    }

    /// Returns true if `id` was selected.
    pub fn remove(&mut self, id: &Id) -> bool {
        self.ids.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
