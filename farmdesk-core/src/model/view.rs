//! ``src/model/view.rs``
//! ============================================================================
//! # Filter/Sort stage
//!
//! Pure derivation of the visible, ordered sequence from the store. Never
//! fails; an empty store yields an empty view.

use tracing::debug;

use crate::model::{filter::FilterCriteria, record::Record, sort::SortState, store::EntityStore};

/// Records passing `criteria`, ordered by `sort`, ties in store order.
#[must_use]
pub fn derive_view<'a, R: Record>(
    store: &'a EntityStore<R>,
    criteria: &FilterCriteria<R::Key>,
    sort: &SortState<R::Key>,
) -> Vec<&'a R> {
    let mut rows: Vec<&R> = store.iter().filter(|r| criteria.matches(*r)).collect();

    if sort.key().is_some() {
        // `sort_by` is stable: equal rows keep store order
        rows.sort_by(|a, b| sort.compare(*a, *b));
    }

    debug!(
        entity = R::LABEL,
        total = store.len(),
        visible = rows.len(),
        "derived view"
    );
    rows
}

/// Identifiers of a derived view, in view order.
#[must_use]
pub fn view_ids<R: Record>(rows: &[&R]) -> Vec<R::Id> {
    rows.iter().map(|r| r.id().clone()).collect()
}
