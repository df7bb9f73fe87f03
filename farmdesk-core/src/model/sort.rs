//! ``src/model/sort.rs``
//! ============================================================================
//! # Sort state: one active column plus a direction
//!
//! Clicking the active column flips the direction; clicking another column
//! selects it ascending.

use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::model::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[inline]
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: &'_ str = match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        };

        write!(f, "{s}")
    }
}

/// Active sort column and direction. `key == None` keeps store order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<K> {
    key: Option<K>,
    direction: SortDirection,
}

impl<K> Default for SortState<K> {
    fn default() -> Self {
        Self {
            key: None,
            direction: SortDirection::Ascending,
        }
    }
}

impl<K: Copy + Eq> SortState<K> {
    #[must_use]
    pub const fn unsorted() -> Self {
        Self {
            key: None,
            direction: SortDirection::Ascending,
        }
    }

    #[must_use]
    pub const fn by(key: K, direction: SortDirection) -> Self {
        Self {
            key: Some(key),
            direction,
        }
    }

    #[must_use]
    pub const fn key(&self) -> Option<K> {
        self.key
    }

    #[must_use]
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Column header click.
    pub fn toggle(&mut self, key: K) {
        if self.key == Some(key) {
            self.direction = self.direction.flipped();
        } else {
            self.key = Some(key);
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::unsorted();
    }

    /// Compare two records under the active column. Nulls stay last in both
    /// directions; `Equal` leaves the tiebreak to the stable sort.
    #[must_use]
    pub fn compare<R>(&self, a: &R, b: &R) -> Ordering
    where
        R: Record<Key = K>,
    {
        let Some(key) = self.key else {
            return Ordering::Equal;
        };
        let (left, right) = (a.field(key), b.field(key));
        match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.direction.apply(left.total_cmp(&right)),
        }
    }
}
