//! ``src/model/record.rs``
//! ============================================================================
//! # Record: the contract every list entity implements
//!
//! A record exposes a stable identifier, a typed set of columns (`Key`) and a
//! uniform view of each column (`FieldValue`) that the filter and sort stages
//! work on. Create payloads (`Draft`) and partial updates (`Patch`) carry
//! their own local validation.

use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::{Debug, Display},
    hash::Hash,
};

use chrono::NaiveDate;
use compact_str::{CompactString, ToCompactString};
use uuid::Uuid;

use crate::{error::ListResult, service::remote::Scope};

/// Identifier of a record. Must be unique within a store.
pub trait RecordId: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static {
    /// Fresh identifier used for provisional (optimistic) records and by
    /// backends that assign ids on create.
    fn generate() -> Self;
}

impl RecordId for Uuid {
    fn generate() -> Self {
        Self::new_v4()
    }
}

impl RecordId for CompactString {
    fn generate() -> Self {
        nanoid::nanoid!().to_compact_string()
    }
}

/// Local validation for create payloads and patches.
pub trait Validate {
    /// # Errors
    /// `ListError::Validation` naming the first offending field.
    fn validate(&self) -> ListResult<()>;
}

/// One entity instance (farmer, plot, expense row, harvest batch, log entry).
pub trait Record: Clone + Debug + Send + Sync + 'static {
    type Id: RecordId;

    /// Columns usable as filter and sort keys.
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    /// Create payload.
    type Draft: Validate + Clone + Debug + Send + Sync + 'static;

    /// Partial update; fields left `None` keep their current value.
    type Patch: Validate + Clone + Debug + Send + Sync + 'static;

    /// Singular noun used in notifications ("farmer").
    const LABEL: &'static str;

    /// Plural noun used in aggregate notifications ("farmers").
    const LABEL_PLURAL: &'static str;

    /// Columns searched by the free-text query.
    const SEARCH_KEYS: &'static [Self::Key];

    /// Records belong to a named scope (e.g. a season) and cannot be
    /// created under the global one.
    const SCOPED: bool = false;

    fn id(&self) -> &Self::Id;

    fn field(&self, key: Self::Key) -> FieldValue<'_>;

    /// Human readable name used in notifications.
    fn display_name(&self) -> Cow<'_, str>;

    /// Build a record from a validated draft.
    fn from_draft(id: Self::Id, scope: &Scope, draft: Self::Draft) -> Self;

    /// Merge a validated patch over the current attributes.
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Whether the record belongs to `scope`. Unscoped entities match all.
    fn in_scope(&self, _scope: &Scope) -> bool {
        true
    }
}

/// Uniform view of a column value used by filtering and sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(Cow<'a, str>),
}

impl<'a> FieldValue<'a> {
    #[must_use]
    pub fn text(value: &'a str) -> Self {
        Self::Text(Cow::Borrowed(value))
    }

    #[must_use]
    pub fn opt_text(value: Option<&'a str>) -> Self {
        value.map_or(Self::Null, Self::text)
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text used by search and categorical matching.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Date(d) => Cow::Owned(d.format("%Y-%m-%d").to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_ref()),
        }
    }

    /// Exact categorical equality against a filter value.
    #[must_use]
    pub fn matches_category(&self, expected: &str) -> bool {
        match self {
            Self::Null => false,
            Self::Text(s) => s.as_ref() == expected,
            Self::Int(i) => expected.parse::<i64>().is_ok_and(|e| e == *i),
            Self::Float(f) => expected.parse::<f64>().is_ok_and(|e| e == *f),
            Self::Bool(b) => expected.parse::<bool>().is_ok_and(|e| e == *b),
            Self::Date(d) => expected.parse::<NaiveDate>().is_ok_and(|e| e == *d),
        }
    }

    /// Case-insensitive substring containment; `needle` must already be
    /// lowercase.
    #[must_use]
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            Self::Null => false,
            other => other.render().to_lowercase().contains(needle),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) | Self::Float(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
            Self::Null => 4,
        }
    }

    /// Total order over column values.
    ///
    /// Numbers compare numerically across `Int`/`Float`, text compares
    /// case-insensitively with a case-sensitive tiebreak, and values of
    /// different kinds order by kind. `Null` sorts after everything; the view
    /// keeps nulls last in both directions.
    #[expect(clippy::cast_precision_loss, reason = "Mixed int/float columns")]
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.total_cmp(&(*b as f64)),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl From<i64> for FieldValue<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<NaiveDate> for FieldValue<'_> {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}
