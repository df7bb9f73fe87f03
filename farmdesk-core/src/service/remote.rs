//! ``src/service/remote.rs``
//! ============================================================================
//! # Remote data service contract
//!
//! One service per entity. Every call may fail with a `RemoteError` carrying
//! a human readable message. The list call takes the scope (e.g. the current
//! season) explicitly; nothing is read from ambient state.

use std::fmt;

use async_trait::async_trait;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::record::Record;

/// Selector the fetched data depends on, e.g. a season id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Scope(Option<CompactString>);

impl Scope {
    /// Unscoped entities (farmers, logs).
    #[must_use]
    pub const fn global() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn named(key: impl Into<CompactString>) -> Self {
        Self(Some(key.into()))
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key().unwrap_or("global"))
    }
}

/// Transport failure or server-reported rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: CompactString,
}

impl RemoteError {
    pub fn new(message: impl Into<CompactString>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a list call.
#[derive(Debug, Clone)]
pub struct ListPage<R> {
    pub items: Vec<R>,
    pub total_count: usize,
}

impl<R> ListPage<R> {
    #[must_use]
    pub fn complete(items: Vec<R>) -> Self {
        let total_count = items.len();
        Self { items, total_count }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

#[async_trait]
pub trait RemoteService<R: Record>: Send + Sync {
    async fn list(&self, scope: &Scope) -> RemoteResult<ListPage<R>>;

    async fn create(&self, scope: &Scope, draft: &R::Draft) -> RemoteResult<R>;

    async fn update(&self, id: &R::Id, patch: &R::Patch) -> RemoteResult<R>;

    async fn delete(&self, id: &R::Id) -> RemoteResult<()>;
}

#[async_trait]
impl<R, S> RemoteService<R> for std::sync::Arc<S>
where
    R: Record,
    S: RemoteService<R> + ?Sized,
{
    async fn list(&self, scope: &Scope) -> RemoteResult<ListPage<R>> {
        (**self).list(scope).await
    }

    async fn create(&self, scope: &Scope, draft: &R::Draft) -> RemoteResult<R> {
        (**self).create(scope, draft).await
    }

    async fn update(&self, id: &R::Id, patch: &R::Patch) -> RemoteResult<R> {
        (**self).update(id, patch).await
    }

    async fn delete(&self, id: &R::Id) -> RemoteResult<()> {
        (**self).delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display() {
        assert_eq!(Scope::global().to_string(), "global");
        assert_eq!(Scope::named("2025-spring").to_string(), "2025-spring");
        assert!(Scope::default().is_global());
        assert_eq!(Scope::named("s1").key(), Some("s1"));
    }

    #[test]
    fn list_page_counts_items() {
        let page = ListPage::complete(vec![1, 2, 3]);
        assert_eq!(page.total_count, 3);
    }
}
