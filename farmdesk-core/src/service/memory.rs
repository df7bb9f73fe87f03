//! ``src/service/memory.rs``
//! ============================================================================
//! # In-memory backend
//!
//! A complete `RemoteService` kept in process: server-side id generation,
//! scope partitioning, scripted failures and artificial latency. Used by the
//! tests and by screens running without a backend.

use std::{collections::VecDeque, time::Duration};

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use async_trait::async_trait;
use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::{
    error::ListResult,
    model::record::{Record, RecordId, Validate},
    service::remote::{ListPage, RemoteError, RemoteResult, RemoteService, Scope},
};

struct Inner<R: Record> {
    records: IndexMap<R::Id, (Scope, R)>,
    fail_next: VecDeque<RemoteError>,
    fail_ids: HashSet<R::Id>,
    delays: HashMap<R::Id, Duration>,
    calls: Vec<CompactString>,
}

pub struct InMemoryService<R: Record> {
    inner: Mutex<Inner<R>>,
    latency: Option<Duration>,
}

impl<R: Record> Default for InMemoryService<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> InMemoryService<R> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_records(IndexMap::new())
    }

    fn with_records(records: IndexMap<R::Id, (Scope, R)>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records,
                fail_next: VecDeque::new(),
                fail_ids: HashSet::new(),
                delays: HashMap::new(),
                calls: Vec::new(),
            }),
            latency: None,
        }
    }

    /// Backend pre-populated with `records` under `scope`.
    #[must_use]
    pub fn seeded(scope: &Scope, records: impl IntoIterator<Item = R>) -> Self {
        Self::with_records(
            records
                .into_iter()
                .map(|record| (record.id().clone(), (scope.clone(), record)))
                .collect(),
        )
    }

    /// Backend seeded from a JSON array of records.
    ///
    /// # Errors
    /// `ListError::Serde` if the fixture doesn't parse.
    pub fn from_json(scope: &Scope, json: &str) -> ListResult<Self>
    where
        R: DeserializeOwned,
    {
        let records: Vec<R> = serde_json::from_str(json)?;
        Ok(Self::seeded(scope, records))
    }

    /// Add a fixed delay to every call.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn insert(&self, scope: &Scope, record: R) {
        self.inner
            .lock()
            .await
            .records
            .insert(record.id().clone(), (scope.clone(), record));
    }

    /// The next call fails with `message`, whatever it is.
    pub async fn fail_next(&self, message: &str) {
        self.inner
            .lock()
            .await
            .fail_next
            .push_back(RemoteError::new(message));
    }

    /// Every update/delete touching `id` fails until cleared.
    pub async fn fail_on(&self, id: R::Id) {
        self.inner.lock().await.fail_ids.insert(id);
    }

    pub async fn clear_failures(&self) {
        let mut inner = self.inner.lock().await;
        inner.fail_next.clear();
        inner.fail_ids.clear();
    }

    /// Extra delay for update/delete calls on `id`, to force completions
    /// out of issue order.
    pub async fn delay_on(&self, id: R::Id, delay: Duration) {
        self.inner.lock().await.delays.insert(id, delay);
    }

    /// Server-side copy of a record.
    pub async fn get(&self, id: &R::Id) -> Option<R> {
        self.inner
            .lock()
            .await
            .records
            .get(id)
            .map(|(_, r)| r.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Names of the calls received so far, e.g. `["list", "create"]`.
    pub async fn calls(&self) -> Vec<CompactString> {
        self.inner.lock().await.calls.clone()
    }

    async fn enter(&self, call: &str, id: Option<&R::Id>) -> RemoteResult<()> {
        let delay = {
            let mut inner = self.inner.lock().await;
            inner.calls.push(call.to_compact_string());
            if let Some(err) = inner.fail_next.pop_front() {
                return Err(err);
            }
            if let Some(id) = id
                && inner.fail_ids.contains(id)
            {
                return Err(RemoteError::new(format!("{} {id} rejected by server", R::LABEL)));
            }
            id.and_then(|id| inner.delays.get(id).copied())
        };

        let total = self.latency.unwrap_or_default() + delay.unwrap_or_default();
        if !total.is_zero() {
            tokio::time::sleep(total).await;
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RemoteService<R> for InMemoryService<R> {
    #[instrument(skip(self), fields(entity = R::LABEL))]
    async fn list(&self, scope: &Scope) -> RemoteResult<ListPage<R>> {
        self.enter("list", None).await?;
        let inner = self.inner.lock().await;
        let items: Vec<R> = inner
            .records
            .values()
            .filter(|(owner, record)| {
                (scope.is_global() || owner == scope) && record.in_scope(scope)
            })
            .map(|(_, record)| record.clone())
            .collect();
        debug!(count = items.len(), "listed");
        Ok(ListPage::complete(items))
    }

    #[instrument(skip(self, draft), fields(entity = R::LABEL))]
    async fn create(&self, scope: &Scope, draft: &R::Draft) -> RemoteResult<R> {
        self.enter("create", None).await?;
        // Servers validate too
        draft
            .validate()
            .map_err(|e| RemoteError::new(e.to_compact_string()))?;

        let record = R::from_draft(R::Id::generate(), scope, draft.clone());
        self.inner
            .lock()
            .await
            .records
            .insert(record.id().clone(), (scope.clone(), record.clone()));
        Ok(record)
    }

    #[instrument(skip(self, patch), fields(entity = R::LABEL))]
    async fn update(&self, id: &R::Id, patch: &R::Patch) -> RemoteResult<R> {
        self.enter("update", Some(id)).await?;
        patch
            .validate()
            .map_err(|e| RemoteError::new(e.to_compact_string()))?;

        let mut inner = self.inner.lock().await;
        let (_, record) = inner
            .records
            .get_mut(id)
            .ok_or_else(|| RemoteError::new(format!("{} {id} not found", R::LABEL)))?;
        record.apply_patch(patch);
        Ok(record.clone())
    }

    #[instrument(skip(self), fields(entity = R::LABEL))]
    async fn delete(&self, id: &R::Id) -> RemoteResult<()> {
        self.enter("delete", Some(id)).await?;
        self.inner
            .lock()
            .await
            .records
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| RemoteError::new(format!("{} {id} not found", R::LABEL)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        farmer::{Farmer, FarmerDraft, FarmerPatch, FarmerRole, FarmerStatus},
        harvest::Harvest,
    };

    #[tokio::test]
    async fn create_assigns_server_id() {
        let service = InMemoryService::<Farmer>::new();
        let draft = FarmerDraft::new("Ana Lopez", "ana@example.com", FarmerRole::Farmer);
        let created = service
            .create(&Scope::global(), &draft)
            .await
            .expect("created");

        assert_eq!(created.name, "Ana Lopez");
        assert_eq!(service.get(&created.id).await.map(|f| f.email), Some("ana@example.com".into()));
        assert_eq!(service.calls().await, vec!["create"]);
    }

    #[tokio::test]
    async fn scripted_failures() {
        let service = InMemoryService::seeded(&Scope::global(), Farmer::sample());
        let id = Farmer::sample()[0].id;

        service.fail_next("gateway timeout").await;
        let err = service.list(&Scope::global()).await.expect_err("scripted");
        assert_eq!(err.message, "gateway timeout");
        assert_eq!(service.list(&Scope::global()).await.map(|p| p.total_count), Ok(5));

        service.fail_on(id).await;
        let patch = FarmerPatch {
            status: Some(FarmerStatus::Inactive),
            ..FarmerPatch::default()
        };
        assert!(service.update(&id, &patch).await.is_err());
        service.clear_failures().await;
        assert!(service.update(&id, &patch).await.is_ok());
    }

    #[tokio::test]
    async fn list_is_partitioned_by_scope() {
        let spring = Scope::named("2025-spring");
        let service = InMemoryService::seeded(&spring, Harvest::sample("2025-spring"));
        for record in Harvest::sample("2025-fall") {
            service.insert(&Scope::named("2025-fall"), record).await;
        }

        let page = service.list(&spring).await.expect("listed");
        assert_eq!(page.items.len(), Harvest::sample("x").len());
        assert!(page.items.iter().all(|h| h.season == "2025-spring"));
    }

    #[tokio::test]
    async fn delete_of_missing_record_fails() {
        let service = InMemoryService::<Farmer>::new();
        let err = service.delete(&uuid::Uuid::new_v4()).await.expect_err("missing");
        assert!(err.message.contains("not found"));
    }

    #[tokio::test]
    async fn loads_json_fixtures() {
        let json = serde_json::to_string(&Farmer::sample()).expect("serialize");
        let service = InMemoryService::<Farmer>::from_json(&Scope::global(), &json).expect("parse");
        assert_eq!(service.len().await, 5);
        assert!(InMemoryService::<Farmer>::from_json(&Scope::global(), "{").is_err());
    }
}
