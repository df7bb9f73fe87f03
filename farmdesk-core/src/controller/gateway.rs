//! src/controller/gateway.rs
//! ============================================================================
//! # Mutation gateway
//!
//! Create, update, delete and bulk intents go through three steps:
//!
//! 1. `ListController::begin` validates the intent and, in optimistic mode,
//!    applies it to the store right away, keeping undo data.
//! 2. `PendingMutation::dispatch` performs the remote call. It only borrows
//!    the service, is bounded by the configured timeout and is cancelled when
//!    the controller detaches.
//! 3. `ListController::settle` reconciles the completion with the store and
//!    emits the outcome notification.
//!
//! The controller stays usable between steps 1 and 3, so several mutations
//! can be in flight and their completions applied in any order. Completions
//! issued before a scope change or detach are discarded.

use std::{future::Future, time::Duration};

use ahash::HashSet;
use compact_str::{CompactString, ToCompactString, format_compact};
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    controller::list_controller::ListController,
    error::{ListError, ListResult},
    model::{
        notification::NotificationSink,
        record::{Record, RecordId, Validate},
    },
    service::remote::{RemoteResult, RemoteService, Scope},
};

/// How a controller reconciles its store with the remote service. One mode
/// per controller; never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMode {
    /// The store changes only once the remote call succeeds.
    #[default]
    Confirmed,

    /// The store changes immediately and is rolled back if the call fails.
    Optimistic,
}

/// Action applied to every id of a bulk intent.
#[derive(Debug, Clone)]
pub enum BulkOp<R: Record> {
    Delete,
    Patch(R::Patch),
}

impl<R: Record> BulkOp<R> {
    const fn verb(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Patch(_) => "update",
        }
    }

    const fn past_tense(&self) -> &'static str {
        match self {
            Self::Delete => "deleted",
            Self::Patch(_) => "updated",
        }
    }
}

#[derive(Debug, Clone)]
pub enum MutationIntent<R: Record> {
    Create(R::Draft),
    Update(R::Id, R::Patch),
    Delete(R::Id),
    BulkAction(Vec<R::Id>, BulkOp<R>),
}

impl<R: Record> MutationIntent<R> {
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update(..) => "update",
            Self::Delete(_) => "delete",
            Self::BulkAction(..) => "bulk",
        }
    }
}

/// Lifecycle of one intent.
///
/// `Idle -> Validating -> Rejected | Submitting -> Succeeded | Failed`.
/// `Skipped` covers intents on ids the store no longer holds and `Discarded`
/// covers completions that outlived their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPhase {
    #[default]
    Idle,
    Validating,
    Rejected,
    Submitting,
    Succeeded,
    Failed,
    Skipped,
    Discarded,
}

impl MutationPhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Idle | Self::Validating | Self::Submitting)
    }
}

/// Per-id result of a bulk intent.
#[derive(Debug, Clone)]
pub struct BatchReport<R: Record> {
    /// Ids the service accepted, with the returned record for patches.
    pub succeeded: Vec<(R::Id, Option<R>)>,

    /// Ids the service rejected, with the reason.
    pub failed: Vec<(R::Id, CompactString)>,
}

impl<R: Record> Default for BatchReport<R> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<R: Record> BatchReport<R> {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded_ids(&self) -> impl Iterator<Item = &R::Id> {
        self.succeeded.iter().map(|(id, _)| id)
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &R::Id> {
        self.failed.iter().map(|(id, _)| id)
    }
}

/// Terminal result of an intent.
#[derive(Debug)]
pub enum MutationOutcome<R: Record> {
    /// Local validation failed; nothing was sent.
    Rejected(ListError),

    /// The target id is not in the store; nothing was done.
    Skipped,

    /// Remote call succeeded. Carries the affected id.
    Succeeded(R::Id),

    /// Remote call failed; the store holds its pre-mutation state.
    Failed(ListError),

    /// Bulk intent finished; see the report for per-id results.
    Batch(BatchReport<R>),

    /// Completion arrived after a scope change or detach and was ignored.
    Discarded,
}

impl<R: Record> MutationOutcome<R> {
    #[must_use]
    pub fn phase(&self) -> MutationPhase {
        match self {
            Self::Rejected(_) => MutationPhase::Rejected,
            Self::Skipped => MutationPhase::Skipped,
            Self::Succeeded(_) => MutationPhase::Succeeded,
            Self::Failed(_) => MutationPhase::Failed,
            Self::Batch(report) if report.is_complete_success() => MutationPhase::Succeeded,
            Self::Batch(_) => MutationPhase::Failed,
            Self::Discarded => MutationPhase::Discarded,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.phase() == MutationPhase::Succeeded
    }

    #[must_use]
    pub const fn error(&self) -> Option<&ListError> {
        match self {
            Self::Rejected(err) | Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Option<&R::Id> {
        match self {
            Self::Succeeded(id) => Some(id),
            _ => None,
        }
    }
}

/// Result of `begin`: either a mutation to dispatch or an intent that
/// finished locally (rejected or skipped).
#[derive(Debug)]
pub enum Submission<R: Record> {
    InFlight(PendingMutation<R>),
    Settled(MutationOutcome<R>),
}

// Undo step recorded by an optimistic change
#[derive(Debug)]
enum Undo<R: Record> {
    Remove,
    Restore(R),
    Reinsert(usize, R),
}

// Single mutations hold one step; bulk spills to the heap
type UndoLog<R> = SmallVec<[(<R as Record>::Id, Undo<R>); 1]>;

#[derive(Debug)]
enum Request<R: Record> {
    Create {
        scope: Scope,
        draft: R::Draft,
        provisional: Option<R::Id>,
    },
    Update {
        id: R::Id,
        patch: R::Patch,
    },
    Delete {
        id: R::Id,
        name: CompactString,
    },
    Bulk {
        ids: Vec<R::Id>,
        op: BulkOp<R>,
    },
}

#[derive(Debug)]
enum Resolved<R: Record> {
    Created {
        provisional: Option<R::Id>,
        result: ListResult<R>,
    },
    Updated {
        id: R::Id,
        result: ListResult<R>,
    },
    Deleted {
        id: R::Id,
        name: CompactString,
        result: ListResult<()>,
    },
    Batch {
        op: BulkOp<R>,
        report: BatchReport<R>,
    },
}

/// A validated intent waiting for its remote call.
#[derive(Debug)]
#[must_use = "a pending mutation does nothing until dispatched and settled"]
pub struct PendingMutation<R: Record> {
    ticket: u64,
    epoch: u64,
    request: Request<R>,
    undo: UndoLog<R>,
    cancel: CancellationToken,
    timeout: Duration,
    bulk_timeout: Duration,
}

/// A finished remote call, ready for `ListController::settle`.
#[derive(Debug)]
pub struct Completion<R: Record> {
    ticket: u64,
    epoch: u64,
    undo: UndoLog<R>,
    resolved: Resolved<R>,
}

impl<R: Record> Completion<R> {
    #[must_use]
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl<R: Record> PendingMutation<R> {
    #[must_use]
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }

    #[must_use]
    pub const fn phase(&self) -> MutationPhase {
        MutationPhase::Submitting
    }

    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match &self.request {
            Request::Create { .. } => "create",
            Request::Update { .. } => "update",
            Request::Delete { .. } => "delete",
            Request::Bulk { .. } => "bulk",
        }
    }

    /// Perform the remote call(s).
    #[instrument(skip_all, fields(entity = R::LABEL, ticket = self.ticket, op = self.operation()))]
    pub async fn dispatch<S>(self, service: &S) -> Completion<R>
    where
        S: RemoteService<R> + ?Sized,
    {
        let resolved = match &self.request {
            Request::Create {
                scope,
                draft,
                provisional,
            } => Resolved::Created {
                provisional: provisional.clone(),
                result: self.guard("create", service.create(scope, draft)).await,
            },
            Request::Update { id, patch } => Resolved::Updated {
                id: id.clone(),
                result: self.guard("update", service.update(id, patch)).await,
            },
            Request::Delete { id, name } => Resolved::Deleted {
                id: id.clone(),
                name: name.clone(),
                result: self.guard("delete", service.delete(id)).await,
            },
            Request::Bulk { ids, op } => Resolved::Batch {
                op: op.clone(),
                report: self.run_batch(service, ids, op).await,
            },
        };

        Completion {
            ticket: self.ticket,
            epoch: self.epoch,
            undo: self.undo,
            resolved,
        }
    }

    async fn guard<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = RemoteResult<T>>,
    ) -> ListResult<T> {
        guarded(operation, self.timeout, &self.cancel, call).await
    }

    /// Per-id calls drained as they finish, bounded as a whole by
    /// `bulk_timeout`. Calls still running at the deadline count as failed;
    /// results that arrived earlier are kept.
    async fn run_batch<S>(&self, service: &S, ids: &[R::Id], op: &BulkOp<R>) -> BatchReport<R>
    where
        S: RemoteService<R> + ?Sized,
    {
        let mut calls: FuturesUnordered<_> = ids
            .iter()
            .map(|id| async move {
                let result = match op {
                    BulkOp::Delete => self.guard("delete", service.delete(id)).await.map(|()| None),
                    BulkOp::Patch(patch) => {
                        self.guard("update", service.update(id, patch)).await.map(Some)
                    }
                };
                (id, result)
            })
            .collect();

        let deadline = Instant::now() + self.bulk_timeout;
        let mut finished: HashSet<&R::Id> = HashSet::default();
        let mut report = BatchReport::default();
        loop {
            match tokio::time::timeout_at(deadline, calls.next()).await {
                Ok(Some((id, result))) => {
                    finished.insert(id);
                    match result {
                        Ok(record) => report.succeeded.push((id.clone(), record)),
                        Err(err) => report.failed.push((id.clone(), describe(&err))),
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    let reason = timeout_error("bulk", self.bulk_timeout).to_compact_string();
                    let unfinished: Vec<_> =
                        ids.iter().filter(|id| !finished.contains(id)).collect();
                    warn!(
                        finished = finished.len(),
                        unfinished = unfinished.len(),
                        "bulk batch timed out"
                    );
                    report
                        .failed
                        .extend(unfinished.into_iter().map(|id| (id.clone(), reason.clone())));
                    break;
                }
            }
        }
        debug!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "bulk batch drained"
        );
        report
    }
}

/// Await `call` unless `cancel` fires or `timeout` elapses first.
pub(crate) async fn guarded<T>(
    operation: &'static str,
    timeout: Duration,
    cancel: &CancellationToken,
    call: impl Future<Output = RemoteResult<T>>,
) -> ListResult<T> {
    tokio::select! {
        biased;

        () = cancel.cancelled() => Err(ListError::Cancelled),

        result = tokio::time::timeout(timeout, call) => match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ListError::from_remote(operation, &err)),
            Err(_) => Err(timeout_error(operation, timeout)),
        },
    }
}

fn timeout_error(operation: &str, timeout: Duration) -> ListError {
    ListError::Timeout {
        operation: operation.into(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

/// Notification description for a failure: the server's reason when there
/// is one.
pub(crate) fn describe(err: &ListError) -> CompactString {
    match err {
        ListError::Remote { reason, .. } => reason.clone(),
        other => other.to_compact_string(),
    }
}

fn capitalize(word: &str) -> CompactString {
    let mut chars = word.chars();
    chars.next().map_or_else(CompactString::default, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

const fn noun<R: Record>(count: usize) -> &'static str {
    if count == 1 { R::LABEL } else { R::LABEL_PLURAL }
}

impl<R, S, N> ListController<R, S, N>
where
    R: Record,
    S: RemoteService<R>,
    N: NotificationSink,
{
    /// Validate `intent` and, in optimistic mode, apply it locally.
    ///
    /// Rejected intents emit exactly one error notification and change no
    /// state. Intents on ids missing from the store are skipped.
    pub fn begin(&mut self, intent: MutationIntent<R>) -> Submission<R> {
        let operation = intent.operation();
        trace!(entity = R::LABEL, operation, phase = ?MutationPhase::Validating, "validating");

        match self.prepare(intent) {
            Ok(Some(pending)) => {
                debug!(
                    entity = R::LABEL,
                    operation,
                    ticket = pending.ticket,
                    mode = ?self.mode,
                    phase = ?MutationPhase::Submitting,
                    "mutation submitted"
                );
                self.in_flight.insert(pending.ticket);
                self.refresh();
                Submission::InFlight(pending)
            }
            Ok(None) => Submission::Settled(MutationOutcome::Skipped),
            Err(err) => {
                warn!(entity = R::LABEL, operation, error = %err, "mutation rejected");
                let title = match err {
                    ListError::EmptySelection => format_compact!("No {} selected", R::LABEL_PLURAL),
                    _ => err.title().into(),
                };
                self.sink.notify_error(&title, Some(&err.to_string()));
                Submission::Settled(MutationOutcome::Rejected(err))
            }
        }
    }

    fn prepare(&mut self, intent: MutationIntent<R>) -> ListResult<Option<PendingMutation<R>>> {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let optimistic = self.mode == MutationMode::Optimistic;
        let mut undo = UndoLog::<R>::new();

        let request = match intent {
            MutationIntent::Create(draft) => {
                let scope = self
                    .scope
                    .clone()
                    .filter(|scope| !R::SCOPED || !scope.is_global())
                    .ok_or(ListError::MissingScope)?;
                draft.validate()?;

                let provisional = if optimistic {
                    let id = R::Id::generate();
                    self.store
                        .insert(R::from_draft(id.clone(), &scope, draft.clone()))?;
                    self.last_write.insert(id.clone(), ticket);
                    undo.push((id.clone(), Undo::Remove));
                    Some(id)
                } else {
                    None
                };
                Request::Create {
                    scope,
                    draft,
                    provisional,
                }
            }

            MutationIntent::Update(id, patch) => {
                patch.validate()?;
                if !self.store.contains(&id) {
                    warn!(entity = R::LABEL, id = %id, "update of unknown id skipped");
                    return Ok(None);
                }
                if optimistic {
                    let previous = self.store.patch(&id, &patch)?;
                    self.last_write.insert(id.clone(), ticket);
                    undo.push((id.clone(), Undo::Restore(previous)));
                }
                Request::Update { id, patch }
            }

            MutationIntent::Delete(id) => {
                let Some(record) = self.store.get(&id) else {
                    warn!(entity = R::LABEL, id = %id, "delete of unknown id skipped");
                    return Ok(None);
                };
                let name = record.display_name().to_compact_string();
                if optimistic && let Some((index, removed)) = self.store.remove(&id) {
                    self.selection.remove(&id);
                    undo.push((id.clone(), Undo::Reinsert(index, removed)));
                }
                Request::Delete { id, name }
            }

            MutationIntent::BulkAction(ids, op) => {
                if ids.is_empty() {
                    return Err(ListError::EmptySelection);
                }
                if let BulkOp::Patch(patch) = &op {
                    patch.validate()?;
                }

                let unique: IndexSet<R::Id, ahash::RandomState> = ids.into_iter().collect();
                let (present, missing): (Vec<_>, Vec<_>) =
                    unique.into_iter().partition(|id| self.store.contains(id));
                if !missing.is_empty() {
                    warn!(entity = R::LABEL, missing = missing.len(), "bulk ids absent from store");
                }
                if present.is_empty() {
                    return Ok(None);
                }

                if optimistic {
                    for id in &present {
                        let step = match &op {
                            BulkOp::Delete => self.store.remove(id).map(|(index, removed)| {
                                self.selection.remove(id);
                                Undo::Reinsert(index, removed)
                            }),
                            BulkOp::Patch(patch) => {
                                self.last_write.insert(id.clone(), ticket);
                                self.store.patch(id, patch).ok().map(Undo::Restore)
                            }
                        };
                        if let Some(step) = step {
                            undo.push((id.clone(), step));
                        }
                    }
                }
                Request::Bulk { ids: present, op }
            }
        };

        Ok(Some(PendingMutation {
            ticket,
            epoch: self.epoch,
            request,
            undo,
            cancel: self.cancel.child_token(),
            timeout: self.remote.timeout,
            bulk_timeout: self.remote.bulk_timeout,
        }))
    }

    /// Reconcile a finished remote call with the store.
    ///
    /// Safe under any completion order: updates and deletes of ids that are
    /// gone are no-ops, and optimistic rollbacks never undo a newer write.
    pub fn settle(&mut self, completion: Completion<R>) -> MutationOutcome<R> {
        let Completion {
            ticket,
            epoch,
            undo,
            resolved,
        } = completion;

        if epoch != self.epoch {
            debug!(entity = R::LABEL, ticket, "stale completion discarded");
            return MutationOutcome::Discarded;
        }
        self.in_flight.remove(&ticket);

        let outcome = match resolved {
            Resolved::Created {
                provisional,
                result,
            } => self.settle_created(ticket, provisional, result, undo),
            Resolved::Updated { id, result } => self.settle_updated(ticket, id, result, undo),
            Resolved::Deleted { id, name, result } => {
                self.settle_deleted(ticket, id, &name, result, undo)
            }
            Resolved::Batch { op, report } => self.settle_batch(ticket, &op, report, undo),
        };

        self.refresh();
        outcome
    }

    /// `begin`, `dispatch` and `settle` in one step.
    pub async fn execute(&mut self, intent: MutationIntent<R>) -> MutationOutcome<R> {
        match self.begin(intent) {
            Submission::Settled(outcome) => outcome,
            Submission::InFlight(pending) => {
                let completion = pending.dispatch(&self.service).await;
                self.settle(completion)
            }
        }
    }

    pub async fn create(&mut self, draft: R::Draft) -> MutationOutcome<R> {
        self.execute(MutationIntent::Create(draft)).await
    }

    pub async fn update(&mut self, id: R::Id, patch: R::Patch) -> MutationOutcome<R> {
        self.execute(MutationIntent::Update(id, patch)).await
    }

    pub async fn delete(&mut self, id: R::Id) -> MutationOutcome<R> {
        self.execute(MutationIntent::Delete(id)).await
    }

    /// Apply `op` to every selected record.
    pub async fn bulk_selected(&mut self, op: BulkOp<R>) -> MutationOutcome<R> {
        let ids = self.selection.to_vec();
        self.execute(MutationIntent::BulkAction(ids, op)).await
    }

    fn settle_created(
        &mut self,
        ticket: u64,
        provisional: Option<R::Id>,
        result: ListResult<R>,
        undo: UndoLog<R>,
    ) -> MutationOutcome<R> {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                self.rollback(ticket, undo, None);
                return self.fail("add", err);
            }
        };

        let id = record.id().clone();
        let name = record.display_name().to_compact_string();
        let stored = match provisional {
            Some(provisional) if self.store.contains(&provisional) => {
                self.selection.remove(&provisional);
                self.last_write.remove(&provisional);
                self.store.replace(&provisional, record)
            }
            _ => self.store.insert(record),
        };
        if let Err(err) = stored {
            warn!(entity = R::LABEL, id = %id, error = %err, "created record not reconciled");
        }
        self.last_write.insert(id.clone(), ticket);

        info!(entity = R::LABEL, id = %id, "record created");
        self.sink
            .notify_success(&format!("{} added", capitalize(R::LABEL)), Some(&name));
        MutationOutcome::Succeeded(id)
    }

    fn settle_updated(
        &mut self,
        ticket: u64,
        id: R::Id,
        result: ListResult<R>,
        undo: UndoLog<R>,
    ) -> MutationOutcome<R> {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                self.rollback(ticket, undo, None);
                return self.fail("update", err);
            }
        };

        if !self.store.contains(&id) {
            warn!(entity = R::LABEL, id = %id, "updated record no longer in store");
            return MutationOutcome::Skipped;
        }

        let name = record.display_name().to_compact_string();
        if let Err(err) = self.store.replace(&id, record) {
            warn!(entity = R::LABEL, id = %id, error = %err, "updated record not reconciled");
        }
        self.last_write.insert(id.clone(), ticket);

        info!(entity = R::LABEL, id = %id, "record updated");
        self.sink
            .notify_success(&format!("{} updated", capitalize(R::LABEL)), Some(&name));
        MutationOutcome::Succeeded(id)
    }

    fn settle_deleted(
        &mut self,
        ticket: u64,
        id: R::Id,
        name: &str,
        result: ListResult<()>,
        undo: UndoLog<R>,
    ) -> MutationOutcome<R> {
        if let Err(err) = result {
            self.rollback(ticket, undo, None);
            return self.fail("delete", err);
        }

        // Store and selection change in the same update
        self.store.remove(&id);
        self.selection.remove(&id);
        self.last_write.remove(&id);

        info!(entity = R::LABEL, id = %id, "record deleted");
        self.sink
            .notify_success(&format!("{} deleted", capitalize(R::LABEL)), Some(name));
        MutationOutcome::Succeeded(id)
    }

    fn settle_batch(
        &mut self,
        ticket: u64,
        op: &BulkOp<R>,
        report: BatchReport<R>,
        undo: UndoLog<R>,
    ) -> MutationOutcome<R> {
        for (id, record) in &report.succeeded {
            match op {
                BulkOp::Delete => {
                    self.store.remove(id);
                    self.last_write.remove(id);
                }
                BulkOp::Patch(_) => {
                    if let Some(record) = record
                        && self.store.contains(id)
                        && self.store.replace(id, record.clone()).is_ok()
                    {
                        self.last_write.insert(id.clone(), ticket);
                    }
                }
            }
        }

        if !report.failed.is_empty() {
            let failed: HashSet<&R::Id> = report.failed_ids().collect();
            self.rollback(ticket, undo, Some(&failed));
        }
        self.selection.clear();

        let total = report.total();
        let ok = report.succeeded.len();
        let first_reason = report.failed.first().map(|(_, reason)| reason.as_str());
        if report.is_complete_success() {
            info!(entity = R::LABEL, count = ok, op = op.verb(), "bulk action succeeded");
            self.sink.notify_success(
                &format!("{ok} {} {}", noun::<R>(ok), op.past_tense()),
                None,
            );
        } else if ok > 0 {
            warn!(entity = R::LABEL, ok, total, op = op.verb(), "bulk action partially failed");
            let failed = total - ok;
            let description = format!("{failed} failed: {}", first_reason.unwrap_or_default());
            self.sink.notify_warning(
                &format!("{ok} of {total} {} {}", noun::<R>(total), op.past_tense()),
                Some(&description),
            );
        } else {
            warn!(entity = R::LABEL, total, op = op.verb(), "bulk action failed");
            self.sink.notify_error(
                &format!("Failed to {} {total} {}", op.verb(), noun::<R>(total)),
                first_reason,
            );
        }
        MutationOutcome::Batch(report)
    }

    /// Undo optimistic steps, newest first. With `only`, just the listed ids.
    fn rollback(
        &mut self,
        ticket: u64,
        undo: UndoLog<R>,
        only: Option<&HashSet<&R::Id>>,
    ) {
        for (id, step) in undo.into_iter().rev() {
            if only.is_some_and(|ids| !ids.contains(&id)) {
                continue;
            }
            let restored = match step {
                Undo::Remove => {
                    self.selection.remove(&id);
                    self.last_write.remove(&id);
                    self.store
                        .remove(&id)
                        .map(|_| ())
                        .ok_or_else(|| ListError::not_found(&id))
                }
                Undo::Restore(previous) => {
                    // A newer write owns this record now
                    if self.last_write.get(&id).is_some_and(|last| *last != ticket) {
                        debug!(entity = R::LABEL, id = %id, "rollback superseded");
                        continue;
                    }
                    self.store.replace(&id, previous)
                }
                Undo::Reinsert(index, record) => self.store.insert_at(index, record),
            };
            match restored {
                Ok(()) => debug!(entity = R::LABEL, id = %id, "rolled back"),
                Err(err) => warn!(entity = R::LABEL, id = %id, error = %err, "rollback skipped"),
            }
        }
    }

    fn fail(&self, verb: &str, err: ListError) -> MutationOutcome<R> {
        warn!(entity = R::LABEL, error = %err, "mutation failed");
        self.sink.notify_error(
            &format!("Failed to {verb} {}", R::LABEL),
            Some(&describe(&err)),
        );
        MutationOutcome::Failed(err)
    }
}
