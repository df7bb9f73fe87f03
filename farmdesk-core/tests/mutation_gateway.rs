//! Mutation gateway behavior under failures, rollbacks and completions that
//! arrive out of order or after their context went away.

mod common;

use std::time::Duration;

use common::{sample_id, screen, screen_with};
use farmdesk_core::{
    config::Config,
    controller::{
        BulkOp, Completion, ListController, MutationIntent, MutationMode, MutationOutcome,
        PendingMutation, Submission,
    },
    domain::{
        expense::{Expense, ExpenseCategory, ExpenseDraft},
        farmer::{Farmer, FarmerDraft, FarmerPatch, FarmerRole, FarmerStatus},
        plot::{Plot, PlotDraft, PlotStatus, SoilType},
    },
    error::ListError,
    model::notification::{NotificationCenter, NotificationLevel},
    service::{InMemoryService, Scope},
};
use futures::stream::{FuturesUnordered, StreamExt};

fn in_flight(submission: Submission<Farmer>) -> PendingMutation<Farmer> {
    match submission {
        Submission::InFlight(pending) => pending,
        Submission::Settled(outcome) => panic!("expected a remote call, got {outcome:?}"),
    }
}

fn set_status(id: uuid::Uuid, status: FarmerStatus) -> MutationIntent<Farmer> {
    MutationIntent::Update(id, FarmerPatch::status(status))
}

#[tokio::test]
async fn validation_failures_never_reach_the_service() {
    let mut s = screen(MutationMode::Optimistic).await;
    let before = s.list.get(&sample_id(0)).cloned();

    let bad_email = FarmerPatch {
        email: Some("not-an-email".into()),
        ..FarmerPatch::default()
    };
    let outcome = s.list.update(sample_id(0), bad_email).await;
    assert!(matches!(outcome, MutationOutcome::Rejected(ListError::Validation { .. })));

    let bad_phone =
        FarmerDraft::new("Ana Lopez", "ana@farmdesk.io", FarmerRole::Farmer).with_phone("x");
    assert!(s.list.create(bad_phone).await.error().is_some_and(ListError::is_validation));

    assert_eq!(s.list.get(&sample_id(0)).cloned(), before);
    assert_eq!(s.list.store().len(), 5);
    assert_eq!(s.list.in_flight(), 0);
    assert_eq!(s.service.calls().await, ["list"]);
    assert_eq!(s.toasts().len(), 2);
}

#[tokio::test]
async fn create_without_scope_is_rejected() {
    let service = InMemoryService::<Farmer>::new();
    let center = NotificationCenter::default();
    let mut list: ListController<Farmer, _, _> =
        ListController::new(service, center.clone(), &Config::default());

    let outcome = list
        .create(FarmerDraft::new("Ana Lopez", "ana@farmdesk.io", FarmerRole::Farmer))
        .await;
    assert!(matches!(outcome, MutationOutcome::Rejected(ListError::MissingScope)));
    assert_eq!(center.len(), 1);
    assert!(list.service().calls().await.is_empty());
}

fn north_field() -> PlotDraft {
    PlotDraft {
        name: "North Field".into(),
        crop: Some("Rice".into()),
        area_ha: 2.5,
        soil: SoilType::Loam,
        status: PlotStatus::Planted,
    }
}

#[tokio::test]
async fn seasonal_create_needs_a_named_season() {
    let center = NotificationCenter::default();
    let mut plots: ListController<Plot, _, _> =
        ListController::new(InMemoryService::<Plot>::new(), center.clone(), &Config::default());
    plots.load(Scope::global()).await.expect("global load");

    let outcome = plots.create(north_field()).await;
    assert!(matches!(outcome, MutationOutcome::Rejected(ListError::MissingScope)));
    assert!(plots.store().is_empty());
    assert_eq!(plots.service().calls().await, ["list"]);
    assert_eq!(center.drain()[0].title, "Validation error");

    plots.load(Scope::named("2025-wet")).await.expect("season load");
    let MutationOutcome::Succeeded(id) = plots.create(north_field()).await else {
        panic!("create under a season should succeed");
    };
    assert_eq!(plots.get(&id).map(|plot| plot.season.as_str()), Some("2025-wet"));
}

#[tokio::test]
async fn optimistic_seasonal_create_leaves_no_provisional_row() {
    let mut expenses: ListController<Expense, _, _> = ListController::new(
        InMemoryService::<Expense>::new(),
        NotificationCenter::default(),
        &Config::default(),
    )
    .with_mode(MutationMode::Optimistic);
    expenses.load(Scope::global()).await.expect("global load");

    let draft = ExpenseDraft {
        description: "Urea, 10 bags".into(),
        category: ExpenseCategory::Fertilizer,
        amount: 4_200.0,
        date: chrono::NaiveDate::from_ymd_opt(2025, 6, 3).expect("valid date"),
        plot: None,
    };
    let outcome = expenses.create(draft).await;
    assert!(matches!(outcome, MutationOutcome::Rejected(ListError::MissingScope)));
    assert!(expenses.store().is_empty());
    assert_eq!(expenses.in_flight(), 0);
}

#[tokio::test]
async fn unknown_ids_are_skipped_silently() {
    let mut s = screen(MutationMode::Confirmed).await;
    let ghost = uuid::Uuid::new_v4();

    assert!(matches!(s.list.delete(ghost).await, MutationOutcome::Skipped));
    assert!(matches!(
        s.list.update(ghost, FarmerPatch::status(FarmerStatus::Inactive)).await,
        MutationOutcome::Skipped
    ));
    assert!(s.toasts().is_empty());
    assert_eq!(s.service.calls().await, ["list"]);
}

#[tokio::test]
async fn confirmed_update_waits_for_the_server() {
    let mut s = screen(MutationMode::Confirmed).await;
    let id = sample_id(1);

    let pending = in_flight(s.list.begin(set_status(id, FarmerStatus::Inactive)));
    assert_eq!(s.list.get(&id).map(|f| f.status), Some(FarmerStatus::Active));
    assert_eq!(s.list.in_flight(), 1);

    let completion = pending.dispatch(&s.service).await;
    assert!(s.list.settle(completion).is_success());
    assert_eq!(s.list.get(&id).map(|f| f.status), Some(FarmerStatus::Inactive));
    assert_eq!(s.list.in_flight(), 0);
}

#[tokio::test]
async fn confirmed_failure_leaves_the_store_alone() {
    let mut s = screen(MutationMode::Confirmed).await;
    let id = sample_id(1);
    s.service.fail_on(id).await;

    let outcome = s.list.delete(id).await;
    assert!(matches!(outcome, MutationOutcome::Failed(ListError::Remote { .. })));
    assert!(s.list.get(&id).is_some());

    let toasts = s.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Failed to delete farmer");
    assert_eq!(
        toasts[0].description.as_deref(),
        Some(format!("farmer {id} rejected by server").as_str())
    );
}

#[tokio::test]
async fn optimistic_update_rolls_back_on_failure() {
    let mut s = screen(MutationMode::Optimistic).await;
    let id = sample_id(1);
    s.service.fail_next("database is read-only").await;

    let pending = in_flight(s.list.begin(set_status(id, FarmerStatus::Inactive)));
    assert_eq!(s.list.get(&id).map(|f| f.status), Some(FarmerStatus::Inactive));

    let completion = pending.dispatch(&s.service).await;
    let outcome = s.list.settle(completion);
    assert!(matches!(outcome, MutationOutcome::Failed(_)));
    assert_eq!(s.list.get(&id).map(|f| f.status), Some(FarmerStatus::Active));

    let toasts = s.toasts();
    assert_eq!(toasts[0].title, "Failed to update farmer");
    assert_eq!(toasts[0].description.as_deref(), Some("database is read-only"));
}

#[tokio::test]
async fn optimistic_delete_reinserts_at_the_same_position() {
    let mut s = screen(MutationMode::Optimistic).await;
    let id = sample_id(2);
    s.list.toggle_select(id);
    s.service.fail_on(id).await;

    let pending = in_flight(s.list.begin(MutationIntent::Delete(id)));
    assert!(s.list.get(&id).is_none());
    assert!(!s.list.selection().contains(&id));

    let completion = pending.dispatch(&s.service).await;
    assert!(!s.list.settle(completion).is_success());
    assert_eq!(s.list.store().position(&id), Some(2));
    // Selection is not restored
    assert!(s.list.selection().is_empty());
}

#[tokio::test]
async fn optimistic_create_swaps_in_the_server_id() {
    let mut s = screen(MutationMode::Optimistic).await;
    let draft = FarmerDraft::new("Ana Lopez", "ana@farmdesk.io", FarmerRole::Farmer);

    let pending = in_flight(s.list.begin(MutationIntent::Create(draft.clone())));
    assert_eq!(s.list.store().len(), 6);
    let provisional = *s.list.store().ids().last().expect("provisional row");

    let completion = pending.dispatch(&s.service).await;
    let outcome = s.list.settle(completion);
    let id = *outcome.id().expect("created");
    assert_ne!(id, provisional);
    assert_eq!(s.list.store().len(), 6);
    assert_eq!(s.list.store().position(&id), Some(5));
    assert!(s.list.get(&provisional).is_none());
    assert!(s.service.get(&id).await.is_some());

    s.service.fail_next("quota exceeded").await;
    assert!(!s.list.create(draft).await.is_success());
    assert_eq!(s.list.store().len(), 6);
}

#[tokio::test]
async fn delete_settled_before_an_earlier_update() {
    let mut s = screen(MutationMode::Confirmed).await;
    let id = sample_id(3);

    let update = in_flight(s.list.begin(set_status(id, FarmerStatus::Active)));
    let delete = in_flight(s.list.begin(MutationIntent::Delete(id)));

    // The server saw the update first, but the delete resolves first here
    let update_done = update.dispatch(&s.service).await;
    let delete_done = delete.dispatch(&s.service).await;

    assert!(s.list.settle(delete_done).is_success());
    assert!(matches!(s.list.settle(update_done), MutationOutcome::Skipped));
    assert!(s.list.get(&id).is_none());
    assert_eq!(s.list.in_flight(), 0);
}

#[tokio::test]
async fn completions_apply_in_arrival_order() {
    let mut s = screen(MutationMode::Confirmed).await;
    let (sarah, mike) = (sample_id(1), sample_id(2));
    s.service.delay_on(sarah, Duration::from_millis(80)).await;

    let first = in_flight(s.list.begin(set_status(sarah, FarmerStatus::Inactive)));
    let second = in_flight(s.list.begin(set_status(mike, FarmerStatus::Active)));
    let issued = [first.ticket(), second.ticket()];

    let mut calls: FuturesUnordered<_> = [first, second]
        .into_iter()
        .map(|pending| pending.dispatch(&*s.service))
        .collect();
    let mut arrived: Vec<Completion<Farmer>> = Vec::new();
    while let Some(completion) = calls.next().await {
        arrived.push(completion);
    }
    drop(calls);

    let order: Vec<_> = arrived.iter().map(Completion::ticket).collect();
    assert_eq!(order, [issued[1], issued[0]]);

    for completion in arrived {
        assert!(s.list.settle(completion).is_success());
    }
    assert_eq!(s.list.get(&sarah).map(|f| f.status), Some(FarmerStatus::Inactive));
    assert_eq!(s.list.get(&mike).map(|f| f.status), Some(FarmerStatus::Active));
}

#[tokio::test]
async fn stale_rollback_never_undoes_a_newer_write() {
    for failed_first in [true, false] {
        let mut s = screen(MutationMode::Optimistic).await;
        let id = sample_id(0);

        let deactivate = in_flight(s.list.begin(set_status(id, FarmerStatus::Inactive)));
        let more_plots = FarmerPatch {
            plots: Some(9),
            ..FarmerPatch::default()
        };
        let grow = in_flight(s.list.begin(MutationIntent::Update(id, more_plots)));

        s.service.fail_next("conflict").await;
        let failed = deactivate.dispatch(&s.service).await;
        let succeeded = grow.dispatch(&s.service).await;

        if failed_first {
            s.list.settle(failed);
            s.list.settle(succeeded);
        } else {
            s.list.settle(succeeded);
            s.list.settle(failed);
        }

        // Both orders converge on what the server holds
        let stored = s.list.get(&id).cloned();
        assert_eq!(stored, s.service.get(&id).await);
        assert_eq!(stored.map(|f| (f.status, f.plots)), Some((FarmerStatus::Active, 9)));
    }
}

#[tokio::test]
async fn reload_discards_older_completions() {
    let mut s = screen(MutationMode::Optimistic).await;
    let id = sample_id(4);

    let pending = in_flight(s.list.begin(set_status(id, FarmerStatus::Pending)));
    s.list.load(Scope::global()).await.expect("reloaded");
    s.toasts();

    let completion = pending.dispatch(&s.service).await;
    assert!(matches!(s.list.settle(completion), MutationOutcome::Discarded));
    assert_eq!(s.list.get(&id).map(|f| f.status), Some(FarmerStatus::Active));
    assert!(s.toasts().is_empty());
}

#[tokio::test]
async fn detach_cancels_pending_calls() {
    let mut s = screen(MutationMode::Confirmed).await;
    let id = sample_id(4);

    let pending = in_flight(s.list.begin(MutationIntent::Delete(id)));
    s.list.detach();
    assert_eq!(s.list.in_flight(), 0);

    let completion = pending.dispatch(&s.service).await;
    assert!(matches!(s.list.settle(completion), MutationOutcome::Discarded));
    assert!(s.service.get(&id).await.is_some());
    assert_eq!(s.service.calls().await, ["list"]);
}

#[tokio::test]
async fn bulk_delete_reports_partial_failure() {
    let mut s = screen(MutationMode::Confirmed).await;
    let locked = sample_id(1);
    s.service.fail_on(locked).await;
    s.list.toggle_select_all();

    let MutationOutcome::Batch(report) = s.list.bulk_selected(BulkOp::Delete).await else {
        panic!("expected a batch report");
    };
    assert_eq!(report.succeeded.len(), 4);
    assert_eq!(report.failed_ids().collect::<Vec<_>>(), [&locked]);

    assert_eq!(s.list.store().ids().copied().collect::<Vec<_>>(), [locked]);
    assert!(s.list.selection().is_empty());

    let toasts = s.toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, NotificationLevel::Warning);
    assert_eq!(toasts[0].title, "4 of 5 farmers deleted");
    assert_eq!(
        toasts[0].description.as_deref(),
        Some(format!("1 failed: farmer {locked} rejected by server").as_str())
    );
}

#[tokio::test]
async fn optimistic_bulk_patch_restores_only_failed_rows() {
    let mut s = screen(MutationMode::Optimistic).await;
    let locked = sample_id(4);
    s.service.fail_on(locked).await;
    let ids = vec![sample_id(0), sample_id(1), locked];

    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(
            ids,
            BulkOp::Patch(FarmerPatch::status(FarmerStatus::Inactive)),
        ))
        .await;
    assert!(!outcome.is_success());

    let status = |index| s.list.get(&sample_id(index)).map(|f| f.status);
    assert_eq!(status(0), Some(FarmerStatus::Inactive));
    assert_eq!(status(1), Some(FarmerStatus::Inactive));
    assert_eq!(status(4), Some(FarmerStatus::Active));
    assert_eq!(s.toasts()[0].title, "2 of 3 farmers updated");
}

#[tokio::test]
async fn bulk_summaries_cover_success_and_total_failure() {
    let mut s = screen(MutationMode::Confirmed).await;
    let ids = vec![sample_id(0), sample_id(0), sample_id(2)];

    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(
            ids,
            BulkOp::Patch(FarmerPatch::status(FarmerStatus::Active)),
        ))
        .await;
    assert!(outcome.is_success());
    let toast = s.toasts().pop().expect("summary");
    assert_eq!(toast.level, NotificationLevel::Success);
    assert_eq!(toast.title, "2 farmers updated");

    s.service.fail_on(sample_id(3)).await;
    s.service.fail_on(sample_id(4)).await;
    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(vec![sample_id(3), sample_id(4)], BulkOp::Delete))
        .await;
    assert!(!outcome.is_success());
    let toast = s.toasts().pop().expect("summary");
    assert_eq!(toast.level, NotificationLevel::Error);
    assert_eq!(toast.title, "Failed to delete 2 farmers");
    assert_eq!(s.list.store().len(), 5);
}

#[tokio::test]
async fn bulk_timeout_fails_only_unfinished_calls() {
    let mut config = Config::default();
    config.remote.bulk_timeout = Duration::from_millis(30);
    let mut s = screen_with(Farmer::sample(), MutationMode::Confirmed, &config).await;
    let (slow, quick) = (sample_id(0), sample_id(1));
    s.service.delay_on(slow, Duration::from_secs(5)).await;

    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(vec![slow, quick], BulkOp::Delete))
        .await;
    let MutationOutcome::Batch(report) = outcome else {
        panic!("expected a batch report");
    };
    assert_eq!(report.succeeded_ids().collect::<Vec<_>>(), [&quick]);
    assert_eq!(report.failed_ids().collect::<Vec<_>>(), [&slow]);

    // Local store agrees with the server
    assert!(s.service.get(&quick).await.is_none());
    assert!(s.list.get(&quick).is_none());
    assert!(s.service.get(&slow).await.is_some());
    assert!(s.list.get(&slow).is_some());
    assert_eq!(s.list.store().len(), 4);

    let toasts = s.toasts();
    assert_eq!(toasts[0].level, NotificationLevel::Warning);
    assert_eq!(toasts[0].title, "1 of 2 farmers deleted");
    assert_eq!(
        toasts[0].description.as_deref(),
        Some("1 failed: bulk timed out after 30 ms")
    );
}

#[tokio::test]
async fn optimistic_bulk_timeout_restores_only_unfinished_rows() {
    let mut config = Config::default();
    config.remote.bulk_timeout = Duration::from_millis(30);
    let mut s = screen_with(Farmer::sample(), MutationMode::Optimistic, &config).await;
    let (slow, quick) = (sample_id(0), sample_id(1));
    s.service.delay_on(slow, Duration::from_secs(5)).await;

    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(vec![slow, quick], BulkOp::Delete))
        .await;
    assert!(!outcome.is_success());

    assert_eq!(s.list.store().position(&slow), Some(0));
    assert!(s.list.get(&quick).is_none());
    assert!(s.service.get(&quick).await.is_none());
    assert_eq!(s.list.store().len(), 4);
}

#[tokio::test]
async fn bulk_timeout_with_nothing_finished_fails_the_batch() {
    let mut config = Config::default();
    config.remote.bulk_timeout = Duration::from_millis(30);
    let mut s = screen_with(Farmer::sample(), MutationMode::Optimistic, &config).await;
    for index in [0, 1] {
        s.service.delay_on(sample_id(index), Duration::from_secs(5)).await;
    }

    let outcome = s
        .list
        .execute(MutationIntent::BulkAction(vec![sample_id(0), sample_id(1)], BulkOp::Delete))
        .await;
    let MutationOutcome::Batch(report) = outcome else {
        panic!("expected a batch report");
    };
    assert_eq!(report.failed.len(), 2);
    assert_eq!(s.list.store().len(), 5);
    assert_eq!(s.toasts()[0].title, "Failed to delete 2 farmers");
}
