//! src/controller/actions.rs
//! ============================================================================
//! # Actions: every list command in one enum
//!
//! `ListAction` is what a list screen emits in response to user input.
//! `ListController::handle` applies one action and reports what changed, so
//! the presentation layer only has to map input events to actions.

use compact_str::CompactString;
use tracing::trace;

use crate::{
    controller::{
        gateway::{BulkOp, MutationIntent, MutationOutcome},
        list_controller::ListController,
    },
    error::ListResult,
    model::{
        filter::CategoryFilter, notification::NotificationSink, pagination::PageSize,
        record::Record,
    },
    service::remote::{RemoteService, Scope},
};

#[derive(Debug, Clone)]
pub enum ListAction<R: Record> {
    /// Free-text search box.
    Search(CompactString),

    /// Categorical dropdown; `CategoryFilter::All` clears it.
    Filter(R::Key, CategoryFilter),

    ClearFilters,

    /// Column header click.
    Sort(R::Key),

    ClearSort,

    GoToPage(usize),

    NextPage,

    PreviousPage,

    FirstPage,

    LastPage,

    SetPageSize(PageSize),

    ToggleSelect(R::Id),

    ToggleSelectAll,

    ClearSelection,

    /// Scope selector changed (e.g. another season).
    ChangeScope(Scope),

    Reload,

    Create(R::Draft),

    Update(R::Id, R::Patch),

    Delete(R::Id),

    /// Apply an action to every selected record.
    BulkSelected(BulkOp<R>),

    /// Screen closed.
    Detach,

    /// No operation. Used when input is consumed but no state change is
    /// needed.
    NoOp,
}

impl<R: Record> ListAction<R> {
    /// Actions that go through the mutation gateway.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Create(_) | Self::Update(..) | Self::Delete(_) | Self::BulkSelected(_)
        )
    }
}

/// What handling an action changed.
#[derive(Debug)]
pub enum ActionResult<R: Record> {
    /// Nothing to redraw.
    Unchanged,

    /// List state changed; redraw the view.
    Redraw,

    /// Store fetched; carries the record count.
    Loaded(usize),

    Mutated(MutationOutcome<R>),
}

impl<R, S, N> ListController<R, S, N>
where
    R: Record,
    S: RemoteService<R>,
    N: NotificationSink,
{
    /// Apply one action.
    ///
    /// # Errors
    /// Navigation to a page that doesn't exist and failed loads. Mutation
    /// failures are reported through `ActionResult::Mutated` and the sink.
    pub async fn handle(&mut self, action: ListAction<R>) -> ListResult<ActionResult<R>> {
        trace!(entity = R::LABEL, ?action, "handling action");

        let redraw = |changed: bool| {
            if changed {
                ActionResult::Redraw
            } else {
                ActionResult::Unchanged
            }
        };

        let result = match action {
            ListAction::Search(query) => redraw(self.set_search(&query)),
            ListAction::Filter(key, value) => redraw(self.set_category(key, value)),
            ListAction::ClearFilters => redraw(self.clear_filters()),
            ListAction::Sort(key) => {
                self.toggle_sort(key);
                ActionResult::Redraw
            }
            ListAction::ClearSort => {
                self.clear_sort();
                ActionResult::Redraw
            }
            ListAction::GoToPage(page) => {
                self.go_to_page(page)?;
                ActionResult::Redraw
            }
            ListAction::NextPage => redraw(self.next_page()),
            ListAction::PreviousPage => redraw(self.previous_page()),
            ListAction::FirstPage => {
                self.first_page();
                ActionResult::Redraw
            }
            ListAction::LastPage => {
                self.last_page();
                ActionResult::Redraw
            }
            ListAction::SetPageSize(size) => {
                self.set_page_size(size);
                ActionResult::Redraw
            }
            ListAction::ToggleSelect(id) => {
                let visible = self.visible_ids().contains(&id);
                self.toggle_select(id);
                redraw(visible)
            }
            ListAction::ToggleSelectAll => {
                self.toggle_select_all();
                ActionResult::Redraw
            }
            ListAction::ClearSelection => redraw({
                let had_selection = !self.selection().is_empty();
                self.clear_selection();
                had_selection
            }),
            ListAction::ChangeScope(scope) => ActionResult::Loaded(self.load(scope).await?),
            ListAction::Reload => ActionResult::Loaded(self.reload().await?),
            ListAction::Create(draft) => {
                ActionResult::Mutated(self.execute(MutationIntent::Create(draft)).await)
            }
            ListAction::Update(id, patch) => {
                ActionResult::Mutated(self.execute(MutationIntent::Update(id, patch)).await)
            }
            ListAction::Delete(id) => {
                ActionResult::Mutated(self.execute(MutationIntent::Delete(id)).await)
            }
            ListAction::BulkSelected(op) => ActionResult::Mutated(self.bulk_selected(op).await),
            ListAction::Detach => {
                self.detach();
                ActionResult::Unchanged
            }
            ListAction::NoOp => ActionResult::Unchanged,
        };
        Ok(result)
    }
}
