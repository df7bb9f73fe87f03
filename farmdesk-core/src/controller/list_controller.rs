//! src/controller/list_controller.rs
//! ============================================================================
//! # `ListController`: one generic list screen
//!
//! Owns the entity store and every piece of list state (filter criteria,
//! sort, pagination, selection) for one entity, plus the remote service and
//! notification sink it talks to. UI operations are synchronous and re-derive
//! the view on every change: the page index is re-clamped and the selection
//! is pruned to what is still visible.
//!
//! Mutations live in [`crate::controller::gateway`].

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{Config, RemoteConfig},
    controller::gateway::{MutationMode, describe, guarded},
    error::{ListError, ListResult},
    model::{
        filter::{CategoryFilter, FilterCriteria},
        notification::NotificationSink,
        pagination::{PageInfo, PageSize, Pagination},
        record::Record,
        selection::{SelectAllState, Selection},
        sort::SortState,
        store::EntityStore,
        view::{derive_view, view_ids},
    },
    service::remote::{RemoteService, Scope},
};

pub struct ListController<R: Record, S, N> {
    pub(super) service: S,
    pub(super) sink: N,
    pub(super) mode: MutationMode,
    pub(super) remote: RemoteConfig,

    pub(super) store: EntityStore<R>,
    criteria: FilterCriteria<R::Key>,
    sort: SortState<R::Key>,
    pagination: Pagination,
    pub(super) selection: Selection<R::Id>,

    /// Ids of the filtered, sorted view; rebuilt by `refresh`.
    visible: Vec<R::Id>,

    pub(super) scope: Option<Scope>,
    /// Bumped on every scope change and detach; completions from an older
    /// epoch are discarded.
    pub(super) epoch: u64,
    pub(super) cancel: CancellationToken,
    pub(super) next_ticket: u64,
    pub(super) in_flight: HashSet<u64>,
    /// Ticket of the last write applied to each id.
    pub(super) last_write: HashMap<R::Id, u64>,
}

impl<R, S, N> ListController<R, S, N>
where
    R: Record,
    S: RemoteService<R>,
    N: NotificationSink,
{
    #[must_use]
    pub fn new(service: S, sink: N, config: &Config) -> Self {
        Self {
            service,
            sink,
            mode: config.list.mutation_mode,
            remote: config.remote.clone(),
            store: EntityStore::new(),
            criteria: FilterCriteria::new(),
            sort: SortState::unsorted(),
            pagination: Pagination::new(config.list.default_page_size),
            selection: Selection::new(),
            visible: Vec::new(),
            scope: None,
            epoch: 0,
            cancel: CancellationToken::new(),
            next_ticket: 0,
            in_flight: HashSet::new(),
            last_write: HashMap::new(),
        }
    }

    /// Pick the mutation discipline. Only meaningful before any mutation.
    #[must_use]
    pub fn with_mode(mut self, mode: MutationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Seed the store directly, without a remote fetch.
    ///
    /// # Errors
    /// `ListError::DuplicateId` if two records share an id.
    pub fn with_records(
        mut self,
        scope: Scope,
        records: impl IntoIterator<Item = R>,
    ) -> ListResult<Self> {
        self.store = EntityStore::from_records(records)?;
        self.scope = Some(scope);
        self.refresh();
        Ok(self)
    }

    // ------------------------------------------------------------------
    // Scope and lifecycle
    // ------------------------------------------------------------------

    /// Invalidate everything and fetch the store for `scope`.
    ///
    /// In-flight mutations from before the call are discarded when they
    /// complete.
    ///
    /// # Errors
    /// The remote failure, timeout or cancellation; an error notification
    /// has been emitted and the store is left empty.
    #[instrument(skip(self), fields(entity = R::LABEL))]
    pub async fn load(&mut self, scope: Scope) -> ListResult<usize> {
        self.epoch += 1;
        self.in_flight.clear();
        self.last_write.clear();
        self.store.clear();
        self.selection.clear();
        self.pagination.first();
        self.scope = Some(scope.clone());
        self.refresh();

        let fetched = guarded(
            "list",
            self.remote.timeout,
            &self.cancel,
            self.service.list(&scope),
        )
        .await;

        let page = match fetched {
            Ok(page) => page,
            Err(err) => {
                warn!(scope = %scope, error = %err, "load failed");
                self.sink.notify_error(
                    &format!("Failed to load {}", R::LABEL_PLURAL),
                    Some(&describe(&err)),
                );
                return Err(err);
            }
        };

        let total_count = page.total_count;
        let store = EntityStore::from_records(
            page.items.into_iter().filter(|record| record.in_scope(&scope)),
        );
        self.store = match store {
            Ok(store) => store,
            Err(err) => {
                self.sink.notify_error(
                    &format!("Failed to load {}", R::LABEL_PLURAL),
                    Some(&err.to_string()),
                );
                return Err(err);
            }
        };
        self.refresh();

        info!(scope = %scope, count = self.store.len(), total_count, "store loaded");
        Ok(self.store.len())
    }

    /// Refetch the current scope.
    ///
    /// # Errors
    /// `ListError::MissingScope` before the first `load`, otherwise as `load`.
    pub async fn reload(&mut self) -> ListResult<usize> {
        let scope = self.scope.clone().ok_or(ListError::MissingScope)?;
        self.load(scope).await
    }

    /// The screen went away: cancel in-flight calls and make their
    /// completions stale.
    pub fn detach(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.epoch += 1;
        let abandoned = self.in_flight.len();
        self.in_flight.clear();
        debug!(entity = R::LABEL, abandoned, "controller detached");
    }

    // ------------------------------------------------------------------
    // Filtering and sorting
    // ------------------------------------------------------------------

    /// Returns true if the query changed. A new query goes back to page 1.
    pub fn set_search(&mut self, query: &str) -> bool {
        let changed = self.criteria.set_search(query);
        if changed {
            self.pagination.first();
            self.refresh();
        }
        changed
    }

    /// Returns true if the criterion changed. A new criterion goes back to
    /// page 1.
    pub fn set_category(&mut self, key: R::Key, value: CategoryFilter) -> bool {
        let changed = self.criteria.set_category(key, value);
        if changed {
            self.pagination.first();
            self.refresh();
        }
        changed
    }

    pub fn clear_filters(&mut self) -> bool {
        let changed = self.criteria.clear();
        if changed {
            self.pagination.first();
            self.refresh();
        }
        changed
    }

    /// Column header click.
    pub fn toggle_sort(&mut self, key: R::Key) {
        self.sort.toggle(key);
        self.refresh();
    }

    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.refresh();
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// # Errors
    /// `ListError::PageOutOfRange`; the current page is kept.
    pub fn go_to_page(&mut self, page: usize) -> ListResult<()> {
        self.pagination.go_to(page, self.visible.len())
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next(self.visible.len())
    }

    pub fn previous_page(&mut self) -> bool {
        self.pagination.previous(self.visible.len())
    }

    pub fn first_page(&mut self) {
        self.pagination.first();
    }

    pub fn last_page(&mut self) {
        self.pagination.last(self.visible.len());
    }

    pub fn set_page_size(&mut self, size: PageSize) {
        self.pagination.set_size(size, self.visible.len());
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Flip one row. Rows outside the filtered view can't be selected.
    /// Returns true if the id is now selected.
    pub fn toggle_select(&mut self, id: R::Id) -> bool {
        if !self.visible.contains(&id) {
            debug!(entity = R::LABEL, id = %id, "ignoring selection of hidden row");
            return false;
        }
        self.selection.toggle(id)
    }

    /// Header checkbox.
    pub fn toggle_select_all(&mut self) {
        self.selection.toggle_all(self.visible.iter());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    #[must_use]
    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.state(self.visible.iter())
    }

    // ------------------------------------------------------------------
    // Derived view
    // ------------------------------------------------------------------

    /// Filtered, sorted records.
    #[must_use]
    pub fn view(&self) -> Vec<&R> {
        derive_view(&self.store, &self.criteria, &self.sort)
    }

    /// Records on the current page.
    #[must_use]
    pub fn page_rows(&self) -> Vec<&R> {
        let rows = self.view();
        self.pagination.slice(&rows).to_vec()
    }

    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        self.pagination.info(self.visible.len())
    }

    /// Ids of the filtered, sorted view.
    #[must_use]
    pub fn visible_ids(&self) -> &[R::Id] {
        &self.visible
    }

    #[must_use]
    pub fn filtered_count(&self) -> usize {
        self.visible.len()
    }

    /// Re-derive the view, re-clamp the page and prune the selection.
    pub(super) fn refresh(&mut self) {
        let rows = derive_view(&self.store, &self.criteria, &self.sort);
        self.visible = view_ids(&rows);

        let total = self.visible.len();
        if self.pagination.clamp(total) {
            debug!(entity = R::LABEL, page = self.pagination.page(), "page re-clamped");
        }
        let dropped = self.selection.retain(self.visible.iter());
        if dropped > 0 {
            debug!(entity = R::LABEL, dropped, "selection pruned");
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn store(&self) -> &EntityStore<R> {
        &self.store
    }

    #[must_use]
    pub fn get(&self, id: &R::Id) -> Option<&R> {
        self.store.get(id)
    }

    #[must_use]
    pub const fn criteria(&self) -> &FilterCriteria<R::Key> {
        &self.criteria
    }

    #[must_use]
    pub const fn sort(&self) -> &SortState<R::Key> {
        &self.sort
    }

    #[must_use]
    pub const fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection<R::Id> {
        &self.selection
    }

    #[must_use]
    pub const fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    #[must_use]
    pub const fn mode(&self) -> MutationMode {
        self.mode
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Mutations begun but not yet settled in the current epoch.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub const fn sink(&self) -> &N {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::farmer::{Farmer, FarmerKey},
        model::{notification::NotificationCenter, sort::SortDirection},
        service::memory::InMemoryService,
    };

    type Farmers = ListController<Farmer, InMemoryService<Farmer>, NotificationCenter>;

    fn controller() -> Farmers {
        ListController::new(
            InMemoryService::new(),
            NotificationCenter::default(),
            &Config::default(),
        )
        .with_records(Scope::global(), Farmer::sample())
        .expect("unique sample ids")
    }

    #[test]
    fn role_filter_shows_two_farmers_in_store_order() {
        let mut list = controller();
        list.set_category(FarmerKey::Role, CategoryFilter::parse("farmer"));
        list.set_category(FarmerKey::Status, CategoryFilter::parse("all"));
        let names: Vec<_> = list.view().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Sarah Miller", "Mike Wilson"]);
        assert_eq!(list.filtered_count(), 2);
    }

    #[test]
    fn header_click_sorts_then_reverses() {
        let mut list = controller();
        list.toggle_sort(FarmerKey::Name);
        let asc: Vec<_> = list.view().iter().map(|f| f.name.to_string()).collect();
        assert_eq!(
            asc,
            ["David Chen", "Emma Davis", "John Anderson", "Mike Wilson", "Sarah Miller"]
        );

        list.toggle_sort(FarmerKey::Name);
        assert_eq!(list.sort().direction(), SortDirection::Descending);
        let desc: Vec<_> = list.view().iter().map(|f| f.name.to_string()).collect();
        assert_eq!(desc, asc.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn filtering_prunes_selection_and_resets_page() {
        let mut list = controller();
        list.set_page_size(PageSize::Ten);
        list.toggle_select_all();
        assert_eq!(list.selection().len(), 5);
        assert_eq!(list.select_all_state(), SelectAllState::All);

        list.set_search("sarah");
        assert_eq!(list.selection().len(), 1);
        assert_eq!(list.page_info().page, 1);

        list.clear_filters();
        assert_eq!(list.select_all_state(), SelectAllState::Partial);
    }

    #[test]
    fn hidden_rows_cannot_be_selected() {
        let mut list = controller();
        let mike = Farmer::sample()[2].id;
        list.set_search("sarah");
        assert!(!list.toggle_select(mike));
        assert!(list.selection().is_empty());
    }

    #[test]
    fn out_of_range_page_is_rejected() {
        let mut list = controller();
        assert!(matches!(
            list.go_to_page(2),
            Err(ListError::PageOutOfRange { requested: 2, total_pages: 1 })
        ));
        assert_eq!(list.pagination().page(), 1);
        assert!(!list.next_page());
    }

    #[tokio::test]
    async fn load_replaces_store_and_bumps_epoch() {
        let service = InMemoryService::seeded(&Scope::global(), Farmer::sample());
        let center = NotificationCenter::default();
        let mut list: Farmers = ListController::new(service, center.clone(), &Config::default());
        assert!(list.scope().is_none());

        assert_eq!(list.load(Scope::global()).await.expect("loaded"), 5);
        assert_eq!(list.epoch(), 1);
        assert_eq!(list.page_rows().len(), 5);
        assert!(center.is_empty());

        list.service().fail_next("backend unavailable").await;
        assert!(list.reload().await.is_err());
        assert!(list.store().is_empty());
        let toast = center.drain().pop().expect("error notification");
        assert_eq!(toast.title, "Failed to load farmers");
        assert_eq!(toast.description.as_deref(), Some("backend unavailable"));
    }

    #[tokio::test]
    async fn reload_needs_a_scope() {
        let mut list: Farmers = ListController::new(
            InMemoryService::new(),
            NotificationCenter::default(),
            &Config::default(),
        );
        assert!(matches!(list.reload().await, Err(ListError::MissingScope)));
    }
}
