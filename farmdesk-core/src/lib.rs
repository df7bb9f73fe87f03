pub mod error;
pub use error::{ListError, ListResult};

pub mod config;

pub mod logging;

pub mod model {
    pub mod record;
    pub use record::{FieldValue, Record, RecordId, Validate};

    pub mod store;
    pub use store::EntityStore;

    pub mod filter;
    pub use filter::{CategoryFilter, FilterCriteria};

    pub mod sort;
    pub use sort::{SortDirection, SortState};

    pub mod view;

    pub mod pagination;
    pub use pagination::{PageInfo, PageSize, Pagination};

    pub mod selection;
    pub use selection::{SelectAllState, Selection};

    pub mod notification;
    pub use notification::{Notification, NotificationCenter, NotificationLevel, NotificationSink};
}

pub mod controller {
    pub mod actions;
    pub use actions::{ActionResult, ListAction};

    pub mod gateway;
    pub use gateway::{
        BatchReport, BulkOp, Completion, MutationIntent, MutationMode, MutationOutcome,
        MutationPhase, PendingMutation, Submission,
    };

    pub mod list_controller;
    pub use list_controller::ListController;
}

pub mod service {
    pub mod remote;
    pub use remote::{ListPage, RemoteError, RemoteResult, RemoteService, Scope};

    pub mod memory;
    pub use memory::InMemoryService;
}

pub mod domain {
    pub mod rules;

    pub mod farmer;
    pub use farmer::{Farmer, FarmerKey, FarmerRole, FarmerStatus};

    pub mod plot;
    pub use plot::{Plot, PlotKey, PlotStatus, SoilType};

    pub mod expense;
    pub use expense::{Expense, ExpenseCategory, ExpenseKey};

    pub mod harvest;
    pub use harvest::{Grade, Harvest, HarvestKey};

    pub mod system_log;
    pub use system_log::{LogEntry, LogKey, LogLevel};
}
