#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use compact_str::format_compact;
use farmdesk_core::{
    config::Config,
    controller::{ListController, MutationMode},
    domain::farmer::{Farmer, FarmerRole, FarmerStatus},
    model::notification::{Notification, NotificationCenter},
    service::{InMemoryService, Scope},
};
use uuid::Uuid;

pub type Backend = Arc<InMemoryService<Farmer>>;
pub type Farmers = ListController<Farmer, Backend, NotificationCenter>;

pub struct Screen {
    pub list: Farmers,
    pub service: Backend,
    pub center: NotificationCenter,
}

impl Screen {
    /// Notifications emitted since the last call.
    pub fn toasts(&self) -> Vec<Notification> {
        self.center.drain()
    }
}

/// Farmer screen loaded from a backend seeded with `records`.
pub async fn screen_with(records: Vec<Farmer>, mode: MutationMode, config: &Config) -> Screen {
    let service = Arc::new(InMemoryService::seeded(&Scope::global(), records));
    let center = NotificationCenter::default();
    let mut list =
        ListController::new(Arc::clone(&service), center.clone(), config).with_mode(mode);
    list.load(Scope::global()).await.expect("fixture loads");
    Screen {
        list,
        service,
        center,
    }
}

/// Farmer screen over the five-farmer sample.
pub async fn screen(mode: MutationMode) -> Screen {
    screen_with(Farmer::sample(), mode, &Config::default()).await
}

/// `count` active farmers named "Farmer 01", "Farmer 02", ...
pub fn numbered_farmers(count: u128) -> Vec<Farmer> {
    (1..=count)
        .map(|n| Farmer {
            id: Uuid::from_u128(1_000 + n),
            name: format_compact!("Farmer {n:02}"),
            email: format_compact!("farmer{n}@farmdesk.io"),
            phone: None,
            role: FarmerRole::Farmer,
            status: FarmerStatus::Active,
            plots: 1,
            joined: NaiveDate::default(),
        })
        .collect()
}

pub fn sample_id(index: usize) -> Uuid {
    Farmer::sample()[index].id
}
