//! src/domain/farmer.rs
//! ============================================================================
//! # Farmer accounts
//!
//! Admin-managed user accounts: farmers, buyers and administrators.

use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{NaiveDate, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::rules::{check_email, check_phone, check_required},
    error::{ListError, ListResult},
    model::record::{FieldValue, Record, Validate},
    service::remote::Scope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmerRole {
    Admin,
    Farmer,
    Buyer,
}

impl FarmerRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Farmer => "farmer",
            Self::Buyer => "buyer",
        }
    }
}

impl fmt::Display for FarmerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FarmerRole {
    type Err = ListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "farmer" => Ok(Self::Farmer),
            "buyer" => Ok(Self::Buyer),
            other => Err(ListError::validation("role", format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmerStatus {
    #[default]
    Active,
    Inactive,
    Pending,
}

impl FarmerStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for FarmerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    pub id: Uuid,
    pub name: CompactString,
    pub email: CompactString,
    pub phone: Option<CompactString>,
    pub role: FarmerRole,
    pub status: FarmerStatus,
    /// Number of plots registered to the account.
    pub plots: u32,
    pub joined: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FarmerKey {
    Name,
    Email,
    Phone,
    Role,
    Status,
    Plots,
    Joined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerDraft {
    pub name: CompactString,
    pub email: CompactString,
    pub phone: Option<CompactString>,
    pub role: FarmerRole,
    pub status: FarmerStatus,
    pub plots: u32,
}

impl FarmerDraft {
    pub fn new(
        name: impl Into<CompactString>,
        email: impl Into<CompactString>,
        role: FarmerRole,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            role,
            status: FarmerStatus::default(),
            plots: 0,
        }
    }

    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<CompactString>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl Validate for FarmerDraft {
    fn validate(&self) -> ListResult<()> {
        check_required("name", &self.name)?;
        check_email(&self.email)?;
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }
        Ok(())
    }
}

/// Fields left `None` keep their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmerPatch {
    pub name: Option<CompactString>,
    pub email: Option<CompactString>,
    pub phone: Option<CompactString>,
    pub role: Option<FarmerRole>,
    pub status: Option<FarmerStatus>,
    pub plots: Option<u32>,
}

impl FarmerPatch {
    /// Status transition used by the activate/deactivate bulk actions.
    #[must_use]
    pub fn status(status: FarmerStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl Validate for FarmerPatch {
    fn validate(&self) -> ListResult<()> {
        if let Some(name) = &self.name {
            check_required("name", name)?;
        }
        if let Some(email) = &self.email {
            check_email(email)?;
        }
        if let Some(phone) = &self.phone {
            check_phone(phone)?;
        }
        Ok(())
    }
}

impl Record for Farmer {
    type Id = Uuid;
    type Key = FarmerKey;
    type Draft = FarmerDraft;
    type Patch = FarmerPatch;

    const LABEL: &'static str = "farmer";
    const LABEL_PLURAL: &'static str = "farmers";
    const SEARCH_KEYS: &'static [FarmerKey] =
        &[FarmerKey::Name, FarmerKey::Email, FarmerKey::Phone];

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn field(&self, key: FarmerKey) -> FieldValue<'_> {
        match key {
            FarmerKey::Name => FieldValue::text(&self.name),
            FarmerKey::Email => FieldValue::text(&self.email),
            FarmerKey::Phone => FieldValue::opt_text(self.phone.as_deref()),
            FarmerKey::Role => FieldValue::text(self.role.as_str()),
            FarmerKey::Status => FieldValue::text(self.status.as_str()),
            FarmerKey::Plots => FieldValue::Int(i64::from(self.plots)),
            FarmerKey::Joined => FieldValue::Date(self.joined),
        }
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn from_draft(id: Uuid, _scope: &Scope, draft: FarmerDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            role: draft.role,
            status: draft.status,
            plots: draft.plots,
            joined: Utc::now().date_naive(),
        }
    }

    fn apply_patch(&mut self, patch: &FarmerPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(plots) = patch.plots {
            self.plots = plots;
        }
    }
}

impl Farmer {
    /// Five-account fixture: one admin, two farmers, two buyers.
    #[must_use]
    pub fn sample() -> Vec<Self> {
        let farmer = |n: u128,
                      name: &str,
                      email: &str,
                      phone: Option<&str>,
                      role: FarmerRole,
                      status: FarmerStatus,
                      plots: u32,
                      joined: (i32, u32, u32)| Self {
            id: Uuid::from_u128(n),
            name: name.into(),
            email: email.into(),
            phone: phone.map(CompactString::from),
            role,
            status,
            plots,
            joined: NaiveDate::from_ymd_opt(joined.0, joined.1, joined.2).unwrap_or_default(),
        };

        vec![
            farmer(
                1,
                "John Anderson",
                "john.anderson@farmdesk.io",
                Some("555-0101"),
                FarmerRole::Admin,
                FarmerStatus::Active,
                0,
                (2023, 1, 15),
            ),
            farmer(
                2,
                "Sarah Miller",
                "sarah.miller@farmdesk.io",
                Some("555-0102"),
                FarmerRole::Farmer,
                FarmerStatus::Active,
                3,
                (2023, 3, 22),
            ),
            farmer(
                3,
                "Mike Wilson",
                "mike.wilson@farmdesk.io",
                Some("555-0103"),
                FarmerRole::Farmer,
                FarmerStatus::Pending,
                1,
                (2024, 2, 10),
            ),
            farmer(
                4,
                "Emma Davis",
                "emma.davis@farmdesk.io",
                Some("555-0104"),
                FarmerRole::Buyer,
                FarmerStatus::Inactive,
                0,
                (2023, 11, 5),
            ),
            farmer(
                5,
                "David Chen",
                "david.chen@farmdesk.io",
                None,
                FarmerRole::Buyer,
                FarmerStatus::Active,
                0,
                (2024, 6, 18),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_requires_name_and_valid_email() {
        let empty_name = FarmerDraft::new("", "a@b.com", FarmerRole::Farmer);
        assert!(matches!(
            empty_name.validate(),
            Err(ListError::Validation { ref field, .. }) if field == "name"
        ));

        let bad_email = FarmerDraft::new("Ana", "not-an-email", FarmerRole::Farmer);
        assert!(matches!(
            bad_email.validate(),
            Err(ListError::Validation { ref field, .. }) if field == "email"
        ));

        let ok = FarmerDraft::new("Ana", "a@b.com", FarmerRole::Buyer).with_phone("+1 555-0199");
        assert!(ok.validate().is_ok());
        assert!(ok.with_phone("call me").validate().is_err());
    }

    #[test]
    fn patch_validates_only_present_fields() {
        assert!(FarmerPatch::default().validate().is_ok());
        assert!(FarmerPatch::status(FarmerStatus::Inactive).validate().is_ok());
        let blank = FarmerPatch {
            name: Some("  ".into()),
            ..FarmerPatch::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn draft_becomes_record() {
        let draft = FarmerDraft::new("Ana Lopez", "ana@example.com", FarmerRole::Farmer);
        let id = Uuid::new_v4();
        let farmer = Farmer::from_draft(id, &Scope::global(), draft.clone());
        assert_eq!(farmer.id, id);
        assert_eq!(farmer.name, draft.name);
        assert_eq!(farmer.status, FarmerStatus::Active);
        assert_eq!(farmer.display_name(), "Ana Lopez");
    }

    #[test]
    fn fields_expose_typed_values() {
        let sample = Farmer::sample();
        let david = &sample[4];
        assert!(david.field(FarmerKey::Phone).is_null());
        assert_eq!(david.field(FarmerKey::Role), FieldValue::text("buyer"));
        assert_eq!(david.field(FarmerKey::Plots), FieldValue::Int(0));
    }

    #[test]
    fn role_parses_from_filter_values() {
        assert_eq!("buyer".parse::<FarmerRole>().ok(), Some(FarmerRole::Buyer));
        assert!("owner".parse::<FarmerRole>().is_err());
        assert_eq!(FarmerStatus::Pending.to_string(), "pending");
    }
}
