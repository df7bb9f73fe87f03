//! src/domain/harvest.rs
//! ============================================================================
//! # Harvest batches

use std::{borrow::Cow, fmt};

use chrono::NaiveDate;
use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::rules::{check_amount, check_required},
    error::ListResult,
    model::record::{FieldValue, Record, Validate},
    service::remote::Scope,
};

pub const MAX_QUANTITY_KG: f64 = 10_000_000.0;

/// Quality grade assigned at weigh-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub id: Uuid,
    pub season: CompactString,
    pub crop: CompactString,
    pub plot: CompactString,
    pub quantity_kg: f64,
    pub grade: Grade,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarvestKey {
    Crop,
    Plot,
    Quantity,
    Grade,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestDraft {
    pub crop: CompactString,
    pub plot: CompactString,
    pub quantity_kg: f64,
    pub grade: Grade,
    pub date: NaiveDate,
}

impl Validate for HarvestDraft {
    fn validate(&self) -> ListResult<()> {
        check_required("crop", &self.crop)?;
        check_required("plot", &self.plot)?;
        check_amount("quantity", self.quantity_kg, 0.0, false, MAX_QUANTITY_KG)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestPatch {
    pub quantity_kg: Option<f64>,
    pub grade: Option<Grade>,
    pub date: Option<NaiveDate>,
}

impl Validate for HarvestPatch {
    fn validate(&self) -> ListResult<()> {
        match self.quantity_kg {
            Some(quantity) => check_amount("quantity", quantity, 0.0, false, MAX_QUANTITY_KG),
            None => Ok(()),
        }
    }
}

impl Record for Harvest {
    type Id = Uuid;
    type Key = HarvestKey;
    type Draft = HarvestDraft;
    type Patch = HarvestPatch;

    const LABEL: &'static str = "harvest";
    const LABEL_PLURAL: &'static str = "harvests";
    const SCOPED: bool = true;
    const SEARCH_KEYS: &'static [HarvestKey] = &[HarvestKey::Crop, HarvestKey::Plot];

    fn id(&self) -> &Uuid {
        &self.id
    }

    fn field(&self, key: HarvestKey) -> FieldValue<'_> {
        match key {
            HarvestKey::Crop => FieldValue::text(&self.crop),
            HarvestKey::Plot => FieldValue::text(&self.plot),
            HarvestKey::Quantity => FieldValue::Float(self.quantity_kg),
            HarvestKey::Grade => FieldValue::text(self.grade.as_str()),
            HarvestKey::Date => FieldValue::Date(self.date),
        }
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{} from {}", self.crop, self.plot))
    }

    fn from_draft(id: Uuid, scope: &Scope, draft: HarvestDraft) -> Self {
        Self {
            id,
            season: scope.key().unwrap_or_default().into(),
            crop: draft.crop,
            plot: draft.plot,
            quantity_kg: draft.quantity_kg,
            grade: draft.grade,
            date: draft.date,
        }
    }

    fn apply_patch(&mut self, patch: &HarvestPatch) {
        if let Some(quantity) = patch.quantity_kg {
            self.quantity_kg = quantity;
        }
        if let Some(grade) = patch.grade {
            self.grade = grade;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
    }

    fn in_scope(&self, scope: &Scope) -> bool {
        scope.key().is_none_or(|season| self.season == season)
    }
}

/// Total kilograms over `harvests`.
pub fn total_quantity<'a>(harvests: impl IntoIterator<Item = &'a Harvest>) -> f64 {
    harvests.into_iter().map(|h| h.quantity_kg).sum()
}

impl Harvest {
    /// Four batches for `season`. Ids are fresh on every call.
    #[must_use]
    pub fn sample(season: &str) -> Vec<Self> {
        let batch = |crop: &str, plot: &str, quantity_kg, grade, day| Self {
            id: Uuid::new_v4(),
            season: season.into(),
            crop: crop.into(),
            plot: plot.into(),
            quantity_kg,
            grade,
            date: NaiveDate::from_ymd_opt(2025, 7, day).unwrap_or_default(),
        };
        vec![
            batch("Rice", "North Field", 5_400.0, Grade::A, 12),
            batch("Corn", "River Bend", 2_150.5, Grade::B, 18),
            batch("Rice", "East Paddy", 3_900.0, Grade::B, 21),
            batch("Rice", "North Field", 800.0, Grade::C, 28),
        ]
    }

    #[must_use]
    pub fn label(&self) -> CompactString {
        format_compact!("{} kg {} ({})", self.quantity_kg, self.crop, self.grade)
    }
}
