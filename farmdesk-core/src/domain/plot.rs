//! src/domain/plot.rs
//! ============================================================================
//! # Plots
//!
//! Land parcels managed per season. A plot without a crop is idle.

use std::{borrow::Cow, fmt};

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

use crate::{
    domain::rules::{check_amount, check_required},
    error::ListResult,
    model::record::{FieldValue, Record, Validate},
    service::remote::Scope,
};

/// Largest plot the backend accepts, in hectares.
pub const MAX_AREA_HA: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Loam,
    Clay,
    Sandy,
    Silt,
}

impl SoilType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loam => "loam",
            Self::Clay => "clay",
            Self::Sandy => "sandy",
            Self::Silt => "silt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStatus {
    #[default]
    Idle,
    Planted,
    Harvested,
}

impl PlotStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Planted => "planted",
            Self::Harvested => "harvested",
        }
    }
}

impl fmt::Display for PlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub id: CompactString,
    pub season: CompactString,
    pub name: CompactString,
    pub crop: Option<CompactString>,
    pub area_ha: f64,
    pub soil: SoilType,
    pub status: PlotStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotKey {
    Name,
    Crop,
    Area,
    Soil,
    Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDraft {
    pub name: CompactString,
    pub crop: Option<CompactString>,
    pub area_ha: f64,
    pub soil: SoilType,
    pub status: PlotStatus,
}

impl Validate for PlotDraft {
    fn validate(&self) -> ListResult<()> {
        check_required("name", &self.name)?;
        check_amount("area", self.area_ha, 0.0, false, MAX_AREA_HA)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotPatch {
    pub name: Option<CompactString>,
    pub crop: Option<CompactString>,
    pub area_ha: Option<f64>,
    pub soil: Option<SoilType>,
    pub status: Option<PlotStatus>,
}

impl Validate for PlotPatch {
    fn validate(&self) -> ListResult<()> {
        if let Some(name) = &self.name {
            check_required("name", name)?;
        }
        if let Some(area) = self.area_ha {
            check_amount("area", area, 0.0, false, MAX_AREA_HA)?;
        }
        Ok(())
    }
}

impl Record for Plot {
    type Id = CompactString;
    type Key = PlotKey;
    type Draft = PlotDraft;
    type Patch = PlotPatch;

    const LABEL: &'static str = "plot";
    const LABEL_PLURAL: &'static str = "plots";
    const SCOPED: bool = true;
    const SEARCH_KEYS: &'static [PlotKey] = &[PlotKey::Name, PlotKey::Crop];

    fn id(&self) -> &CompactString {
        &self.id
    }

    fn field(&self, key: PlotKey) -> FieldValue<'_> {
        match key {
            PlotKey::Name => FieldValue::text(&self.name),
            PlotKey::Crop => FieldValue::opt_text(self.crop.as_deref()),
            PlotKey::Area => FieldValue::Float(self.area_ha),
            PlotKey::Soil => FieldValue::text(self.soil.as_str()),
            PlotKey::Status => FieldValue::text(self.status.as_str()),
        }
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn from_draft(id: CompactString, scope: &Scope, draft: PlotDraft) -> Self {
        Self {
            id,
            season: scope.key().unwrap_or_default().into(),
            name: draft.name,
            crop: draft.crop,
            area_ha: draft.area_ha,
            soil: draft.soil,
            status: draft.status,
        }
    }

    fn apply_patch(&mut self, patch: &PlotPatch) {
        if let Some(name) = &patch.name {
            self.name.clone_from(name);
        }
        if let Some(crop) = &patch.crop {
            self.crop = Some(crop.clone());
        }
        if let Some(area) = patch.area_ha {
            self.area_ha = area;
        }
        if let Some(soil) = patch.soil {
            self.soil = soil;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }

    fn in_scope(&self, scope: &Scope) -> bool {
        scope.key().is_none_or(|season| self.season == season)
    }
}

impl Plot {
    /// Four plots for `season`, one of them idle.
    #[must_use]
    pub fn sample(season: &str) -> Vec<Self> {
        let plot = |n: u32, name: &str, crop: Option<&str>, area_ha: f64, soil, status| Self {
            id: format_compact!("{season}-plot-{n}"),
            season: season.into(),
            name: name.into(),
            crop: crop.map(CompactString::from),
            area_ha,
            soil,
            status,
        };
        vec![
            plot(1, "North Field", Some("Rice"), 4.5, SoilType::Clay, PlotStatus::Planted),
            plot(2, "River Bend", Some("Corn"), 2.0, SoilType::Loam, PlotStatus::Harvested),
            plot(3, "Hillside", None, 1.25, SoilType::Sandy, PlotStatus::Idle),
            plot(4, "East Paddy", Some("Rice"), 3.0, SoilType::Silt, PlotStatus::Planted),
        ]
    }
}

/// Total hectares over `plots`.
pub fn total_area<'a>(plots: impl IntoIterator<Item = &'a Plot>) -> f64 {
    plots.into_iter().map(|p| p.area_ha).sum()
}
