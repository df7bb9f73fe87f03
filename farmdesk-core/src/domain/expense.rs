//! src/domain/expense.rs
//! ============================================================================
//! # Expenses
//!
//! Per-season cost entries, optionally tied to a plot, with the totals the
//! expense screen shows above the table.

use std::{borrow::Cow, fmt};

use chrono::NaiveDate;
use compact_str::{CompactString, format_compact};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    domain::rules::{check_amount, check_required},
    error::ListResult,
    model::record::{FieldValue, Record, Validate},
    service::remote::Scope,
};

/// Upper bound for a single expense entry.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Seed,
    Fertilizer,
    Labor,
    Equipment,
    Fuel,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [Self; 6] = [
        Self::Seed,
        Self::Fertilizer,
        Self::Labor,
        Self::Equipment,
        Self::Fuel,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Fertilizer => "fertilizer",
            Self::Labor => "labor",
            Self::Equipment => "equipment",
            Self::Fuel => "fuel",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: CompactString,
    pub season: CompactString,
    pub description: CompactString,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub date: NaiveDate,
    /// Plot the cost is attributed to, if any.
    pub plot: Option<CompactString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseKey {
    Description,
    Category,
    Amount,
    Date,
    Plot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    pub description: CompactString,
    pub category: ExpenseCategory,
    pub amount: f64,
    pub date: NaiveDate,
    pub plot: Option<CompactString>,
}

impl Validate for ExpenseDraft {
    fn validate(&self) -> ListResult<()> {
        check_required("description", &self.description)?;
        check_amount("amount", self.amount, 0.0, true, MAX_AMOUNT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensePatch {
    pub description: Option<CompactString>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub plot: Option<CompactString>,
}

impl Validate for ExpensePatch {
    fn validate(&self) -> ListResult<()> {
        if let Some(description) = &self.description {
            check_required("description", description)?;
        }
        if let Some(amount) = self.amount {
            check_amount("amount", amount, 0.0, true, MAX_AMOUNT)?;
        }
        Ok(())
    }
}

impl Record for Expense {
    type Id = CompactString;
    type Key = ExpenseKey;
    type Draft = ExpenseDraft;
    type Patch = ExpensePatch;

    const LABEL: &'static str = "expense";
    const LABEL_PLURAL: &'static str = "expenses";
    const SCOPED: bool = true;
    const SEARCH_KEYS: &'static [ExpenseKey] = &[ExpenseKey::Description, ExpenseKey::Plot];

    fn id(&self) -> &CompactString {
        &self.id
    }

    fn field(&self, key: ExpenseKey) -> FieldValue<'_> {
        match key {
            ExpenseKey::Description => FieldValue::text(&self.description),
            ExpenseKey::Category => FieldValue::text(self.category.as_str()),
            ExpenseKey::Amount => FieldValue::Float(self.amount),
            ExpenseKey::Date => FieldValue::Date(self.date),
            ExpenseKey::Plot => FieldValue::opt_text(self.plot.as_deref()),
        }
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.description)
    }

    fn from_draft(id: CompactString, scope: &Scope, draft: ExpenseDraft) -> Self {
        Self {
            id,
            season: scope.key().unwrap_or_default().into(),
            description: draft.description,
            category: draft.category,
            amount: draft.amount,
            date: draft.date,
            plot: draft.plot,
        }
    }

    fn apply_patch(&mut self, patch: &ExpensePatch) {
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(plot) = &patch.plot {
            self.plot = Some(plot.clone());
        }
    }

    fn in_scope(&self, scope: &Scope) -> bool {
        scope.key().is_none_or(|season| self.season == season)
    }
}

/// Sum of `amount` over `expenses`.
pub fn total_amount<'a>(expenses: impl IntoIterator<Item = &'a Expense>) -> f64 {
    expenses.into_iter().map(|e| e.amount).sum()
}

/// Per-category totals, in `ExpenseCategory::ALL` order. Categories without
/// entries are left out.
#[must_use]
pub fn totals_by_category<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> IndexMap<ExpenseCategory, f64> {
    let mut totals: IndexMap<ExpenseCategory, f64> =
        ExpenseCategory::ALL.iter().map(|c| (*c, 0.0)).collect();
    let mut seen = [false; ExpenseCategory::ALL.len()];

    for expense in expenses {
        if let Some((index, _, total)) = totals.get_full_mut(&expense.category) {
            *total += expense.amount;
            seen[index] = true;
        }
    }

    totals
        .into_iter()
        .enumerate()
        .filter(|(index, _)| seen[*index])
        .map(|(_, entry)| entry)
        .collect()
}

impl Expense {
    /// Five entries for `season`.
    #[must_use]
    pub fn sample(season: &str) -> Vec<Self> {
        let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap_or_default();
        let expense = |n: u32, description: &str, category, amount, date, plot: Option<&str>| Self {
            id: format_compact!("{season}-exp-{n}"),
            season: season.into(),
            description: description.into(),
            category,
            amount,
            date,
            plot: plot.map(CompactString::from),
        };
        vec![
            expense(1, "Hybrid rice seed", ExpenseCategory::Seed, 1_200.0, date(3, 2), Some("North Field")),
            expense(2, "Urea 50kg", ExpenseCategory::Fertilizer, 850.5, date(3, 20), Some("North Field")),
            expense(3, "Planting crew", ExpenseCategory::Labor, 2_400.0, date(3, 5), Some("East Paddy")),
            expense(4, "Tractor diesel", ExpenseCategory::Fuel, 310.25, date(4, 1), None),
            expense(5, "Seed corn", ExpenseCategory::Seed, 640.0, date(2, 27), Some("River Bend")),
        ]
    }
}
