//! src/domain/system_log.rs
//! ============================================================================
//! # System log entries
//!
//! Read-mostly entries shown on the monitoring screen. Entries can be
//! acknowledged and cleared (bulk delete); they are never edited otherwise.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, TimeZone, Utc};
use compact_str::{CompactString, format_compact};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    domain::rules::check_required,
    error::ListResult,
    model::record::{FieldValue, Record, Validate},
    service::remote::Scope,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: CompactString,
    pub level: LogLevel,
    /// Subsystem that raised the entry ("api", "scheduler", ...).
    pub source: CompactString,
    pub message: CompactString,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogKey {
    Level,
    Source,
    Message,
    Timestamp,
    Acknowledged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDraft {
    pub level: LogLevel,
    pub source: CompactString,
    pub message: CompactString,
}

impl Validate for LogDraft {
    fn validate(&self) -> ListResult<()> {
        check_required("message", &self.message)?;
        check_required("source", &self.source)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogPatch {
    pub acknowledged: Option<bool>,
}

impl LogPatch {
    #[must_use]
    pub const fn acknowledge() -> Self {
        Self {
            acknowledged: Some(true),
        }
    }
}

impl Validate for LogPatch {
    fn validate(&self) -> ListResult<()> {
        Ok(())
    }
}

impl Record for LogEntry {
    type Id = CompactString;
    type Key = LogKey;
    type Draft = LogDraft;
    type Patch = LogPatch;

    const LABEL: &'static str = "log entry";
    const LABEL_PLURAL: &'static str = "log entries";
    const SEARCH_KEYS: &'static [LogKey] = &[LogKey::Message, LogKey::Source];

    fn id(&self) -> &CompactString {
        &self.id
    }

    fn field(&self, key: LogKey) -> FieldValue<'_> {
        match key {
            LogKey::Level => FieldValue::text(self.level.as_str()),
            LogKey::Source => FieldValue::text(&self.source),
            LogKey::Message => FieldValue::text(&self.message),
            LogKey::Timestamp => FieldValue::Int(self.timestamp.timestamp_millis()),
            LogKey::Acknowledged => FieldValue::Bool(self.acknowledged),
        }
    }

    fn display_name(&self) -> Cow<'_, str> {
        Cow::Owned(format!("[{}] {}", self.source, self.message))
    }

    fn from_draft(id: CompactString, _scope: &Scope, draft: LogDraft) -> Self {
        Self {
            id,
            level: draft.level,
            source: draft.source,
            message: draft.message,
            timestamp: Utc::now(),
            acknowledged: false,
        }
    }

    fn apply_patch(&mut self, patch: &LogPatch) {
        if let Some(acknowledged) = patch.acknowledged {
            self.acknowledged = acknowledged;
        }
    }
}

/// Entry count per level, `Error` first. Levels without entries are kept
/// at zero so the dashboard tiles are stable.
#[must_use]
pub fn count_by_level<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> IndexMap<LogLevel, usize> {
    let mut counts: IndexMap<LogLevel, usize> =
        [LogLevel::Error, LogLevel::Warning, LogLevel::Info]
            .into_iter()
            .map(|level| (level, 0))
            .collect();
    for entry in entries {
        *counts.entry(entry.level).or_default() += 1;
    }
    counts
}

impl LogEntry {
    /// Six entries from three sources, oldest first.
    #[must_use]
    pub fn sample() -> Vec<Self> {
        let entry = |n: u32, level, source: &str, message: &str, minute: u32| Self {
            id: format_compact!("log-{n}"),
            level,
            source: source.into(),
            message: message.into(),
            timestamp: Utc
                .with_ymd_and_hms(2025, 8, 1, 9, minute, 0)
                .single()
                .unwrap_or_default(),
            acknowledged: false,
        };
        vec![
            entry(1, LogLevel::Info, "api", "Server started", 0),
            entry(2, LogLevel::Info, "scheduler", "Nightly sync queued", 5),
            entry(3, LogLevel::Warning, "api", "Slow query on /harvests", 12),
            entry(4, LogLevel::Error, "weather", "Provider timeout", 20),
            entry(5, LogLevel::Info, "api", "User sarah.miller signed in", 31),
            entry(6, LogLevel::Error, "scheduler", "Sync failed: disk full", 47),
        ]
    }
}
