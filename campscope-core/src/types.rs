//! Core domain types for campscope
//!
//! These types form the canonical record shape that normalizes rows from
//! all registered change-log tables, whatever their physical columns are.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Change record** | One log row: a single field's old/new transition at a timestamp |
//! | **Session** | Change records by one actor, in one table, within a one-minute window |
//! | **Time bucket** | Change records within a one-minute window regardless of actor/table |
//! | **Resolved actor** | The user credited for a change, preferring `performer` over `update_user` |
//!
//! Rows stop being table-specific the moment they are adapted into a
//! [`ChangeRecord`]; only the retrieval layer knows about per-table column
//! names.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Placeholder actor for records carrying neither `performer` nor `update_user`.
pub const UNKNOWN_ACTOR: &str = "System/Unknown";

/// Bookkeeping field names excluded from rendered change lists.
///
/// These still participate in grouping; they are stripped only at render
/// time, where the session header already surfaces them.
pub const SKIP_FIELDS: [&str; 3] = ["update_time", "performer", "update_user"];

/// One normalized row from a change-log table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Logical table the row came from
    pub source_table: String,
    /// Campaign the change belongs to
    pub campaign_id: i64,
    /// Name of the mutated attribute
    pub field_name: String,
    /// Value before the change (nullable in the source)
    pub old_value: Option<String>,
    /// Value after the change (nullable in the source)
    pub new_value: Option<String>,
    /// When the change was recorded; primary ordering key
    pub update_time: NaiveDateTime,
    /// Actor column, where the table has one
    pub update_user: Option<String>,
    /// Alternate actor attribution; wins over `update_user` when present
    pub performer: Option<String>,
}

impl ChangeRecord {
    /// The effective user credited for this change.
    ///
    /// Prefers a non-empty `performer`, then a non-empty `update_user`,
    /// falling back to [`UNKNOWN_ACTOR`].
    pub fn resolved_actor(&self) -> String {
        if let Some(p) = self.performer.as_deref() {
            if !p.trim().is_empty() {
                return p.to_string();
            }
        }
        if let Some(u) = self.update_user.as_deref() {
            if !u.trim().is_empty() {
                return u.to_string();
            }
        }
        UNKNOWN_ACTOR.to_string()
    }

    /// Whether this record's field is rendered inside a session.
    pub fn is_renderable(&self) -> bool {
        !SKIP_FIELDS.contains(&self.field_name.as_str())
    }

    /// The record's timestamp floored to the minute.
    pub fn minute_bucket(&self) -> NaiveDateTime {
        floor_to_minute(self.update_time)
    }
}

/// Floor a timestamp to its one-minute bucket.
pub fn floor_to_minute(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// A cluster of changes by one actor, in one table, within one minute.
///
/// Ephemeral: rebuilt from the current record collection on every analysis
/// request and discarded after rendering.
#[derive(Debug, Clone)]
pub struct ChangeSession {
    /// Calendar date of the session
    pub date: NaiveDate,
    /// Session time formatted `HH:MM`
    pub time: String,
    /// Resolved actor for the session
    pub actor: String,
    /// Table all member records came from
    pub source_table: String,
    /// Member records, ascending by `update_time`
    pub records: Vec<ChangeRecord>,
}

impl ChangeSession {
    /// Number of member records (before render-time skip filtering).
    pub fn change_count(&self) -> usize {
        self.records.len()
    }
}

/// Changes within a one-minute window, spanning tables and actors.
///
/// The simpler grouping variant used to build the chronological narrative
/// fed to the model.
#[derive(Debug, Clone)]
pub struct TimeBucket {
    /// Window start, floored to the minute
    pub bucket: NaiveDateTime,
    /// Member records in accumulation order
    pub records: Vec<ChangeRecord>,
}
