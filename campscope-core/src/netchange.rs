//! Net-change calculation: first-to-last deltas per field
//!
//! Collapses a field's entire change history, across sessions and tables,
//! into a single "from the first old value to the last new value" delta.
//! Fields whose edits cancel out over the window are dropped.

use std::collections::BTreeMap;

use crate::types::ChangeRecord;

/// Net effect of all changes to one field over the observed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetChange {
    /// `old_value` of the chronologically first record
    pub from: Option<String>,
    /// `new_value` of the chronologically last record
    pub to: Option<String>,
    /// Number of records contributing
    pub change_count: usize,
}

/// Compute net changes per field name.
///
/// A field is omitted entirely when its net delta is a no-op (`from == to`),
/// even if it was edited several times in between. A single-record field
/// qualifies unless that one edit was itself a no-op.
pub fn calculate_net_changes(records: &[ChangeRecord]) -> BTreeMap<String, NetChange> {
    let mut by_field: BTreeMap<String, Vec<&ChangeRecord>> = BTreeMap::new();
    for record in records {
        by_field
            .entry(record.field_name.clone())
            .or_default()
            .push(record);
    }

    let mut net: BTreeMap<String, NetChange> = BTreeMap::new();
    for (field, mut group) in by_field {
        group.sort_by_key(|r| r.update_time);

        let first = match group.first() {
            Some(r) => r,
            None => continue,
        };
        let last = match group.last() {
            Some(r) => r,
            None => continue,
        };

        let change = NetChange {
            from: first.old_value.clone(),
            to: last.new_value.clone(),
            change_count: group.len(),
        };

        if change.from == change.to {
            continue;
        }
        net.insert(field, change);
    }

    net
}
