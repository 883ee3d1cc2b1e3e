//! Text renderers for grouped and aggregated change data
//!
//! Three consumers, three shapes:
//! - [`session_table`]: display-ready rows for the UI session table
//! - [`changes_narrative`]: chronological plain text for the model prompt
//! - [`net_changes_narrative`]: compact net-change bullets for the prompt
//! - [`stats_markdown`]: the statistics panel
//!
//! Rendering is where the bookkeeping skip fields are stripped; grouping
//! upstream keeps every record.

use std::collections::BTreeMap;

use crate::netchange::NetChange;
use crate::registry::display_name;
use crate::stats::SummaryStats;
use crate::types::{ChangeSession, TimeBucket};

/// Shown in narratives for a null or empty value.
const EMPTY_VALUE: &str = "[empty]";

/// Fixed sentence emitted when no net change survives filtering.
pub const NO_NET_CHANGES: &str = "No significant net changes detected in the selected period.";

/// One row of the UI session table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRow {
    /// Bold session header; `change_note` goes in the new-value column.
    Header {
        date: String,
        time: String,
        actor: String,
        table: String,
        change_note: String,
    },
    /// One member change of the session above.
    Change {
        field: String,
        old_value: String,
        new_value: String,
    },
}

/// Truncate text to `max` characters, ellipsis included.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Render sessions as a header-plus-members row sequence.
///
/// Skip fields are filtered here; a session left with no renderable change
/// is omitted entirely, header included.
pub fn session_table(sessions: &[ChangeSession], max_value_len: usize) -> Vec<SessionRow> {
    let mut rows = Vec::new();

    for session in sessions {
        let renderable: Vec<_> = session
            .records
            .iter()
            .filter(|r| r.is_renderable())
            .collect();
        if renderable.is_empty() {
            continue;
        }

        rows.push(SessionRow::Header {
            date: session.date.format("%Y-%m-%d").to_string(),
            time: session.time.clone(),
            actor: session.actor.clone(),
            table: display_name(&session.source_table),
            change_note: format!("*{} changes in this session*", renderable.len()),
        });

        for record in renderable {
            rows.push(SessionRow::Change {
                field: record.field_name.clone(),
                old_value: truncate(record.old_value.as_deref().unwrap_or(""), max_value_len),
                new_value: truncate(record.new_value.as_deref().unwrap_or(""), max_value_len),
            });
        }
    }

    rows
}

fn narrative_value(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => EMPTY_VALUE,
    }
}

/// Render time buckets as the chronological narrative fed to the model.
pub fn changes_narrative(buckets: &[TimeBucket]) -> String {
    if buckets.is_empty() {
        return "No changes found for this campaign.".to_string();
    }

    let mut text = String::from("Campaign Changes Analysis:\n");
    text.push_str(&format!("Total change sessions: {}\n\n", buckets.len()));

    for (i, bucket) in buckets.iter().enumerate() {
        text.push_str(&format!("Session {}:\n", i + 1));
        text.push_str(&format!(
            "  Time: {}\n",
            bucket.bucket.format("%Y-%m-%d %H:%M")
        ));
        text.push_str(&format!(
            "  Changes: {} fields modified\n",
            bucket.records.len()
        ));

        // A bucket may span tables; keep the diffs grouped per table.
        let mut by_table: BTreeMap<&str, Vec<&crate::types::ChangeRecord>> = BTreeMap::new();
        for record in &bucket.records {
            by_table
                .entry(record.source_table.as_str())
                .or_default()
                .push(record);
        }

        for (table, records) in by_table {
            text.push_str(&format!("  [{}]\n", display_name(table)));
            for record in records {
                text.push_str(&format!(
                    "    - {}: '{}' → '{}' (by {})\n",
                    record.field_name,
                    narrative_value(record.old_value.as_deref()),
                    narrative_value(record.new_value.as_deref()),
                    record.resolved_actor(),
                ));
            }
        }

        text.push('\n');
    }

    text
}

/// Render net changes as one bullet per surviving field.
pub fn net_changes_narrative(net: &BTreeMap<String, NetChange>) -> String {
    if net.is_empty() {
        return NO_NET_CHANGES.to_string();
    }

    let mut text = String::new();
    for (field, change) in net {
        text.push_str(&format!(
            "- {}: Changed from \"{}\" to \"{}\"",
            field,
            narrative_value(change.from.as_deref()),
            narrative_value(change.to.as_deref()),
        ));
        if change.change_count > 1 {
            text.push_str(&format!(" (across {} changes)", change.change_count));
        }
        text.push('\n');
    }
    text
}

/// Render the statistics panel as markdown.
pub fn stats_markdown(
    stats: &SummaryStats,
    from_date: &str,
    to_date: &str,
    selected_tables: usize,
    available_tables: usize,
) -> String {
    let mut text = String::from("## Analysis Summary\n\n");

    text.push_str("### Date Range\n");
    text.push_str(&format!("- **From:** {}\n", from_date));
    text.push_str(&format!("- **To:** {}\n", to_date));
    text.push_str(&format!(
        "- **Selected Tables:** {} of {} available\n\n",
        selected_tables, available_tables
    ));

    text.push_str("### Overall Statistics\n");
    text.push_str(&format!("- **Total Changes:** {}\n", stats.total_changes));
    text.push_str(&format!(
        "- **Unique Fields Modified:** {}\n",
        stats.unique_fields
    ));
    text.push_str(&format!(
        "- **Date Range (Days):** {}\n",
        stats.date_range_days
    ));
    text.push_str(&format!(
        "- **Average Changes/Day:** {:.1}\n\n",
        stats.changes_per_day
    ));

    text.push_str("### Changes by Data Source\n");
    if stats.table_counts.is_empty() {
        text.push_str("- No changes found in selected tables\n");
    } else {
        for (table, count) in &stats.table_counts {
            let percentage = 100.0 * *count as f64 / stats.total_changes.max(1) as f64;
            text.push_str(&format!(
                "- **{}:** {} changes ({:.1}%)\n",
                display_name(table),
                count,
                percentage
            ));
        }
    }

    text.push_str("\n### User Activity\n");
    text.push_str(&format!("- **Active Users:** {}\n", stats.unique_users));
    match &stats.most_active_user {
        Some((user, count)) => {
            text.push_str(&format!(
                "- **Most Active User:** {} ({} changes)\n",
                user, count
            ));
        }
        None => text.push_str("- **Most Active User:** N/A\n"),
    }

    text.push_str("\n### Top Modified Fields\n");
    if stats.top_fields.is_empty() {
        text.push_str("- No field data available\n");
    } else {
        for (field, count) in &stats.top_fields {
            text.push_str(&format!("- **{}:** {} changes\n", field, count));
        }
    }

    text
}
