//! Integration tests for the change-aggregation pipeline
//!
//! These exercise the flat-record → grouping → rendering flow end to end
//! using in-memory fixtures. Database and model calls are covered by their
//! own modules; nothing here needs a network.

use campscope_core::netchange::calculate_net_changes;
use campscope_core::registry::TARGETING_SENTINEL;
use campscope_core::render::{
    changes_narrative, net_changes_narrative, session_table, SessionRow, NO_NET_CHANGES,
};
use campscope_core::sessions::{group_by_time, group_by_user_and_date};
use campscope_core::stats::summarize;
use campscope_core::types::ChangeRecord;
use chrono::{NaiveDate, NaiveDateTime};

fn ts(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn record(
    table: &str,
    field: &str,
    old: &str,
    new: &str,
    time: NaiveDateTime,
    performer: Option<&str>,
    update_user: Option<&str>,
) -> ChangeRecord {
    ChangeRecord {
        source_table: table.to_string(),
        campaign_id: 42,
        field_name: field.to_string(),
        old_value: Some(old.to_string()),
        new_value: Some(new.to_string()),
        update_time: time,
        update_user: update_user.map(str::to_string),
        performer: performer.map(str::to_string),
    }
}

/// A realistic two-day editing history across three tables.
fn fixture_records() -> Vec<ChangeRecord> {
    vec![
        // Day 2, 10:00: alice (as performer) adjusts budget and bid together
        record(
            "sp_campaign_budget_v2_changes_log",
            "daily_budget",
            "100",
            "150",
            ts(2, 10, 0, 5),
            Some("alice"),
            Some("bob"),
        ),
        record(
            "sp_campaign_budget_v2_changes_log",
            "max_bid",
            "0.50",
            "0.65",
            ts(2, 10, 0, 40),
            Some("alice"),
            Some("bob"),
        ),
        // Day 2, 10:00: a targeting action lands in the same minute
        record(
            "sp_campaign_targeting_v2_changes_log",
            "geo_rule",
            "ADD:US-CA",
            TARGETING_SENTINEL,
            ts(2, 10, 0, 22),
            None,
            Some("bob"),
        ),
        // Day 1: carol renames the campaign, then reverts it
        record(
            "sp_campaign_details_v2_changes_log",
            "campaign_name",
            "Spring Sale",
            "Summer Sale",
            ts(1, 9, 15, 0),
            None,
            Some("carol"),
        ),
        record(
            "sp_campaign_details_v2_changes_log",
            "campaign_name",
            "Summer Sale",
            "Spring Sale",
            ts(1, 17, 45, 0),
            None,
            Some("carol"),
        ),
        // Day 1: a batch job with no actor rewrites the budget in place
        record(
            "sp_campaign_budget_v2_changes_log",
            "daily_budget",
            "100",
            "100",
            ts(1, 3, 0, 0),
            None,
            None,
        ),
    ]
}

// ============================================
// Grouping properties
// ============================================

#[test]
fn test_user_date_grouping_partitions_the_input() {
    let records = fixture_records();
    let sessions = group_by_user_and_date(&records);

    let regrouped: usize = sessions.iter().map(|s| s.records.len()).sum();
    assert_eq!(regrouped, records.len(), "no record dropped or duplicated");

    let mut input_fields: Vec<_> = records.iter().map(|r| &r.field_name).collect();
    let mut output_fields: Vec<_> = sessions
        .iter()
        .flat_map(|s| s.records.iter().map(|r| &r.field_name))
        .collect();
    input_fields.sort();
    output_fields.sort();
    assert_eq!(input_fields, output_fields);
}

#[test]
fn test_sessions_split_on_actor_even_in_same_minute() {
    let sessions = group_by_user_and_date(&fixture_records());

    // Day 2, 10:00 holds two sessions: alice's budget edits (performer wins
    // over update_user) and bob's targeting action in another table.
    let day2: Vec<_> = sessions
        .iter()
        .filter(|s| s.date == NaiveDate::from_ymd_opt(2024, 3, 2).unwrap())
        .collect();
    assert_eq!(day2.len(), 2);

    let alice = day2.iter().find(|s| s.actor == "alice").expect("alice session");
    assert_eq!(alice.source_table, "sp_campaign_budget_v2_changes_log");
    assert_eq!(alice.records.len(), 2);

    let bob = day2.iter().find(|s| s.actor == "bob").expect("bob session");
    assert_eq!(bob.source_table, "sp_campaign_targeting_v2_changes_log");
}

#[test]
fn test_session_ordering_newest_first_members_chronological() {
    let sessions = group_by_user_and_date(&fixture_records());

    // Most recent session first
    assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    let last = sessions.last().expect("nonempty");
    assert_eq!(last.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

    // Inside alice's 10:00 session, :05 renders before :40
    let alice = sessions
        .iter()
        .find(|s| s.actor == "alice")
        .expect("alice session");
    assert_eq!(alice.records[0].update_time, ts(2, 10, 0, 5));
    assert_eq!(alice.records[1].update_time, ts(2, 10, 0, 40));
}

#[test]
fn test_time_grouping_spans_tables_within_a_minute() {
    let buckets = group_by_time(&fixture_records());

    // Newest bucket is day 2, 10:00, holding all three records of that minute
    assert_eq!(buckets[0].bucket, ts(2, 10, 0, 0));
    assert_eq!(buckets[0].records.len(), 3);

    let tables: Vec<_> = buckets[0]
        .records
        .iter()
        .map(|r| r.source_table.as_str())
        .collect();
    assert!(tables.contains(&"sp_campaign_targeting_v2_changes_log"));
}

// ============================================
// Net-change properties
// ============================================

#[test]
fn test_net_changes_over_the_fixture() {
    let net = calculate_net_changes(&fixture_records());

    // campaign_name was renamed and reverted: net no-op, omitted
    assert!(!net.contains_key("campaign_name"));

    // daily_budget: 100 → 150 across two records (one of them a no-op edit)
    let budget = &net["daily_budget"];
    assert_eq!(budget.from.as_deref(), Some("100"));
    assert_eq!(budget.to.as_deref(), Some("150"));
    assert_eq!(budget.change_count, 2);

    // change_count always equals the number of records for the field
    assert_eq!(net["max_bid"].change_count, 1);
    assert_eq!(net["geo_rule"].change_count, 1);
}

#[test]
fn test_targeting_rows_keep_the_sentinel_value() {
    let net = calculate_net_changes(&fixture_records());
    assert_eq!(net["geo_rule"].to.as_deref(), Some(TARGETING_SENTINEL));
}

// ============================================
// Rendering
// ============================================

#[test]
fn test_session_table_shape() {
    let sessions = group_by_user_and_date(&fixture_records());
    let rows = session_table(&sessions, 100);

    // 5 sessions, 6 changes → 11 rows; every session leads with a header
    let headers: Vec<_> = rows
        .iter()
        .filter(|r| matches!(r, SessionRow::Header { .. }))
        .collect();
    assert_eq!(headers.len(), 5);
    assert_eq!(rows.len(), 11);
    assert!(matches!(rows[0], SessionRow::Header { .. }));

    match &rows[0] {
        SessionRow::Header {
            date, change_note, ..
        } => {
            assert_eq!(date, "2024-03-02");
            assert!(change_note.contains("changes in this session"));
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_narrative_covers_every_bucket() {
    let buckets = group_by_time(&fixture_records());
    let text = changes_narrative(&buckets);

    assert!(text.contains(&format!("Total change sessions: {}", buckets.len())));
    assert!(text.contains("daily_budget: '100' → '150' (by alice)"));
    assert!(text.contains("(by System/Unknown)"));
    // Day-1 3am batch edit shows up in its own session block
    assert!(text.contains("Time: 2024-03-01 03:00"));
}

#[test]
fn test_net_narrative_counts_multi_edit_fields() {
    let text = net_changes_narrative(&calculate_net_changes(&fixture_records()));
    assert!(text.contains("- daily_budget: Changed from \"100\" to \"150\" (across 2 changes)"));
    assert!(!text.contains("campaign_name"));

    let empty = net_changes_narrative(&calculate_net_changes(&[]));
    assert_eq!(empty, NO_NET_CHANGES);
}

// ============================================
// Statistics
// ============================================

#[test]
fn test_summary_stats_over_the_fixture() {
    let stats = summarize(&fixture_records(), 10);

    assert_eq!(stats.total_changes, 6);
    assert_eq!(stats.unique_fields, 4);
    // alice, bob, carol, System/Unknown
    assert_eq!(stats.unique_users, 4);
    assert_eq!(stats.date_range_days, 2);
    assert_eq!(
        stats.table_counts[0],
        ("sp_campaign_budget_v2_changes_log".to_string(), 3)
    );
    let (_, top_count) = &stats.top_fields[0];
    assert_eq!(*top_count, 2);
}
