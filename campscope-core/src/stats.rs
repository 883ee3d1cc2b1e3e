//! Summary statistics over the flat change-record collection

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::types::ChangeRecord;

/// Aggregate counts for one analysis request. Ephemeral, rebuilt per request.
#[derive(Debug, Clone, Default)]
pub struct SummaryStats {
    /// Total change records
    pub total_changes: usize,
    /// Distinct field names
    pub unique_fields: usize,
    /// Distinct resolved actors
    pub unique_users: usize,
    /// Earliest record timestamp
    pub earliest: Option<NaiveDateTime>,
    /// Latest record timestamp
    pub latest: Option<NaiveDateTime>,
    /// Calendar days spanned by the records (inclusive)
    pub date_range_days: i64,
    /// Average records per spanned day
    pub changes_per_day: f64,
    /// Record count per source table, most active first
    pub table_counts: Vec<(String, usize)>,
    /// Most frequently changed fields, capped at the display limit
    pub top_fields: Vec<(String, usize)>,
    /// Busiest resolved actor and their record count
    pub most_active_user: Option<(String, usize)>,
}

/// Compute summary statistics for a record collection.
///
/// `top_fields_limit` caps the top-fields list; everything else covers the
/// full collection.
pub fn summarize(records: &[ChangeRecord], top_fields_limit: usize) -> SummaryStats {
    if records.is_empty() {
        return SummaryStats::default();
    }

    let mut field_counts: HashMap<&str, usize> = HashMap::new();
    let mut user_counts: HashMap<String, usize> = HashMap::new();
    let mut table_counts: HashMap<&str, usize> = HashMap::new();
    let mut earliest = records[0].update_time;
    let mut latest = records[0].update_time;

    for record in records {
        *field_counts.entry(record.field_name.as_str()).or_default() += 1;
        *user_counts.entry(record.resolved_actor()).or_default() += 1;
        *table_counts.entry(record.source_table.as_str()).or_default() += 1;
        earliest = earliest.min(record.update_time);
        latest = latest.max(record.update_time);
    }

    let date_range_days = (latest.date() - earliest.date()).num_days() + 1;
    let changes_per_day = records.len() as f64 / date_range_days as f64;

    let mut table_counts: Vec<(String, usize)> = table_counts
        .into_iter()
        .map(|(t, n)| (t.to_string(), n))
        .collect();
    table_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut top_fields: Vec<(String, usize)> = field_counts
        .into_iter()
        .map(|(f, n)| (f.to_string(), n))
        .collect();
    top_fields.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    let unique_fields = top_fields.len();
    top_fields.truncate(top_fields_limit);

    let unique_users = user_counts.len();
    let most_active_user = user_counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)));

    SummaryStats {
        total_changes: records.len(),
        unique_fields,
        unique_users,
        earliest: Some(earliest),
        latest: Some(latest),
        date_range_days,
        changes_per_day,
        table_counts,
        top_fields,
        most_active_user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(table: &str, field: &str, user: &str, day: u32) -> ChangeRecord {
        ChangeRecord {
            source_table: table.to_string(),
            campaign_id: 42,
            field_name: field.to_string(),
            old_value: Some("a".to_string()),
            new_value: Some("b".to_string()),
            update_time: NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            update_user: Some(user.to_string()),
            performer: None,
        }
    }

    #[test]
    fn test_empty_collection() {
        let stats = summarize(&[], 10);
        assert_eq!(stats.total_changes, 0);
        assert!(stats.earliest.is_none());
        assert!(stats.most_active_user.is_none());
    }

    #[test]
    fn test_counts_and_span() {
        let records = vec![
            record("t1", "budget", "alice", 1),
            record("t1", "budget", "alice", 2),
            record("t2", "cpc", "bob", 3),
        ];

        let stats = summarize(&records, 10);
        assert_eq!(stats.total_changes, 3);
        assert_eq!(stats.unique_fields, 2);
        assert_eq!(stats.unique_users, 2);
        assert_eq!(stats.date_range_days, 3);
        assert!((stats.changes_per_day - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.most_active_user, Some(("alice".to_string(), 2)));
        assert_eq!(stats.table_counts[0], ("t1".to_string(), 2));
    }

    #[test]
    fn test_top_fields_capped_but_unique_count_is_not() {
        let records = vec![
            record("t1", "a", "u", 1),
            record("t1", "b", "u", 1),
            record("t1", "c", "u", 1),
            record("t1", "a", "u", 1),
        ];

        let stats = summarize(&records, 2);
        assert_eq!(stats.unique_fields, 3);
        assert_eq!(stats.top_fields.len(), 2);
        assert_eq!(stats.top_fields[0], ("a".to_string(), 2));
    }

    #[test]
    fn test_single_day_span() {
        let records = vec![record("t1", "a", "u", 5)];
        let stats = summarize(&records, 10);
        assert_eq!(stats.date_range_days, 1);
        assert!((stats.changes_per_day - 1.0).abs() < f64::EPSILON);
    }
}
