//! Session grouping over the flat change-record collection
//!
//! Two grouping strategies, both pure functions:
//!
//! - [`group_by_time`]: one-minute buckets regardless of actor/table, newest
//!   first. Feeds the chronological narrative sent to the model.
//! - [`group_by_user_and_date`]: (date, resolved actor, minute, table)
//!   sessions for the UI table, newest session first with members in
//!   chronological order inside each session.
//!
//! A "session" approximates one human edit action: the source system records
//! a multi-field save as several single-field rows with near-identical
//! timestamps, and one-minute granularity tolerates commit skew across
//! tables without merging unrelated edits. The two strategies intentionally
//! bucket differently; they serve different consumers and are kept apart.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::types::{ChangeRecord, ChangeSession, TimeBucket};

/// Bucket records by `update_time` floored to the minute, newest bucket
/// first. Records inside a bucket keep their input order and may span
/// tables and actors.
pub fn group_by_time(records: &[ChangeRecord]) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<NaiveDateTime, Vec<ChangeRecord>> = BTreeMap::new();

    for record in records {
        buckets
            .entry(record.minute_bucket())
            .or_default()
            .push(record.clone());
    }

    buckets
        .into_iter()
        .rev()
        .map(|(bucket, records)| TimeBucket { bucket, records })
        .collect()
}

/// Group records into edit sessions keyed by (date, resolved actor, minute
/// bucket, source table).
///
/// The session list is sorted newest first; member records inside each
/// session are sorted oldest first, matching how a human reads one edit
/// action top to bottom. Skip-field stripping is *not* applied here: every
/// record participates in grouping and stays in the session; renderers
/// filter at display time.
pub fn group_by_user_and_date(records: &[ChangeRecord]) -> Vec<ChangeSession> {
    type SessionKey = (NaiveDate, String, NaiveDateTime, String);
    let mut groups: BTreeMap<SessionKey, Vec<ChangeRecord>> = BTreeMap::new();

    for record in records {
        let bucket = record.minute_bucket();
        let key = (
            bucket.date(),
            record.resolved_actor(),
            bucket,
            record.source_table.clone(),
        );
        groups.entry(key).or_default().push(record.clone());
    }

    let mut sessions: Vec<ChangeSession> = groups
        .into_iter()
        .map(|((date, actor, bucket, source_table), mut members)| {
            members.sort_by_key(|r| r.update_time);
            ChangeSession {
                date,
                time: bucket.format("%H:%M").to_string(),
                actor,
                source_table,
                records: members,
            }
        })
        .collect();

    // Newest session first; actor then table break timestamp ties so the
    // ordering is deterministic.
    sessions.sort_by(|a, b| {
        (b.date, &b.time)
            .cmp(&(a.date, &a.time))
            .then_with(|| a.actor.cmp(&b.actor))
            .then_with(|| a.source_table.cmp(&b.source_table))
    });

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(
        table: &str,
        field: &str,
        time: NaiveDateTime,
        performer: Option<&str>,
        update_user: Option<&str>,
    ) -> ChangeRecord {
        ChangeRecord {
            source_table: table.to_string(),
            campaign_id: 42,
            field_name: field.to_string(),
            old_value: Some("old".to_string()),
            new_value: Some("new".to_string()),
            update_time: time,
            update_user: update_user.map(str::to_string),
            performer: performer.map(str::to_string),
        }
    }

    #[test]
    fn test_group_by_time_minute_buckets_newest_first() {
        let records = vec![
            record("t1", "a", ts(1, 10, 0, 5), None, Some("bob")),
            record("t2", "b", ts(1, 10, 0, 40), None, Some("alice")),
            record("t1", "c", ts(2, 9, 30, 0), None, Some("bob")),
        ];

        let buckets = group_by_time(&records);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].bucket, ts(2, 9, 30, 0));
        assert_eq!(buckets[1].bucket, ts(1, 10, 0, 0));
        // Same minute, different tables: one bucket with both records.
        assert_eq!(buckets[1].records.len(), 2);
    }

    #[test]
    fn test_sessions_split_by_actor_and_table() {
        let same_minute = ts(1, 10, 0, 10);
        let records = vec![
            record("t1", "a", same_minute, None, Some("bob")),
            record("t1", "b", same_minute, None, Some("alice")),
            record("t2", "c", same_minute, None, Some("bob")),
        ];

        let sessions = group_by_user_and_date(&records);
        assert_eq!(sessions.len(), 3);
    }

    #[test]
    fn test_sessions_newest_first_members_oldest_first() {
        let records = vec![
            record("t1", "a", ts(1, 10, 0, 40), None, Some("bob")),
            record("t1", "b", ts(1, 10, 0, 5), None, Some("bob")),
            record("t1", "c", ts(2, 8, 0, 0), None, Some("bob")),
        ];

        let sessions = group_by_user_and_date(&records);
        assert_eq!(sessions.len(), 2);
        // 2024-03-02 sorts before 2024-03-01
        assert_eq!(sessions[0].date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        // Within the 10:00 session, :05 precedes :40
        let members = &sessions[1].records;
        assert_eq!(members[0].update_time, ts(1, 10, 0, 5));
        assert_eq!(members[1].update_time, ts(1, 10, 0, 40));
    }

    #[test]
    fn test_grouping_partitions_the_input() {
        let records = vec![
            record("t1", "a", ts(1, 10, 0, 5), Some("alice"), Some("bob")),
            record("t1", "update_user", ts(1, 10, 0, 6), None, Some("bob")),
            record("t2", "b", ts(1, 11, 2, 0), None, None),
            record("t1", "c", ts(2, 9, 0, 0), None, Some("carol")),
        ];

        let sessions = group_by_user_and_date(&records);
        let total: usize = sessions.iter().map(|s| s.records.len()).sum();
        // Skip fields are stripped at render time only; grouping keeps them.
        assert_eq!(total, records.len());

        let mut fields: Vec<String> = sessions
            .iter()
            .flat_map(|s| s.records.iter().map(|r| r.field_name.clone()))
            .collect();
        fields.sort();
        assert_eq!(fields, vec!["a", "b", "c", "update_user"]);
    }

    #[test]
    fn test_session_header_fields() {
        let records = vec![record("t1", "a", ts(1, 14, 30, 22), Some("alice"), None)];
        let sessions = group_by_user_and_date(&records);
        assert_eq!(sessions[0].time, "14:30");
        assert_eq!(sessions[0].actor, "alice");
        assert_eq!(sessions[0].source_table, "t1");
        assert_eq!(sessions[0].change_count(), 1);
    }
}
