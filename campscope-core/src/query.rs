//! Query builder: one parameterized SELECT per change-log table
//!
//! Only registry-sourced identifiers and literals are interpolated into the
//! query text; the campaign id and both interval bounds are bound parameters.

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::registry::{get_table_config, SpecialHandling, TARGETING_SENTINEL};

/// A query ready to run, with its ordered bind parameters.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    /// SQL text with `?` placeholders
    pub sql: String,
    /// First bind: campaign id
    pub campaign_id: i64,
    /// Second bind: inclusive lower bound, midnight of `from_date`
    pub from_ts: NaiveDateTime,
    /// Third bind: exclusive upper bound, midnight of the day after `to_date`
    pub to_ts: NaiveDateTime,
}

/// Build the SELECT for one table over a campaign and date range.
///
/// The date interval is half-open, `[from_date, to_date + 1 day)`, so that
/// `to_date` is inclusive at day granularity. Fails with
/// [`Error::UnknownTable`] when the table has no registry entry; batch
/// callers pre-filter instead of treating that as fatal.
pub fn build_query(
    table_name: &str,
    campaign_id: i64,
    from_date: NaiveDate,
    to_date: NaiveDate,
) -> Result<BuiltQuery> {
    let cfg = get_table_config(table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;

    let value_columns = match cfg.special_handling {
        // Targeting rows carry an action instead of a before/after pair; the
        // sentinel keeps the record shape symmetrical at the cost of the
        // "new value" semantics.
        Some(SpecialHandling::Targeting) => format!(
            "action AS old_value, '{TARGETING_SENTINEL}' AS new_value"
        ),
        None => "old_value, new_value".to_string(),
    };

    // CAST keeps the null literal decodable as a text column.
    let user_column = match cfg.update_user_column {
        Some(col) => format!("{col} AS update_user"),
        None => "CAST(NULL AS CHAR) AS update_user".to_string(),
    };

    let performer_column = match cfg.performer_column {
        Some(col) => format!("{col} AS performer"),
        None => "CAST(NULL AS CHAR) AS performer".to_string(),
    };

    let sql = format!(
        "SELECT '{table}' AS source_table, \
         CAST({id_col} AS SIGNED) AS campaign_id, \
         {field_col} AS field_name, \
         {value_columns}, \
         update_time, \
         {user_column}, \
         {performer_column} \
         FROM {table} \
         WHERE {id_col} = ? AND update_time >= ? AND update_time < ? \
         ORDER BY update_time DESC",
        table = table_name,
        id_col = cfg.campaign_id_column,
        field_col = cfg.field_name_column,
    );

    let from_ts = from_date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let to_ts = to_date
        .checked_add_days(Days::new(1))
        .unwrap_or(to_date)
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default();

    Ok(BuiltQuery {
        sql,
        campaign_id,
        from_ts,
        to_ts,
    })
}
