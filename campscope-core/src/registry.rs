//! Table registry: schema-adaptation metadata for the change-log tables
//!
//! Every queryable table is declared here, once, as a [`TableConfig`]. The
//! configs carry the per-table column names so that everything downstream of
//! retrieval can work with one record shape. New tables are new entries; a
//! table whose rows need a different *query shape* gets a
//! [`SpecialHandling`] tag, and the set of tags is kept deliberately small.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Declared width of a table's campaign-id column.
///
/// Informational only; retrieval casts to a signed 64-bit integer either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignIdType {
    Int,
    BigInt,
}

impl CampaignIdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignIdType::Int => "int",
            CampaignIdType::BigInt => "bigint",
        }
    }
}

/// Alternate query shapes for tables that do not record old/new value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialHandling {
    /// The table records targeting actions, not before/after values. The
    /// adapter selects the `action` column as `old_value` and manufactures a
    /// sentinel `new_value` so the record shape stays symmetrical.
    Targeting,
}

/// Sentinel written into `new_value` for targeting-action rows.
pub const TARGETING_SENTINEL: &str = "TARGETING_CHANGE";

/// Schema-adaptation metadata for one change-log table.
///
/// Immutable, compiled-in data; loaded once via [`table_configs`].
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Column holding the campaign identifier
    pub campaign_id_column: &'static str,
    /// Declared type of the campaign-id column
    pub campaign_id_type: CampaignIdType,
    /// Whether the table carries an actor column
    pub has_update_user: bool,
    /// Column holding the changed field's identifier
    pub field_name_column: &'static str,
    /// Actor column, when `has_update_user`
    pub update_user_column: Option<&'static str>,
    /// Alternate actor-attribution column, on tables that have one
    pub performer_column: Option<&'static str>,
    /// Alternate query shape, when the standard one does not fit
    pub special_handling: Option<SpecialHandling>,
    /// What the table records
    pub description: &'static str,
    /// Owning team
    pub owner: &'static str,
    /// Operational note
    pub note: &'static str,
}

/// Registered table names, in query order.
///
/// Retrieval iterates this slice, so it also fixes the tie-break order for
/// records sharing an `update_time`.
pub const ALL_TABLES: [&str; 4] = [
    "sp_campaign_details_v2_changes_log",
    "sp_campaign_targeting_v2_changes_log",
    "sp_campaign_creative_v2_changes_log",
    "sp_campaign_budget_v2_changes_log",
];

/// The full table registry, keyed by logical table name.
pub fn table_configs() -> &'static HashMap<&'static str, TableConfig> {
    static CONFIGS: OnceLock<HashMap<&'static str, TableConfig>> = OnceLock::new();
    CONFIGS.get_or_init(|| {
        let mut m = HashMap::new();
        m.insert(
            "sp_campaign_details_v2_changes_log",
            TableConfig {
                campaign_id_column: "campaign_id",
                campaign_id_type: CampaignIdType::Int,
                has_update_user: true,
                field_name_column: "field_name",
                update_user_column: Some("update_user"),
                performer_column: Some("performer"),
                special_handling: None,
                description: "Core campaign settings (name, status, bids, schedule)",
                owner: "campaign-platform",
                note: "highest-volume log; one row per field per save",
            },
        );
        m.insert(
            "sp_campaign_targeting_v2_changes_log",
            TableConfig {
                campaign_id_column: "campaign_id",
                campaign_id_type: CampaignIdType::BigInt,
                has_update_user: true,
                field_name_column: "rule_type",
                update_user_column: Some("update_user"),
                performer_column: None,
                special_handling: Some(SpecialHandling::Targeting),
                description: "Audience and geo targeting rule changes",
                owner: "targeting",
                note: "records actions, not value pairs; see the targeting query shape",
            },
        );
        m.insert(
            "sp_campaign_creative_v2_changes_log",
            TableConfig {
                campaign_id_column: "sp_campaign_id",
                campaign_id_type: CampaignIdType::BigInt,
                has_update_user: false,
                field_name_column: "feature",
                update_user_column: None,
                performer_column: None,
                special_handling: None,
                description: "Creative asset and copy revisions",
                owner: "creative-tools",
                note: "written by batch jobs; no actor column",
            },
        );
        m.insert(
            "sp_campaign_budget_v2_changes_log",
            TableConfig {
                campaign_id_column: "campaign_id",
                campaign_id_type: CampaignIdType::BigInt,
                has_update_user: true,
                field_name_column: "field_name",
                update_user_column: Some("update_user"),
                performer_column: Some("performer"),
                special_handling: None,
                description: "Budget, pacing, and spend-cap adjustments",
                owner: "campaign-platform",
                note: "",
            },
        );
        m
    })
}

/// Look up a single table config.
pub fn get_table_config(table_name: &str) -> Option<&'static TableConfig> {
    table_configs().get(table_name)
}

/// Descriptive metadata for UI table selection, in registry order.
pub fn available_tables() -> Vec<(&'static str, &'static TableConfig)> {
    ALL_TABLES
        .iter()
        .filter_map(|name| table_configs().get(name).map(|cfg| (*name, cfg)))
        .collect()
}

/// Human-friendly name for a table: strips the `_changes_log` suffix and
/// title-cases the rest.
pub fn display_name(table_name: &str) -> String {
    table_name
        .trim_end_matches("_changes_log")
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
