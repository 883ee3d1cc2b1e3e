//! Fail-closed input validation for an analysis request
//!
//! Every required input is checked before any connection is opened or query
//! built; the first problem found aborts the request with a short
//! user-facing message and no partial work.

use chrono::NaiveDate;

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inputs that passed validation, with parsed types.
#[derive(Debug, Clone)]
pub struct ValidatedInputs {
    pub campaign_id: i64,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

/// Validate the full input set for a campaign analysis.
#[allow(clippy::too_many_arguments)]
pub fn validate_inputs(
    username: &str,
    password: &str,
    campaign_id: &str,
    from_date: &str,
    to_date: &str,
    selected_tables: &[String],
    api_key: &str,
) -> Result<ValidatedInputs> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(Error::Validation(
            "Please provide database username and password".to_string(),
        ));
    }
    if campaign_id.trim().is_empty() {
        return Err(Error::Validation(
            "Please provide a campaign ID".to_string(),
        ));
    }
    if from_date.trim().is_empty() || to_date.trim().is_empty() {
        return Err(Error::Validation(
            "Please provide both from and to dates".to_string(),
        ));
    }
    if selected_tables.is_empty() {
        return Err(Error::Validation(
            "Please select at least one table to query".to_string(),
        ));
    }
    if api_key.trim().is_empty() {
        return Err(Error::Validation(
            "Please provide a model API key".to_string(),
        ));
    }

    let campaign_id: i64 = campaign_id
        .trim()
        .parse()
        .map_err(|_| Error::Validation("Campaign ID must be a number".to_string()))?;
    if campaign_id < 1 {
        return Err(Error::Validation(
            "Campaign ID must be a positive number".to_string(),
        ));
    }

    let from_date = parse_date(from_date)?;
    let to_date = parse_date(to_date)?;

    if from_date > to_date {
        return Err(Error::Validation(
            "From date must not be after to date".to_string(),
        ));
    }

    Ok(ValidatedInputs {
        campaign_id,
        from_date,
        to_date,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::Validation("Dates must be in YYYY-MM-DD format".to_string()))
}
