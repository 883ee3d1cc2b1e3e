//! Analysis orchestrator: one request, start to finish
//!
//! Drives a single analysis request through its lifecycle,
//! `Validating → ConnectingDb → Querying → Aggregating → AwaitingModel →
//! StreamingModel → Finalized`, emitting [`AnalysisEvent`]s over an
//! unbounded channel as results become available. `Errored` is reachable
//! from any non-terminal phase; an empty query result terminates in the
//! distinct `NoData` phase.
//!
//! The request's database connection is owned here and released on every
//! exit path. If the driving task itself is torn down mid-flight, dropping
//! the client closes the pool.

use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::db::DbClient;
use crate::error::{Error, Result};
use crate::llm::{AnalysisResponse, ModelClient};
use crate::netchange::calculate_net_changes;
use crate::prompt;
use crate::registry::ALL_TABLES;
use crate::render::{
    changes_narrative, net_changes_narrative, session_table, stats_markdown, SessionRow,
};
use crate::retrieve::get_campaign_changes;
use crate::sessions::{group_by_time, group_by_user_and_date};
use crate::stats::summarize;
use crate::validate::validate_inputs;

/// Lifecycle phase of an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPhase {
    Idle,
    Validating,
    ConnectingDb,
    Querying,
    Aggregating,
    AwaitingModel,
    StreamingModel,
    /// Terminal: analysis complete
    Finalized,
    /// Terminal: nothing to show, which is not a failure
    NoData,
    /// Terminal: the request failed
    Errored,
}

impl AnalysisPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisPhase::Idle => "idle",
            AnalysisPhase::Validating => "validating inputs",
            AnalysisPhase::ConnectingDb => "connecting to database",
            AnalysisPhase::Querying => "querying change logs",
            AnalysisPhase::Aggregating => "aggregating changes",
            AnalysisPhase::AwaitingModel => "waiting for model",
            AnalysisPhase::StreamingModel => "streaming model analysis",
            AnalysisPhase::Finalized => "analysis complete",
            AnalysisPhase::NoData => "no changes found",
            AnalysisPhase::Errored => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AnalysisPhase::Finalized | AnalysisPhase::NoData | AnalysisPhase::Errored
        )
    }
}

/// Incremental output of a running analysis.
#[derive(Debug, Clone)]
pub enum AnalysisEvent {
    /// Lifecycle transition
    Phase(AnalysisPhase),
    /// Connection probe outcome, display-ready
    ConnectionStatus(String),
    /// Rendered session table rows
    SessionRows(Vec<SessionRow>),
    /// Rendered statistics markdown
    StatsText(String),
    /// The exact narrative handed to the model
    ModelInput(String),
    /// Best-effort rendering of the partial model response so far
    ModelPartial(String),
    /// Final model response, formatted (or the raw fallback)
    ModelFinal(String),
    /// Friendly empty-state message
    NoChanges(String),
    /// User-facing failure message
    Failed(String),
}

/// Everything a single analysis request needs, credentials included.
///
/// Credentials live only for the duration of the request; nothing here is
/// persisted or shared.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub username: String,
    pub password: String,
    pub campaign_id: String,
    pub from_date: String,
    pub to_date: String,
    pub selected_tables: Vec<String>,
    pub api_key: String,
}

enum Outcome {
    Completed,
    NoData,
}

/// Run one analysis request to completion, emitting events along the way.
///
/// Never panics and never leaves the connection open: every exit (success,
/// empty result, failure) passes through the disconnect below.
pub async fn run_analysis(
    config: Config,
    request: AnalysisRequest,
    tx: UnboundedSender<AnalysisEvent>,
) {
    let mut db = DbClient::new(config.database.clone());
    let outcome = drive(&config, &request, &mut db, &tx).await;
    db.disconnect().await;

    match outcome {
        Ok(Outcome::Completed) => {
            let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::Finalized));
        }
        Ok(Outcome::NoData) => {
            let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::NoData));
        }
        Err(e) => {
            tracing::error!(error = %e, "Analysis request failed");
            let _ = tx.send(AnalysisEvent::Failed(e.to_string()));
            let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::Errored));
        }
    }
}

async fn drive(
    config: &Config,
    request: &AnalysisRequest,
    db: &mut DbClient,
    tx: &UnboundedSender<AnalysisEvent>,
) -> Result<Outcome> {
    let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::Validating));
    let inputs = validate_inputs(
        &request.username,
        &request.password,
        &request.campaign_id,
        &request.from_date,
        &request.to_date,
        &request.selected_tables,
        &request.api_key,
    )?;

    // Built per request from the supplied key; no shared model state.
    let model = ModelClient::new(&request.api_key, &config.model)?;

    let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::ConnectingDb));
    let status = db.test_connection(&request.username, &request.password).await;
    let _ = tx.send(AnalysisEvent::ConnectionStatus(status.describe()));
    if !status.success {
        return Err(Error::Connection {
            host: status.host,
            port: status.port,
            database: status.database,
            message: status.message,
        });
    }
    db.connect(&request.username, &request.password).await?;

    let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::Querying));
    let records = get_campaign_changes(
        db,
        inputs.campaign_id,
        inputs.from_date,
        inputs.to_date,
        Some(&request.selected_tables),
    )
    .await?;

    if records.is_empty() {
        let _ = tx.send(AnalysisEvent::NoChanges(format!(
            "No changes found for campaign ID {}",
            inputs.campaign_id
        )));
        return Ok(Outcome::NoData);
    }

    let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::Aggregating));
    let sessions = group_by_user_and_date(&records);
    let rows = session_table(&sessions, config.display.max_value_length);
    let _ = tx.send(AnalysisEvent::SessionRows(rows));

    let stats = summarize(&records, config.display.top_fields_limit);
    let _ = tx.send(AnalysisEvent::StatsText(stats_markdown(
        &stats,
        &request.from_date,
        &request.to_date,
        request.selected_tables.len(),
        ALL_TABLES.len(),
    )));

    let buckets = group_by_time(&records);
    let narrative = changes_narrative(&buckets);
    let net_text = net_changes_narrative(&calculate_net_changes(&records));
    let _ = tx.send(AnalysisEvent::ModelInput(narrative.clone()));

    let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::AwaitingModel));
    let user_text = prompt::user_prompt(&narrative, inputs.campaign_id, &net_text);

    let mut buffer = String::new();
    let mut streaming = false;
    let full = model
        .stream_analysis(prompt::system_prompt(), &user_text, |chunk| {
            if !streaming {
                streaming = true;
                let _ = tx.send(AnalysisEvent::Phase(AnalysisPhase::StreamingModel));
            }
            buffer.push_str(chunk);
            let _ = tx.send(AnalysisEvent::ModelPartial(AnalysisResponse::format_partial(
                &buffer,
            )));
        })
        .await?;

    // Strict parse of the finished buffer; on failure the raw text is shown
    // with an error annotation instead of being discarded.
    let final_text = match AnalysisResponse::parse_final(&full) {
        Ok(response) => response.to_formatted_text(),
        Err(e) => format!(
            "Analysis post-processing failed: {}\n\nRaw response:\n{}",
            e, full
        ),
    };
    let _ = tx.send(AnalysisEvent::ModelFinal(final_text));

    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            username: "user".to_string(),
            password: "pw".to_string(),
            campaign_id: "42".to_string(),
            from_date: "2024-03-01".to_string(),
            to_date: "2024-03-02".to_string(),
            selected_tables: vec!["sp_campaign_details_v2_changes_log".to_string()],
            api_key: "sk-test".to_string(),
        }
    }

    #[test]
    fn test_phase_terminality() {
        assert!(AnalysisPhase::Finalized.is_terminal());
        assert!(AnalysisPhase::NoData.is_terminal());
        assert!(AnalysisPhase::Errored.is_terminal());
        assert!(!AnalysisPhase::Querying.is_terminal());
        assert!(!AnalysisPhase::Idle.is_terminal());
    }

    #[tokio::test]
    async fn test_validation_fails_closed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bad = request();
        bad.campaign_id = "not-a-number".to_string();

        run_analysis(Config::default(), bad, tx).await;

        let mut saw_failed = false;
        let mut last_phase = AnalysisPhase::Idle;
        while let Ok(event) = rx.try_recv() {
            match event {
                AnalysisEvent::Failed(msg) => {
                    saw_failed = true;
                    assert!(msg.contains("number"));
                }
                AnalysisEvent::Phase(p) => last_phase = p,
                // Validation failure must not produce any partial results.
                AnalysisEvent::SessionRows(_)
                | AnalysisEvent::StatsText(_)
                | AnalysisEvent::ModelInput(_) => {
                    panic!("partial work after validation failure")
                }
                _ => {}
            }
        }
        assert!(saw_failed);
        assert_eq!(last_phase, AnalysisPhase::Errored);
    }

    #[tokio::test]
    async fn test_unreachable_database_errors_with_target_details() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = Config::default();
        config.database.host = "127.0.0.1".to_string();
        config.database.port = 1; // nothing listens here
        config.database.connect_timeout_secs = 1;

        run_analysis(config, request(), tx).await;

        let mut failure = String::new();
        let mut last_phase = AnalysisPhase::Idle;
        while let Ok(event) = rx.try_recv() {
            match event {
                AnalysisEvent::Failed(msg) => failure = msg,
                AnalysisEvent::Phase(p) => last_phase = p,
                _ => {}
            }
        }
        assert_eq!(last_phase, AnalysisPhase::Errored);
        assert!(failure.contains("127.0.0.1"), "failure was: {failure}");
        // Target details only, never credentials.
        assert!(!failure.contains("user"), "failure was: {failure}");
        assert!(!failure.contains("pw"), "failure was: {failure}");
    }
}
