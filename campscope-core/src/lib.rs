//! # campscope-core
//!
//! Core library for campscope - a campaign change-log analyzer.
//!
//! This library provides:
//! - The table registry and per-table query builder
//! - Change retrieval and normalization across heterogeneous log tables
//! - Session grouping, net-change calculation, and summary statistics
//! - Text renderers for the UI table and the model prompt
//! - A streaming model client and the request orchestrator
//!
//! ## Architecture
//!
//! One analysis request flows left to right:
//!
//! ```text
//! registry ──► query builder ──► retriever ──► flat Vec<ChangeRecord>
//!                                                    │
//!                              ┌─────────────────────┼─────────────────┐
//!                              ▼                     ▼                 ▼
//!                       session grouper       net-change calc    summary stats
//!                              │                     │                 │
//!                              └──────────► renderers ◄────────────────┘
//!                                                │
//!                                     UI rows / model narrative
//! ```
//!
//! Nothing is persisted between requests; every analysis rebuilds its state
//! from the source-of-truth log tables.
//!
//! ## Example
//!
//! ```rust,no_run
//! use campscope_core::{analysis, Config};
//! use tokio::sync::mpsc;
//!
//! # async fn run() {
//! let config = Config::load().expect("failed to load config");
//! let (tx, mut rx) = mpsc::unbounded_channel();
//!
//! let request = analysis::AnalysisRequest {
//!     username: "reader".into(),
//!     password: "secret".into(),
//!     campaign_id: "42".into(),
//!     from_date: "2024-03-01".into(),
//!     to_date: "2024-03-02".into(),
//!     selected_tables: vec!["sp_campaign_details_v2_changes_log".into()],
//!     api_key: "sk-...".into(),
//! };
//!
//! tokio::spawn(analysis::run_analysis(config, request, tx));
//! while let Some(event) = rx.recv().await {
//!     // feed the UI
//! }
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analysis::{AnalysisEvent, AnalysisPhase, AnalysisRequest};
pub use config::Config;
pub use db::{ConnectionStatus, DbClient};
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analysis;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod netchange;
pub mod prompt;
pub mod query;
pub mod registry;
pub mod render;
pub mod retrieve;
pub mod sessions;
pub mod stats;
pub mod types;
pub mod validate;
