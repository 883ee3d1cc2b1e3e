//! Database client: a thin MySQL connection wrapper
//!
//! Owns the connection lifecycle for one analysis request. Credentials are
//! provided at connect time, never stored in configuration, and never
//! included in error messages; connection failures report only the target
//! host/port/database.

use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};
use crate::query::BuiltQuery;

/// Outcome of a connection probe, with target details for display.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionStatus {
    /// One-line status for the UI.
    pub fn describe(&self) -> String {
        if self.success {
            format!(
                "Connected to {}:{}/{}",
                self.host, self.port, self.database
            )
        } else {
            format!("Connection failed: {}", self.message)
        }
    }
}

/// MySQL client scoped to a single analysis request.
///
/// Not shared between requests; each request constructs, connects, and
/// disconnects its own client. Queries run sequentially on one connection.
pub struct DbClient {
    config: DatabaseConfig,
    pool: Option<MySqlPool>,
}

impl DbClient {
    /// Create an unconnected client for the configured target.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config, pool: None }
    }

    fn connect_options(&self, username: &str, password: &str) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .database(&self.config.database)
            .username(username)
            .password(password)
    }

    fn connection_error(&self, e: sqlx::Error) -> Error {
        Error::Connection {
            host: self.config.host.clone(),
            port: self.config.port,
            database: self.config.database.clone(),
            message: e.to_string(),
        }
    }

    /// Establish the connection with the provided credentials.
    pub async fn connect(&mut self, username: &str, password: &str) -> Result<()> {
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect_with(self.connect_options(username, password))
            .await
            .map_err(|e| self.connection_error(e))?;

        tracing::info!(
            host = %self.config.host,
            database = %self.config.database,
            "Database connection established"
        );
        self.pool = Some(pool);
        Ok(())
    }

    /// Close the connection. Safe to call when already disconnected.
    pub async fn disconnect(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            tracing::info!("Database connection closed");
        }
    }

    /// Whether a connection is currently open.
    pub fn is_connected(&self) -> bool {
        self.pool.as_ref().is_some_and(|p| !p.is_closed())
    }

    /// Probe the target with the given credentials and report status.
    ///
    /// Opens a short-lived connection, runs `SELECT 1`, and closes it; the
    /// client's own connection state is untouched.
    pub async fn test_connection(&self, username: &str, password: &str) -> ConnectionStatus {
        let mut status = ConnectionStatus {
            success: false,
            message: String::new(),
            host: self.config.host.clone(),
            port: self.config.port,
            database: self.config.database.clone(),
        };

        let probe = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .connect_with(self.connect_options(username, password))
            .await;

        match probe {
            Ok(pool) => match sqlx::query("SELECT 1").execute(&pool).await {
                Ok(_) => {
                    status.success = true;
                    status.message = "Connection successful".to_string();
                    pool.close().await;
                }
                Err(e) => {
                    status.message = e.to_string();
                    pool.close().await;
                }
            },
            Err(e) => {
                status.message = e.to_string();
            }
        }

        if !status.success {
            tracing::error!(
                host = %status.host,
                port = status.port,
                database = %status.database,
                message = %status.message,
                "Database connection test failed"
            );
        }
        status
    }

    /// Run a built query and return its raw rows.
    pub async fn fetch(&self, query: &BuiltQuery) -> Result<Vec<MySqlRow>> {
        let pool = self.pool.as_ref().ok_or_else(|| {
            Error::Config("no active database connection".to_string())
        })?;

        let rows = sqlx::query(&query.sql)
            .bind(query.campaign_id)
            .bind(query.from_ts)
            .bind(query.to_ts)
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }
}
