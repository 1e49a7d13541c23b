//! PostgreSQL pools for the two sides of the indexer.
//!
//! The ingestion driver and the API each get their own pool so a burst of
//! queries never starves the writer. Both pools cap statement run time on
//! the server with `statement_timeout`.

use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

use wheel_core::error::{StorageError, StorageResult};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Pool settings for one side of the process.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller may wait for a free connection.
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Server-side limit on a single statement.
    pub statement_timeout: Duration,
}

impl DatabaseConfig {
    /// The writer runs one insert at a time, plus the unique-index bootstrap
    /// and migrations, which may take a while on a large table.
    pub fn for_indexer(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
            statement_timeout: Duration::from_secs(120),
        }
    }

    /// Concurrent read-only aggregates; fail fast instead of queueing.
    pub fn for_api(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 15,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(900),
            statement_timeout: Duration::from_secs(10),
        }
    }

    fn connect_options(&self) -> StorageResult<PgConnectOptions> {
        let options: PgConnectOptions = self
            .url
            .parse()
            .map_err(|e: sqlx::Error| StorageError::ConnectionError(e.to_string()))?;

        Ok(options.options([(
            "statement_timeout",
            format!("{}ms", self.statement_timeout.as_millis()),
        )]))
    }
}

/// Handle over one connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[instrument(skip_all, fields(max_conn = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        let options = config.connect_options()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .max_lifetime(Some(config.max_lifetime))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        debug!(
            statement_timeout_ms = config.statement_timeout.as_millis() as u64,
            "Connection pool ready"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded `wheel_records` migrations.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> StorageResult<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::MigrationError(e.to_string()))?;

        info!(known = MIGRATOR.iter().count(), "Schema up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_pool_fails_fast() {
        let indexer = DatabaseConfig::for_indexer("postgres://db/wheel");
        let api = DatabaseConfig::for_api("postgres://db/wheel");

        assert_eq!(api.url, "postgres://db/wheel");
        assert!(api.max_connections > indexer.max_connections);
        assert!(api.acquire_timeout < indexer.acquire_timeout);
        assert!(api.statement_timeout < indexer.statement_timeout);
    }

    #[test]
    fn test_connect_options_keep_url_target() {
        let options = DatabaseConfig::for_api("postgres://wheel:secret@db:5433/wheel")
            .connect_options()
            .unwrap();

        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("wheel"));
    }

    #[test]
    fn test_bad_url_is_connection_error() {
        let err = DatabaseConfig::for_indexer("not a url")
            .connect_options()
            .unwrap_err();

        assert!(matches!(err, StorageError::ConnectionError(_)));
    }
}
