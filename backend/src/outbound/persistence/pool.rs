//! Shared `bb8` pool of `diesel-async` PostgreSQL connections.
//!
//! Every repository holds a clone of [`DbPool`] and checks out one
//! connection per port call. Checkout and build failures surface as
//! [`PoolError`], which the repositories report as connection errors.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::debug;

const SERVER_MAX_SIZE: u32 = 8;
const SERVER_MIN_IDLE: u32 = 1;
const SERVER_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
const BATCH_MAX_SIZE: u32 = 2;
const BATCH_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("no database connection available: {message}")]
    Checkout { message: String },
    #[error("cannot open database pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool sizing and checkout limits.
///
/// [`PoolConfig::new`] suits the HTTP server; [`PoolConfig::for_batch_job`]
/// keeps one-shot job runs to two connections and no idle ones.
///
/// ```ignore
/// let config = PoolConfig::for_batch_job("postgres://verein@localhost/arbeitsplan");
/// let pool = DbPool::new(config).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: SERVER_MAX_SIZE,
            min_idle: Some(SERVER_MIN_IDLE),
            connection_timeout: SERVER_CHECKOUT_TIMEOUT,
        }
    }

    pub fn for_batch_job(database_url: impl Into<String>) -> Self {
        Self {
            max_size: BATCH_MAX_SIZE,
            min_idle: None,
            connection_timeout: BATCH_CHECKOUT_TIMEOUT,
            ..Self::new(database_url)
        }
    }

    /// Cap the pool; an idle floor above the cap is lowered with it.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self.min_idle = self.min_idle.map(|idle| idle.min(self.max_size));
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Async connection pool handed to every Diesel repository.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] for an unusable URL or when the idle floor
    /// cannot be filled.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let PoolConfig {
            database_url,
            max_size,
            min_idle,
            connection_timeout,
        } = config;
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(max_size)
            .min_idle(min_idle)
            .connection_timeout(connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        debug!(max_size, ?min_idle, "database pool opened");
        Ok(Self { inner })
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] when none frees up within the timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "postgres://verein@localhost/arbeitsplan";

    #[rstest]
    fn server_defaults_keep_one_connection_warm() {
        let config = PoolConfig::new(URL);

        assert_eq!(config.database_url(), URL);
        assert_eq!(
            (config.max_size, config.min_idle, config.connection_timeout),
            (8, Some(1), Duration::from_secs(10))
        );
    }

    #[rstest]
    fn batch_jobs_hold_no_idle_connections() {
        let config = PoolConfig::for_batch_job(URL);

        assert_eq!((config.max_size, config.min_idle), (2, None));
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case(4, Some(1), 4)]
    #[case(0, Some(0), 1)]
    fn max_size_is_at_least_one_and_bounds_idle(
        #[case] requested: u32,
        #[case] idle: Option<u32>,
        #[case] expected: u32,
    ) {
        let config = PoolConfig::new(URL).with_max_size(requested);

        assert_eq!(config.max_size, expected);
        assert_eq!(config.min_idle, idle);
    }

    #[rstest]
    #[case(PoolError::checkout("timed out"), "no database connection available: timed out")]
    #[case(PoolError::build("invalid port"), "cannot open database pool: invalid port")]
    fn errors_name_the_failing_step(#[case] error: PoolError, #[case] rendered: &str) {
        assert_eq!(error.to_string(), rendered);
    }
}
