//! Application settings loaded via OrthoConfig.
//!
//! Every value can come from the environment (`ARBEITSPLAN_*`), a
//! configuration file or the command line; unset values fall back to the
//! club defaults below.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{CODED_QUOTA_THRESHOLD, DEFAULT_QUOTA, Hours, HoursError, JobSettings};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_PENDING_REMINDER_DAYS: u32 = 7;

/// Reasons the loaded settings cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("ARBEITSPLAN_DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    #[error("invalid {field}: {source}")]
    Hours {
        field: &'static str,
        source: HoursError,
    },
}

/// Server and batch job configuration.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ARBEITSPLAN")]
pub struct AppSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Address the HTTP server listens on.
    pub bind_addr: Option<String>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Yearly quota in hours for regular members.
    pub default_quota: Option<f64>,
    /// Quotas at or above this value are coded special cases.
    pub coded_quota_threshold: Option<f64>,
    /// Age in days after which unreviewed work logs are reminded.
    pub pending_reminder_days: Option<u32>,
}

impl AppSettings {
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Tunables for the batch jobs, with unset values taken from the defaults.
    pub fn job_settings(&self) -> Result<JobSettings, SettingsError> {
        Ok(JobSettings {
            default_quota: hours_or("default_quota", self.default_quota, DEFAULT_QUOTA)?,
            coded_quota_threshold: hours_or(
                "coded_quota_threshold",
                self.coded_quota_threshold,
                CODED_QUOTA_THRESHOLD,
            )?,
            pending_reminder_days: self
                .pending_reminder_days
                .unwrap_or(DEFAULT_PENDING_REMINDER_DAYS),
        })
    }
}

fn hours_or(
    field: &'static str,
    value: Option<f64>,
    default: Hours,
) -> Result<Hours, SettingsError> {
    value.map_or(Ok(default), |raw| {
        Hours::try_from_f64(raw).map_err(|source| SettingsError::Hours { field, source })
    })
}

/// Where the server reads its session signing key from.
pub fn session_key_path() -> PathBuf {
    std::env::var_os("SESSION_KEY_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/var/run/secrets/session_key"))
}
