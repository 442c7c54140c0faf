//! Server entry-point: loads settings, migrates the database and serves the
//! REST API.

mod server;

use std::env;
use std::path::Path;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
use zeroize::Zeroize;

use arbeitsplan::inbound::http::health::HealthState;
use arbeitsplan::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use arbeitsplan::settings::{AppSettings, session_key_path};
use server::{ServerConfig, create_server};

const SESSION_KEY_MIN_LEN: usize = 64;

fn load_session_key(path: &Path) -> std::io::Result<Key> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(std::io::Error::other(format!(
                    "session key at {} is {length} bytes; need at least {SESSION_KEY_MIN_LEN}",
                    path.display()
                )));
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %path.display(), %error, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {}: {error}",
                    path.display()
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().map_err(std::io::Error::other)?;
    let database_url = settings.database_url().map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;

    run_migrations(database_url)
        .await
        .map_err(std::io::Error::other)?;

    let mut pool_config = PoolConfig::new(database_url);
    if let Some(max_size) = settings.pool_max_size {
        pool_config = pool_config.with_max_size(max_size);
    }
    let db_pool = DbPool::new(pool_config)
        .await
        .map_err(std::io::Error::other)?;
    info!("database pool ready");

    let key = load_session_key(&session_key_path())?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr, db_pool);
    create_server(health_state, config)?.await
}
