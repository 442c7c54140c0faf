//! Shared helpers for integration tests that need a PostgreSQL database.
//!
//! Suites read `ARBEITSPLAN_TEST_DATABASE_URL`; when it is unset they skip.
//! Setup failures against a configured database panic unless
//! `SKIP_TEST_CLUSTER` is truthy, so CI breakage is not masked.

use arbeitsplan::domain::{Member, Task, TaskGroup, TaskName};
use arbeitsplan::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use arbeitsplan::test_support::fixtures;
use uuid::Uuid;

pub const DATABASE_URL_ENV: &str = "ARBEITSPLAN_TEST_DATABASE_URL";

/// Returns true when `SKIP_TEST_CLUSTER` is "1", "true" or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test database setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Migrated pool for the configured test database, or `None` to skip.
pub async fn test_pool() -> Option<DbPool> {
    let Ok(url) = std::env::var(DATABASE_URL_ENV) else {
        eprintln!("SKIP-TEST-CLUSTER: {DATABASE_URL_ENV} not set");
        return None;
    };
    if let Err(err) = run_migrations(&url).await {
        return handle_cluster_setup_failure(err);
    }
    match DbPool::new(PoolConfig::new(url).with_max_size(4)).await {
        Ok(pool) => Some(pool),
        Err(err) => handle_cluster_setup_failure(err),
    }
}

fn suffix() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

/// Member with unique number and email so suites can share one database.
pub fn unique_member(first_name: &str) -> Member {
    let tag = suffix();
    Member {
        member_number: format!("M-{tag}"),
        email: Some(format!("{}-{tag}@example.org", first_name.to_lowercase())),
        ..fixtures::member(first_name)
    }
}

pub fn unique_group(owner: &Member) -> TaskGroup {
    TaskGroup {
        name: format!("Gelände {}", suffix()),
        ..fixtures::group(owner)
    }
}

pub fn unique_task(name: &str, group: &TaskGroup) -> Task {
    Task {
        name: TaskName::new(format!("{name} {}", suffix())).expect("task name"),
        ..fixtures::task(name, group)
    }
}

