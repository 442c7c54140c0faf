//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Every domain port has a thin Diesel adapter here. Row structs
//! (`models.rs`) and table definitions (`schema.rs`) stay private to this
//! module; adapters translate between them and domain types and map
//! database failures onto the port errors.
//!
//! # Example
//!
//! ```ignore
//! use arbeitsplan::outbound::persistence::{DbPool, PoolConfig, diesel_ports};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/arbeitsplan")).await?;
//! let ports = diesel_ports(pool);
//! ```

mod diesel_assignment_repository;
mod diesel_error_mapping;
mod diesel_mail_outbox;
mod diesel_maintenance_repository;
mod diesel_member_repository;
mod diesel_preference_repository;
mod diesel_task_repository;
mod diesel_work_log_repository;
mod migrations;
mod models;
mod pool;
mod schema;

use std::sync::Arc;

use crate::domain::ports::DomainPorts;

pub use diesel_assignment_repository::DieselAssignmentRepository;
pub use diesel_mail_outbox::DieselMailOutbox;
pub use diesel_maintenance_repository::DieselMaintenanceRepository;
pub use diesel_member_repository::DieselMemberRepository;
pub use diesel_preference_repository::DieselPreferenceRepository;
pub use diesel_task_repository::DieselTaskRepository;
pub use diesel_work_log_repository::DieselWorkLogRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};

/// Wire every domain port to its Diesel adapter over one shared pool.
pub fn diesel_ports(pool: DbPool) -> DomainPorts {
    let members = Arc::new(DieselMemberRepository::new(pool.clone()));
    DomainPorts {
        members: members.clone(),
        notifications: members,
        tasks: Arc::new(DieselTaskRepository::new(pool.clone())),
        preferences: Arc::new(DieselPreferenceRepository::new(pool.clone())),
        assignments: Arc::new(DieselAssignmentRepository::new(pool.clone())),
        work_logs: Arc::new(DieselWorkLogRepository::new(pool.clone())),
        maintenance: Arc::new(DieselMaintenanceRepository::new(pool.clone())),
        mail: Arc::new(DieselMailOutbox::new(pool)),
    }
}
