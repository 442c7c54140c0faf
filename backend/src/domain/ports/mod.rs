//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod assignment_repository;
mod mail_queue;
mod maintenance_repository;
mod member_repository;
mod notification_flag_store;
mod preference_repository;
mod task_repository;
mod work_log_repository;

#[cfg(test)]
pub use assignment_repository::MockAssignmentRepository;
pub use assignment_repository::{AssignmentRepository, AssignmentRepositoryError};
#[cfg(test)]
pub use mail_queue::MockMailQueue;
pub use mail_queue::{MailQueue, MailQueueError};
#[cfg(test)]
pub use maintenance_repository::MockMaintenanceRepository;
pub use maintenance_repository::{
    MaintenanceRepository, MaintenanceRepositoryError, YearEndSummary,
};
#[cfg(test)]
pub use member_repository::MockMemberRepository;
pub use member_repository::{MemberRepository, MemberRepositoryError};
#[cfg(test)]
pub use notification_flag_store::MockNotificationFlagStore;
pub use notification_flag_store::{NotificationFlagError, NotificationFlagStore};
#[cfg(test)]
pub use preference_repository::MockPreferenceRepository;
pub use preference_repository::{
    DuplicatePreference, PreferenceRepository, PreferenceRepositoryError, StoredPreference,
};
#[cfg(test)]
pub use task_repository::MockTaskRepository;
pub use task_repository::{TaskRepository, TaskRepositoryError};
#[cfg(test)]
pub use work_log_repository::MockWorkLogRepository;
pub use work_log_repository::{AcceptedWorkTotal, WorkLogRepository, WorkLogRepositoryError};

use std::sync::Arc;

/// Parameter object bundling the driven ports used by the domain services.
#[derive(Clone)]
pub struct DomainPorts {
    pub members: Arc<dyn MemberRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub assignments: Arc<dyn AssignmentRepository>,
    pub work_logs: Arc<dyn WorkLogRepository>,
    pub notifications: Arc<dyn NotificationFlagStore>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
    pub mail: Arc<dyn MailQueue>,
}
