//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only talk to domain
//! services, so they stay testable against the in-memory store.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::DomainPorts;
use crate::domain::{
    AssignmentReconciler, MemberDirectory, PreferenceRegistry, TaskAdministration, TimeSlotEditor,
    WorkLogService, WorkloadLedger,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub members: MemberDirectory,
    pub preferences: PreferenceRegistry,
    pub reconciler: AssignmentReconciler,
    pub time_slots: TimeSlotEditor,
    pub workload: WorkloadLedger,
    pub tasks: TaskAdministration,
    pub work_logs: WorkLogService,
}

impl HttpState {
    /// Build every service over one set of ports and one clock.
    pub fn new(ports: DomainPorts, clock: Arc<dyn Clock>) -> Self {
        Self {
            members: MemberDirectory::new(ports.clone()),
            preferences: PreferenceRegistry::new(ports.clone(), Arc::clone(&clock)),
            reconciler: AssignmentReconciler::new(ports.clone(), Arc::clone(&clock)),
            time_slots: TimeSlotEditor::new(ports.clone(), Arc::clone(&clock)),
            workload: WorkloadLedger::new(ports.clone(), Arc::clone(&clock)),
            tasks: TaskAdministration::new(ports.clone()),
            work_logs: WorkLogService::new(ports, clock),
        }
    }
}
