//! HTTP inbound adapter exposing the work plan as JSON endpoints.

use actix_web::web;

pub mod assignments;
pub mod error;
pub mod health;
pub mod preferences;
pub mod session;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_utils;
pub mod work_logs;
pub mod workload;

/// Register every `/api/v1` endpoint on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(tasks::list_tasks)
        .service(tasks::create_task)
        .service(tasks::get_task)
        .service(tasks::update_task)
        .service(tasks::delete_task)
        .service(tasks::replace_schedule)
        .service(tasks::staffing)
        .service(tasks::list_groups)
        .service(tasks::create_group)
        .service(preferences::list_own)
        .service(preferences::get_or_create)
        .service(preferences::quick)
        .service(preferences::update_own)
        .service(preferences::update_board)
        .service(assignments::reconcile_task)
        .service(assignments::reconcile_many)
        .service(assignments::submit_time_slots)
        .service(work_logs::list_own)
        .service(work_logs::list_reviewable)
        .service(work_logs::submit)
        .service(work_logs::update_own)
        .service(work_logs::delete_own)
        .service(work_logs::review)
        .service(workload::own_balance)
        .service(workload::member_balance)
        .service(workload::balances);
}
