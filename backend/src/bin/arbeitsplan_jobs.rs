//! Periodic batch jobs: mail notifications, consistency checks, quota and
//! year-end maintenance. Each run prints its report as JSON on stdout.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::sync::Arc;

use arbeitsplan::domain::{BatchJobs, TraceId};
use arbeitsplan::outbound::persistence::{DbPool, PoolConfig, diesel_ports, run_migrations};
use arbeitsplan::settings::AppSettings;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde::Serialize;
use tokio::runtime::Builder;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

/// `arbeitsplan-jobs` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "arbeitsplan-jobs",
    about = "Run a work plan batch job against the configured database",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    job: Job,
}

#[derive(Debug, Clone, Subcommand)]
enum Job {
    /// Mail every member whose assignments changed since the last run.
    NotifyAssignments,
    /// Flag members who lost a task while keeping its hour slots.
    CheckConsistency,
    /// Delete all work logs, assignments and preferences.
    ResetYearEnd {
        /// Required; the reset cannot be undone.
        #[arg(long)]
        force: bool,
    },
    /// Recompute quotas from assigned hours.
    ResetQuotas,
    /// Remind assignees of tasks due within the lead time.
    UpcomingTasks {
        #[arg(long, default_value_t = 3)]
        lead_days: u32,
    },
    /// Remind task owners about unreviewed work logs.
    PendingWorkLogs,
    /// Print per-task statistics, one JSON object per line.
    Statistics,
    /// Apply pending database migrations and exit.
    Migrate,
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Self::NotifyAssignments => "notify-assignments",
            Self::CheckConsistency => "check-consistency",
            Self::ResetYearEnd { .. } => "reset-year-end",
            Self::ResetQuotas => "reset-quotas",
            Self::UpcomingTasks { .. } => "upcoming-tasks",
            Self::PendingWorkLogs => "pending-work-logs",
            Self::Statistics => "statistics",
            Self::Migrate => "migrate",
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .try_init()
    {
        tracing::warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(TraceId::scope(TraceId::generate(), run(args.job)))
}

fn print_report<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

async fn run(job: Job) -> Result<()> {
    let name = job.name();
    let trace_id = TraceId::current().map(|id| id.to_string()).unwrap_or_default();
    info!(job = name, %trace_id, "starting batch job");

    let settings = AppSettings::load_from_iter([std::ffi::OsString::from("arbeitsplan-jobs")])
        .wrap_err("load settings")?;
    let database_url = settings.database_url()?.to_owned();

    if matches!(job, Job::Migrate) {
        let applied = run_migrations(&database_url).await?;
        return print_report(&serde_json::json!({ "applied": applied }));
    }

    let mut pool_config = PoolConfig::for_batch_job(&database_url);
    if let Some(max_size) = settings.pool_max_size {
        pool_config = pool_config.with_max_size(max_size);
    }
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("create database pool")?;
    let jobs = BatchJobs::new(
        diesel_ports(pool),
        Arc::new(DefaultClock),
        settings.job_settings()?,
    );

    match job {
        Job::NotifyAssignments => print_report(&jobs.notify_assignments().await?)?,
        Job::CheckConsistency => print_report(&jobs.check_consistency().await?)?,
        Job::ResetYearEnd { force } => print_report(&jobs.reset_year_end(force).await?)?,
        Job::ResetQuotas => print_report(&jobs.reset_quotas().await?)?,
        Job::UpcomingTasks { lead_days } => {
            print_report(&jobs.remind_upcoming_tasks(lead_days).await?)?;
        }
        Job::PendingWorkLogs => print_report(&jobs.remind_pending_work_logs().await?)?,
        Job::Statistics => {
            for row in jobs.task_statistics().await? {
                print_report(&row)?;
            }
        }
        Job::Migrate => {}
    }

    info!(job = name, "batch job finished");
    Ok(())
}
