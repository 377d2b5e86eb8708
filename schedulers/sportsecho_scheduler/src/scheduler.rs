//! Cron wiring for the sync jobs.
//!
//! Each (sport, operation) pair gets its own cron job and its own guard. The
//! cron runner happily starts a firing while the previous one is still
//! running, so a firing that finds its guard taken is skipped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, error, info, warn};

use crate::api_client::FixturesFetcher;
use crate::config::seoul_offset;
use crate::error::SyncError;
use crate::fixture_store::FixtureStore;
use crate::metrics::MetricsCollector;
use crate::sync_job::FixtureSyncJob;
use crate::types::{CycleSummary, Sport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    UpdateScores,
    FetchUpcoming,
}

impl Operation {
    pub const ALL: [Operation; 2] = [Operation::UpdateScores, Operation::FetchUpcoming];

    pub fn name(self) -> &'static str {
        match self {
            Operation::UpdateScores => "update-scores",
            Operation::FetchUpcoming => "fetch-upcoming",
        }
    }

    pub fn cron(self, sport: Sport) -> &'static str {
        match self {
            Operation::UpdateScores => sport.update_scores_cron(),
            Operation::FetchUpcoming => sport.fetch_upcoming_cron(),
        }
    }
}

/// Record of one cycle, logged when it ends.
#[derive(Debug, Serialize)]
struct CycleRun {
    sport: Sport,
    operation: Operation,
    run_start_time: DateTime<Utc>,
    run_end_time: DateTime<Utc>,
    status: String,
    summary: CycleSummary,
    error_message: Option<String>,
}

impl CycleRun {
    fn new(sport: Sport, operation: Operation) -> Self {
        Self {
            sport,
            operation,
            run_start_time: Utc::now(),
            run_end_time: Utc::now(),
            status: "running".to_string(),
            summary: CycleSummary::default(),
            error_message: None,
        }
    }

    fn complete(&mut self, summary: &CycleSummary) {
        self.run_end_time = Utc::now();
        self.status = "success".to_string();
        self.summary = summary.clone();
    }

    fn fail(&mut self, error: &str) {
        self.run_end_time = Utc::now();
        self.status = "error".to_string();
        self.error_message = Some(error.to_string());
    }

    fn log(&self) {
        match serde_json::to_string(self) {
            Ok(record) => debug!("Cycle run: {}", record),
            Err(e) => warn!("Failed to serialize cycle run: {}", e),
        }

        let elapsed_ms = (self.run_end_time - self.run_start_time).num_milliseconds();
        match &self.error_message {
            None => info!(
                "{} {} finished in {} ms: {} seen, {} updated, {} inserted, {} skipped",
                self.sport,
                self.operation.name(),
                elapsed_ms,
                self.summary.fixtures_seen,
                self.summary.rows_updated,
                self.summary.rows_inserted,
                self.summary.rows_skipped
            ),
            Some(message) => error!(
                "{} {} failed after {} ms: {}",
                self.sport,
                self.operation.name(),
                elapsed_ms,
                message
            ),
        }
    }
}

/// Runs one operation to completion, logging and counting the outcome.
pub async fn run_cycle<F: FixturesFetcher, S: FixtureStore>(
    job: &FixtureSyncJob<F, S>,
    operation: Operation,
    metrics: &MetricsCollector,
) -> Result<CycleSummary, SyncError> {
    let mut run = CycleRun::new(job.sport(), operation);

    let result = match operation {
        Operation::UpdateScores => job.update_today_scores().await,
        Operation::FetchUpcoming => job.fetch_upcoming().await,
    };

    match &result {
        Ok(summary) => {
            run.complete(summary);
            metrics.record_cycle_success();
        }
        Err(e) => {
            run.fail(&e.to_string());
            metrics.record_cycle_failure(e.to_string());
        }
    }
    run.log();
    result
}

/// A job plus one guard per operation.
pub struct ScheduledJob<F, S> {
    job: Arc<FixtureSyncJob<F, S>>,
    metrics: MetricsCollector,
    update_guard: Mutex<()>,
    upcoming_guard: Mutex<()>,
}

impl<F: FixturesFetcher, S: FixtureStore> ScheduledJob<F, S> {
    pub fn new(job: Arc<FixtureSyncJob<F, S>>, metrics: MetricsCollector) -> Self {
        Self {
            job,
            metrics,
            update_guard: Mutex::new(()),
            upcoming_guard: Mutex::new(()),
        }
    }

    fn guard(&self, operation: Operation) -> &Mutex<()> {
        match operation {
            Operation::UpdateScores => &self.update_guard,
            Operation::FetchUpcoming => &self.upcoming_guard,
        }
    }

    /// Returns `None` when the previous firing of the same operation is still
    /// running.
    pub async fn fire(&self, operation: Operation) -> Option<Result<CycleSummary, SyncError>> {
        let _running = match self.guard(operation).try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    "{} {} still running, skipping this firing",
                    self.job.sport(),
                    operation.name()
                );
                return None;
            }
        };
        let result = run_cycle(&self.job, operation, &self.metrics).await;
        self.metrics.log_summary();
        Some(result)
    }
}

/// Registers both operations of every job and starts the scheduler. Keep the
/// returned handle alive; dropping it stops the jobs.
pub async fn build_scheduler<F, S>(
    jobs: Vec<Arc<FixtureSyncJob<F, S>>>,
    metrics: MetricsCollector,
) -> Result<JobScheduler, JobSchedulerError>
where
    F: FixturesFetcher + 'static,
    S: FixtureStore + 'static,
{
    let scheduler = JobScheduler::new().await?;

    for job in jobs {
        let sport = job.sport();
        let scheduled = Arc::new(ScheduledJob::new(job, metrics.clone()));
        for operation in Operation::ALL {
            let cron = operation.cron(sport);
            let scheduled = Arc::clone(&scheduled);
            let cron_job = Job::new_async_tz(cron, seoul_offset(), move |_uuid, _lock| {
                let scheduled = Arc::clone(&scheduled);
                Box::pin(async move {
                    // Errors were already logged by the cycle run.
                    let _ = scheduled.fire(operation).await;
                })
            })?;
            scheduler.add(cron_job).await?;
            info!("Scheduled {} {} at \"{}\" (Asia/Seoul)", sport, operation.name(), cron);
        }
    }

    scheduler.start().await?;
    Ok(scheduler)
}
