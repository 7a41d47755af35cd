//! Concurrent collection pipeline.
//!
//! ```text
//! lister ──(shared queue)──┬─ detail worker 1 ─┐
//!                          ├─ detail worker 2 ─┼─ merge ── enricher ── sink
//!                          └─ detail worker K ─┘
//! ```
//!
//! Stages only talk through channels. Each stage owns the items it holds and
//! reports its counters through its task's return value. Every blocking send
//! and receive also waits on the run's [`CancellationToken`].

mod enricher;
mod fetcher;
mod lister;
mod merge;

use clap::ValueEnum;
use futures::future::join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::output::RecordSink;

use super::client::JenkinsClient;
use super::selector::JobSelector;

use enricher::spawn_enricher;
use fetcher::spawn_detail_workers;
use lister::spawn_job_lister;
use merge::merge;

pub use enricher::EnricherReport;
pub use lister::ListerReport;

pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// What to emit for a job whose last build could not be fetched or decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Emit nothing for the job.
    #[default]
    Skip,
    /// Emit the job's own fields with empty build metadata.
    Partial,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub workers: usize,
    pub queue_capacity: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Counters gathered from every stage once the run has drained.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub lister: ListerReport,
    pub details_fetched: usize,
    pub detail_failures: usize,
    pub enricher: EnricherReport,
    pub records_written: usize,
    pub cancelled: bool,
}

pub struct CollectionPipeline {
    client: Arc<JenkinsClient>,
    selector: JobSelector,
    settings: PipelineSettings,
}

impl CollectionPipeline {
    pub fn new(client: JenkinsClient, selector: JobSelector, settings: PipelineSettings) -> Self {
        Self {
            client: Arc::new(client),
            selector,
            settings,
        }
    }

    /// Runs one collection into `sink` and waits for every stage to finish.
    ///
    /// Per-job failures are logged and counted in the report. A sink error
    /// stops all stages and is returned. Cancelling `cancel` stops the run
    /// early; the records already appended stay in the sink and the report
    /// is flagged as cancelled.
    ///
    /// # Errors
    ///
    /// Returns the first sink error, or a stage error if a stage task panicked.
    pub async fn run<S>(&self, sink: &mut S, cancel: &CancellationToken) -> Result<RunReport>
    where
        S: RecordSink + ?Sized,
    {
        // Sink failures cancel this run without touching the caller's token.
        let run_cancel = cancel.child_token();
        let capacity = self.settings.queue_capacity;

        info!(
            "Collecting from {} with {} workers",
            self.client.base_url(),
            self.settings.workers
        );

        let (names, lister) = spawn_job_lister(
            Arc::clone(&self.client),
            self.selector.clone(),
            capacity,
            run_cancel.clone(),
        );

        let (outputs, workers) = spawn_detail_workers(
            &self.client,
            &names,
            self.settings.workers,
            capacity,
            &run_cancel,
        );
        drop(names);

        let merged = merge(outputs, capacity, &run_cancel);

        let (mut records, enricher) = spawn_enricher(
            Arc::clone(&self.client),
            merged,
            self.settings.failure_policy,
            capacity,
            run_cancel.clone(),
        );

        let mut records_written = 0;
        let mut sink_error = None;
        while let Some(record) = records.recv().await {
            if let Err(e) = sink.append(&record) {
                run_cancel.cancel();
                sink_error = Some(e);
                break;
            }
            records_written += 1;
        }
        drop(records);

        let lister = lister.await?;
        let mut details_fetched = 0;
        let mut detail_failures = 0;
        for report in join_all(workers).await {
            let report = report?;
            details_fetched += report.fetched;
            detail_failures += report.failed;
        }
        let enricher = enricher.await?;

        if let Some(e) = sink_error {
            return Err(e);
        }

        let report = RunReport {
            lister,
            details_fetched,
            detail_failures,
            enricher,
            records_written,
            cancelled: cancel.is_cancelled(),
        };
        debug!("Run finished: {report:?}");

        Ok(report)
    }
}
