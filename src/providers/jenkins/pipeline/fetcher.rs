use async_channel::Receiver;
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::super::client::JenkinsClient;
use super::super::types::DetailOutcome;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub fetched: usize,
    pub failed: usize,
}

/// Starts `workers` detail fetchers competing for names on one shared queue.
///
/// Each worker owns its output channel and closes it once the shared queue is
/// closed and drained.
pub fn spawn_detail_workers(
    client: &Arc<JenkinsClient>,
    names: &Receiver<String>,
    workers: usize,
    capacity: usize,
    cancel: &CancellationToken,
) -> (Vec<mpsc::Receiver<DetailOutcome>>, Vec<JoinHandle<WorkerReport>>) {
    (0..workers.max(1))
        .map(|id| {
            spawn_detail_worker(
                id,
                Arc::clone(client),
                names.clone(),
                capacity,
                cancel.clone(),
            )
        })
        .unzip()
}

fn spawn_detail_worker(
    id: usize,
    client: Arc<JenkinsClient>,
    names: Receiver<String>,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Receiver<DetailOutcome>, JoinHandle<WorkerReport>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut report = WorkerReport::default();

        loop {
            let job_name = tokio::select! {
                _ = cancel.cancelled() => break,
                next = names.recv() => match next {
                    Ok(job_name) => job_name,
                    Err(_) => break,
                },
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = client.fetch_job_detail(&job_name) => result,
            };

            let outcome = match result {
                Ok(mut detail) => {
                    if detail.full_name.is_empty() {
                        detail.full_name.clone_from(&job_name);
                    }
                    report.fetched += 1;
                    DetailOutcome::Fetched(detail)
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch detail for job {job_name} ({} error): {e}",
                        e.kind()
                    );
                    report.failed += 1;
                    DetailOutcome::Failed {
                        job_name,
                        error: e.to_string(),
                    }
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = tx.send(outcome) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(
            "Detail worker {id} finished: {} fetched, {} failed",
            report.fetched, report.failed
        );
        report
    });

    (rx, handle)
}
