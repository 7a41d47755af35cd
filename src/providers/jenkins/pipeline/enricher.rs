use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::super::client::JenkinsClient;
use super::super::extract::extract_last_build;
use super::super::types::{DetailOutcome, LastBuildInfo, ResultRecord};
use super::FailurePolicy;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnricherReport {
    pub received: usize,
    pub skipped_terminal: usize,
    pub skipped_failed_detail: usize,
    pub build_failures: usize,
    pub emitted: usize,
}

/// Turns job details into output records.
///
/// Terminal jobs (`notbuilt`, `disabled`) and failed detail fetches produce
/// nothing. Every other job costs one last-build request; a failed request
/// is logged and handled according to `policy`.
pub fn spawn_enricher(
    client: Arc<JenkinsClient>,
    mut details: mpsc::Receiver<DetailOutcome>,
    policy: FailurePolicy,
    capacity: usize,
    cancel: CancellationToken,
) -> (mpsc::Receiver<ResultRecord>, JoinHandle<EnricherReport>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut report = EnricherReport::default();

        loop {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = details.recv() => outcome,
            };
            let Some(outcome) = outcome else { break };
            report.received += 1;

            let detail = match outcome {
                DetailOutcome::Fetched(detail) => detail,
                DetailOutcome::Failed { job_name, error } => {
                    debug!("Dropping job {job_name}, detail unavailable: {error}");
                    report.skipped_failed_detail += 1;
                    continue;
                }
            };

            if detail.is_terminal() {
                debug!(
                    "Skipping job {} with status {}",
                    detail.full_name, detail.status_color
                );
                report.skipped_terminal += 1;
                continue;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = client.fetch_last_build(&detail.full_name) => result,
            };

            let record = match result {
                Ok(body) => ResultRecord::new(&detail, extract_last_build(&body)),
                Err(e) => {
                    warn!(
                        "Failed to fetch last build for job {} ({} error): {e}",
                        detail.full_name,
                        e.kind()
                    );
                    report.build_failures += 1;
                    match policy {
                        FailurePolicy::Skip => continue,
                        FailurePolicy::Partial => {
                            ResultRecord::new(&detail, LastBuildInfo::default())
                        }
                    }
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = tx.send(record) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            report.emitted += 1;
        }

        debug!("Enricher finished: {report:?}");
        report
    });

    (rx, handle)
}
