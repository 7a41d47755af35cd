use async_channel::Receiver;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::super::client::JenkinsClient;
use super::super::selector::JobSelector;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListerReport {
    /// Jobs in the directory before selection.
    pub listed: usize,
    /// Names handed to the detail workers.
    pub selected: usize,
    /// The directory request failed and nothing was listed.
    pub failed: bool,
}

/// Lists the job directory once and streams the selected names.
///
/// The returned queue closes when every selected name has been sent, when the
/// directory request fails (after logging it), or on cancellation.
pub fn spawn_job_lister(
    client: Arc<JenkinsClient>,
    selector: JobSelector,
    capacity: usize,
    cancel: CancellationToken,
) -> (Receiver<String>, JoinHandle<ListerReport>) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));

    let handle = tokio::spawn(async move {
        let mut report = ListerReport::default();

        let result = tokio::select! {
            _ = cancel.cancelled() => return report,
            result = client.fetch_job_list() => result,
        };

        let job_list = match result {
            Ok(job_list) => job_list,
            Err(e) => {
                error!(
                    "Failed to list jobs at {} ({} error): {e}",
                    client.base_url(),
                    e.kind()
                );
                report.failed = true;
                return report;
            }
        };

        report.listed = job_list.jobs.len();

        for job in job_list.jobs {
            if !selector.matches(&job.name) {
                continue;
            }
            debug!("Selected job {} ({})", job.name, job.source_url);

            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = tx.send(job.name) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            report.selected += 1;
        }

        info!("Selected {} of {} jobs", report.selected, report.listed);
        report
    });

    (rx, handle)
}
