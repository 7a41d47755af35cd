use serde::{Deserialize, Serialize};

/// Status colors that mark a job as never built or switched off.
const TERMINAL_COLORS: [&str; 2] = ["notbuilt", "disabled"];

/// Job directory returned by `{base}/api/json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub jobs: Vec<JobRef>,
}

/// Entry of the job directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobRef {
    pub name: String,
    #[serde(rename = "url", default)]
    pub source_url: String,
}

/// Per-job detail returned by `{base}/job/{name}/api/json`.
///
/// Every field defaults when absent: folders and some job types omit
/// `buildable` or `nextBuildNumber`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobDetail {
    pub display_name: String,
    pub full_name: String,
    pub buildable: bool,
    pub next_build_number: i64,
    pub in_queue: bool,
    /// Jenkins ball color, e.g. `blue`, `red`, `notbuilt`, `disabled`.
    #[serde(rename = "color")]
    pub status_color: String,
    pub url: String,
}

impl JobDetail {
    /// True for jobs that have no last build worth enriching.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_COLORS.contains(&self.status_color.as_str())
    }
}

/// Outcome of resolving one job name.
///
/// A failed fetch still produces exactly one outcome so that every listed
/// job is accounted for downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Fetched(JobDetail),
    Failed { job_name: String, error: String },
}

/// Fields pulled out of a last-build document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastBuildInfo {
    pub user: String,
    pub timestamp: i64,
    pub last_built_revision: Option<String>,
    pub remote_url: Option<String>,
}

/// One output line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub user: String,
    pub timestamp: i64,
    #[serde(
        rename = "lastBuiltRevision",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_built_revision: Option<String>,
    #[serde(rename = "remoteUrls", default, skip_serializing_if = "Option::is_none")]
    pub remote_urls: Option<String>,
    #[serde(rename = "displayname")]
    pub display_name: String,
    pub buildable: bool,
    #[serde(rename = "nextBuildNumber")]
    pub next_build_number: i64,
    pub url: String,
    #[serde(rename = "color")]
    pub status_color: String,
}

impl ResultRecord {
    pub fn new(detail: &JobDetail, build: LastBuildInfo) -> Self {
        Self {
            user: build.user,
            timestamp: build.timestamp,
            last_built_revision: build.last_built_revision,
            remote_urls: build.remote_url,
            display_name: detail.display_name.clone(),
            buildable: detail.buildable,
            next_build_number: detail.next_build_number,
            url: detail.url.clone(),
            status_color: detail.status_color.clone(),
        }
    }
}
