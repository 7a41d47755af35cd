use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::auth::Credentials;
use crate::error::{JksError, Result};

use super::types::{JobDetail, JobList};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_WAIT_SECONDS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Transport tuning for [`JenkinsClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub max_retries: u32,
    pub retry_wait: Duration,
    pub timeout: Duration,
    /// Accept self-signed or otherwise invalid server certificates.
    pub insecure: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_wait: Duration::from_secs(DEFAULT_RETRY_WAIT_SECONDS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            insecure: false,
        }
    }
}

/// Authenticated client for the Jenkins JSON API.
///
/// Every call is one logical request: transient failures (connection errors,
/// timeouts, 429 and 5xx responses) are retried internally with a fixed wait
/// before an error is surfaced.
pub struct JenkinsClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
    settings: ClientSettings,
}

impl JenkinsClient {
    pub fn new(base_url: &str, credentials: Credentials, settings: ClientSettings) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| JksError::Config(format!("Invalid base URL '{base_url}': {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(JksError::Config(format!(
                "Base URL must be an http(s) address, got '{base_url}'"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("jksctl/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.insecure)
            .build()
            .map_err(|e| JksError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            credentials,
            settings,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/json`
    pub fn job_list_url(&self) -> Result<Url> {
        self.endpoint(None, &["api", "json"])
    }

    /// `{base}/job/{name}/api/json`
    pub fn job_url(&self, job_name: &str) -> Result<Url> {
        self.endpoint(Some(job_name), &["api", "json"])
    }

    /// `{base}/job/{name}/lastBuild/api/json`
    pub fn last_build_url(&self, full_name: &str) -> Result<Url> {
        self.endpoint(Some(full_name), &["lastBuild", "api", "json"])
    }

    /// Folder members (`folder/job`) map to nested `job/folder/job/job` paths.
    fn endpoint(&self, job_path: Option<&str>, tail: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                JksError::Config(format!("Invalid base URL: {}", self.base_url))
            })?;
            segments.pop_if_empty();
            if let Some(path) = job_path {
                for segment in path.split('/').filter(|s| !s.is_empty()) {
                    segments.push("job").push(segment);
                }
            }
            segments.extend(tail);
        }
        Ok(url)
    }

    pub async fn fetch_job_list(&self) -> Result<JobList> {
        self.get_json(self.job_list_url()?).await
    }

    pub async fn fetch_job_detail(&self, job_name: &str) -> Result<JobDetail> {
        self.get_json(self.job_url(job_name)?).await
    }

    /// The last-build document is returned untyped; see `extract`.
    pub async fn fetch_last_build(&self, full_name: &str) -> Result<Value> {
        self.get_json(self.last_build_url(full_name)?).await
    }

    pub async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let body = self.get_text(url.clone()).await?;
        serde_json::from_str(&body).map_err(|source| JksError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        let max_retries = self.settings.max_retries;
        let mut retry_count = 0;
        loop {
            debug!("GET {url}");

            let request = self.client.get(url.clone()).basic_auth(
                &self.credentials.username,
                Some(self.credentials.token.as_str()),
            );

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    if retry_count >= max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {:?} ({}/{})...",
                        e,
                        self.settings.retry_wait,
                        retry_count + 1,
                        max_retries
                    );
                    tokio::time::sleep(self.settings.retry_wait).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if retry_count >= max_retries {
                    return Err(JksError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: max_retries,
                    });
                }

                warn!(
                    "Jenkins API error (status {status}) for {url}. Waiting {:?} before retry {}/{}...",
                    self.settings.retry_wait,
                    retry_count + 1,
                    max_retries
                );

                tokio::time::sleep(self.settings.retry_wait).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(JksError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }

            return Ok(response.text().await?);
        }
    }
}
