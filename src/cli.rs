use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{self, Config, Overrides};
use crate::error::JksError;
use crate::output::{self, CollectionProgress, JsonLinesSink, ProgressSink};
use crate::providers::jenkins::{CollectionPipeline, FailurePolicy, JenkinsClient};

#[derive(Parser)]
#[command(name = "jksctl")]
#[command(
    author,
    version,
    about = "Collect Jenkins job and last-build metadata as JSON lines",
    long_about = "Collect Jenkins job and last-build metadata as JSON lines.\n\n\
                  Connection settings may also come from the environment (URL, USERNAME, TOKEN, \
                  or their JENKINS_-prefixed forms, optionally through a .env file); the \
                  environment wins over flags.",
    after_help = "Example:\n  jksctl -l https://demo.com -u username -p password -f demo.json"
)]
pub struct Cli {
    /// Jenkins address
    #[arg(short = 'l', long)]
    url: Option<String>,

    /// Jenkins login username
    #[arg(short, long)]
    username: Option<String>,

    /// Jenkins API token or password
    #[arg(short = 'p', long, visible_alias = "password")]
    token: Option<String>,

    /// Output file, appended to [default: jenkins-demo.json]
    #[arg(short = 'f', long = "file")]
    output: Option<PathBuf>,

    /// Log all debug information (hides the progress spinner)
    #[arg(short, long, default_value_t = false)]
    pub debug: bool,

    /// Configuration file (toml, json or yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of concurrent detail fetchers [default: 10]
    #[arg(short, long)]
    workers: Option<usize>,

    /// Only collect jobs whose name contains this substring
    #[arg(long, allow_hyphen_values = true)]
    filter: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, default_value_t = false)]
    insecure: bool,

    /// Retries per request on network errors, 429 and 5xx [default: 3]
    #[arg(long)]
    retries: Option<u32>,

    /// Per-request timeout in seconds [default: 30]
    #[arg(long)]
    timeout: Option<u64>,

    /// What to write for a job whose last build cannot be fetched [default: skip]
    #[arg(long, value_enum)]
    on_error: Option<FailurePolicy>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            username: self.username.clone(),
            token: self.token.clone(),
            output: self.output.clone(),
            filter: self.filter.clone(),
            workers: self.workers,
            max_retries: self.retries,
            timeout_secs: self.timeout,
            insecure: self.insecure,
            on_error: self.on_error,
            debug: self.debug,
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let started = Instant::now();

        // Values from .env replace the process environment, like the flags
        // they stand in for.
        if let Ok(path) = dotenvy::dotenv_override() {
            info!("Loaded environment from {}", path.display());
        }

        let config = Config::load(self.config.as_deref())?;
        let settings = config::resolve(&config, &self.overrides(), |key| std::env::var(key).ok())
            .context("Please provide Jenkins connection details, see `jksctl --help`")?;

        info!(
            "Jenkins URL is {}, writing to {}",
            settings.url,
            settings.output.display()
        );

        let client = JenkinsClient::new(
            &settings.url,
            settings.credentials.clone(),
            settings.client.clone(),
        )?;
        let pipeline = CollectionPipeline::new(
            client,
            settings.selector.clone(),
            settings.pipeline.clone(),
        );

        let mut sink = JsonLinesSink::open(&settings.output)?;

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping collection...");
                    cancel.cancel();
                }
            }
        });

        let progress = if settings.debug {
            CollectionProgress::hidden()
        } else {
            CollectionProgress::start(settings.pipeline.workers)
        };

        let result = {
            let mut progress_sink = ProgressSink::new(&mut sink, &progress);
            pipeline.run(&mut progress_sink, &cancel).await
        };
        interrupt.abort();

        let finished = sink.finish();

        let report = match result {
            Ok(report) if !report.cancelled => report,
            Ok(report) => {
                progress.abandon();
                finished?;
                warn!(
                    "Collection cancelled, {} records written to {}",
                    report.records_written,
                    sink.path().display()
                );
                return Err(JksError::Cancelled.into());
            }
            Err(e) => {
                progress.abandon();
                return Err(e.into());
            }
        };
        finished?;
        progress.finish();

        output::print_summary(&report, sink.path(), started.elapsed());
        eprintln!(
            "output file {} success, please check the file",
            sink.path().display()
        );

        Ok(())
    }
}
