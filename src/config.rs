use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{Credentials, Token};
use crate::error::{JksError, Result};
use crate::providers::jenkins::{
    default_rules, ClientSettings, FailurePolicy, JobSelector, PipelineSettings, SelectionRule,
};

const URL_VARS: [&str; 2] = ["JENKINS_URL", "URL"];
const USERNAME_VARS: [&str; 2] = ["JENKINS_USERNAME", "USERNAME"];
const TOKEN_VARS: [&str; 2] = ["JENKINS_TOKEN", "TOKEN"];
const OUTPUT_VARS: [&str; 1] = ["JKSCTL_OUTPUT"];

/// Configuration file structure for jksctl.
///
/// Every value can also be given on the command line or through the
/// environment; see [`resolve`] for precedence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Jenkins base URL
    pub url: Option<String>,

    /// Login username
    pub username: Option<String>,

    /// API token or password
    pub token: Option<String>,

    /// Select only jobs whose name contains this substring
    pub filter: Option<String>,

    /// URL-marker rules used when no filter is set
    #[serde(default = "default_rules")]
    pub rules: Vec<SelectionRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_wait_secs")]
    pub retry_wait_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Number of concurrent detail fetchers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of each inter-stage queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What to emit when a last build cannot be fetched
    #[serde(default)]
    pub on_error: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Output file, appended to
    #[serde(default = "default_output_file")]
    pub file: PathBuf,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            token: None,
            filter: None,
            rules: default_rules(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_wait_secs: default_retry_wait_secs(),
            timeout_secs: default_timeout_secs(),
            insecure: false,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            on_error: FailurePolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

fn default_max_retries() -> u32 {
    ClientSettings::default().max_retries
}

fn default_retry_wait_secs() -> u64 {
    ClientSettings::default().retry_wait.as_secs()
}

fn default_timeout_secs() -> u64 {
    ClientSettings::default().timeout.as_secs()
}

fn default_workers() -> usize {
    PipelineSettings::default().workers
}

fn default_queue_capacity() -> usize {
    PipelineSettings::default().queue_capacity
}

fn default_output_file() -> PathBuf {
    PathBuf::from("jenkins-demo.json")
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path (must exist)
    /// 2. ./jksctl.toml, ./jksctl.json, ./jksctl.yaml, ./jksctl.yml
    /// 3. `<config dir>/jksctl/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = ["jksctl.toml", "jksctl.json", "jksctl.yaml", "jksctl.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = dirs::config_dir().map(|dir| dir.join("jksctl").join("config.toml")) {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            JksError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let parsed = match extension {
            "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| e.to_string()),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .map_err(|e| e.to_string()),
        };

        parsed.map_err(|e| {
            JksError::Config(format!("Failed to parse config file {}: {e}", path.display()))
        })
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub token: Option<String>,
    pub output: Option<PathBuf>,
    pub filter: Option<String>,
    pub workers: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub insecure: bool,
    pub on_error: Option<FailurePolicy>,
    pub debug: bool,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub credentials: Credentials,
    pub output: PathBuf,
    pub debug: bool,
    pub selector: JobSelector,
    pub client: ClientSettings,
    pub pipeline: PipelineSettings,
}

fn from_env(env: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| env(key).filter(|value| !value.trim().is_empty()))
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Merges environment, command line and config file.
///
/// Precedence is environment, then command line, then config file, then
/// built-in defaults.
///
/// # Errors
///
/// Returns [`JksError::Config`] naming every missing connection setting, or
/// if the worker count is zero.
pub fn resolve(
    config: &Config,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings> {
    let url = from_env(&env, &URL_VARS)
        .or_else(|| non_empty(overrides.url.as_ref()))
        .or_else(|| non_empty(config.jenkins.url.as_ref()));
    let username = from_env(&env, &USERNAME_VARS)
        .or_else(|| non_empty(overrides.username.as_ref()))
        .or_else(|| non_empty(config.jenkins.username.as_ref()));
    let token = from_env(&env, &TOKEN_VARS)
        .or_else(|| non_empty(overrides.token.as_ref()))
        .or_else(|| non_empty(config.jenkins.token.as_ref()));

    let (url, username, token) = match (url, username, token) {
        (Some(url), Some(username), Some(token)) => (url, username, token),
        (url, username, token) => {
            let missing: Vec<&str> = [
                ("url", url.is_none()),
                ("username", username.is_none()),
                ("token", token.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(JksError::Config(format!(
                "missing required Jenkins setting(s): {}",
                missing.join(", ")
            )));
        }
    };

    let url = url.trim_end_matches('/').to_string();

    let output = from_env(&env, &OUTPUT_VARS)
        .map(PathBuf::from)
        .or_else(|| overrides.output.clone())
        .unwrap_or_else(|| config.output.file.clone());

    let filter = overrides.filter.as_deref().or(config.jenkins.filter.as_deref());
    let selector = JobSelector::for_instance(&url, filter, &config.jenkins.rules);

    let workers = overrides.workers.unwrap_or(config.pipeline.workers);
    if workers == 0 {
        return Err(JksError::Config("worker count must be at least 1".into()));
    }

    let client = ClientSettings {
        max_retries: overrides.max_retries.unwrap_or(config.http.max_retries),
        retry_wait: Duration::from_secs(config.http.retry_wait_secs),
        timeout: Duration::from_secs(overrides.timeout_secs.unwrap_or(config.http.timeout_secs)),
        insecure: overrides.insecure || config.http.insecure,
    };

    let pipeline = PipelineSettings {
        workers,
        queue_capacity: config.pipeline.queue_capacity.max(1),
        failure_policy: overrides.on_error.unwrap_or(config.pipeline.on_error),
    };

    Ok(Settings {
        url,
        credentials: Credentials::new(username, Token::from(token)),
        output,
        debug: overrides.debug,
        selector,
        client,
        pipeline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn flags() -> Overrides {
        Overrides {
            url: Some("https://flag.example.com/".to_string()),
            username: Some("flag-user".to_string()),
            token: Some("flag-token".to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.workers, 10);
        assert_eq!(config.http.max_retries, 3);
        assert_eq!(config.http.retry_wait_secs, 5);
        assert_eq!(config.output.file, PathBuf::from("jenkins-demo.json"));
        assert_eq!(config.jenkins.rules, default_rules());
        assert_eq!(config.pipeline.on_error, FailurePolicy::Skip);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[jenkins]
url = "https://jenkins.example.com"
username = "ci"
filter = "deploy"

[[jenkins.rules]]
url-marker = "staging"
name-contains = "stg-"

[http]
max-retries = 1
insecure = true

[pipeline]
workers = 4
on-error = "partial"

[output]
file = "builds.json"
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.jenkins.url.as_deref(), Some("https://jenkins.example.com"));
        assert_eq!(config.jenkins.filter.as_deref(), Some("deploy"));
        assert_eq!(config.jenkins.rules, vec![SelectionRule::new("staging", "stg-")]);
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.http.insecure);
        assert_eq!(config.pipeline.workers, 4);
        assert_eq!(config.pipeline.on_error, FailurePolicy::Partial);
        assert_eq!(config.output.file, PathBuf::from("builds.json"));
    }

    #[test]
    fn test_load_json_and_yaml_config() {
        let mut json_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(json_file, r#"{{"jenkins": {{"username": "json-user"}}, "pipeline": {{"workers": 2}}}}"#).unwrap();
        let config = Config::load(Some(json_file.path())).unwrap();
        assert_eq!(config.jenkins.username.as_deref(), Some("json-user"));
        assert_eq!(config.pipeline.workers, 2);

        let mut yaml_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(yaml_file, "jenkins:\n  token: yaml-token\nhttp:\n  timeout-secs: 9\n").unwrap();
        let config = Config::load(Some(yaml_file.path())).unwrap();
        assert_eq!(config.jenkins.token.as_deref(), Some("yaml-token"));
        assert_eq!(config.http.timeout_secs, 9);
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let result = Config::load(Some(Path::new("definitely-missing-jksctl.toml")));
        assert!(matches!(result, Err(JksError::Config(_))));
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[pipeline]\nworkers = \"many\"\n").unwrap();
        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_environment_takes_precedence_over_flags() {
        let env = env_of(&[
            ("URL", "https://env.example.com"),
            ("TOKEN", "env-token"),
            ("JKSCTL_OUTPUT", "env.json"),
        ]);

        let settings = resolve(&Config::default(), &flags(), env).unwrap();
        assert_eq!(settings.url, "https://env.example.com");
        assert_eq!(settings.credentials.username, "flag-user");
        assert_eq!(settings.credentials.token.as_str(), "env-token");
        assert_eq!(settings.output, PathBuf::from("env.json"));
    }

    #[test]
    fn test_prefixed_variables_win_over_plain_ones() {
        let env = env_of(&[("URL", "https://plain"), ("JENKINS_URL", "https://prefixed")]);
        let settings = resolve(&Config::default(), &flags(), env).unwrap();
        assert_eq!(settings.url, "https://prefixed");
    }

    #[test]
    fn test_flags_win_over_config_file() {
        let mut config = Config::default();
        config.jenkins.url = Some("https://file.example.com".to_string());
        config.pipeline.workers = 3;

        let overrides = Overrides {
            workers: Some(7),
            on_error: Some(FailurePolicy::Partial),
            ..flags()
        };

        let settings = resolve(&config, &overrides, env_of(&[])).unwrap();
        assert_eq!(settings.url, "https://flag.example.com");
        assert_eq!(settings.pipeline.workers, 7);
        assert_eq!(settings.pipeline.failure_policy, FailurePolicy::Partial);
        assert_eq!(settings.output, PathBuf::from("jenkins-demo.json"));
    }

    #[test]
    fn test_config_file_fills_missing_values() {
        let mut config = Config::default();
        config.jenkins.url = Some("https://pipeline.example.com".to_string());
        config.jenkins.username = Some("file-user".to_string());
        config.jenkins.token = Some("file-token".to_string());

        let settings = resolve(&config, &Overrides::default(), env_of(&[])).unwrap();
        assert_eq!(settings.credentials.username, "file-user");
        assert_eq!(
            settings.selector,
            JobSelector::Contains(vec!["-for-".to_string()])
        );
        assert_eq!(settings.client.max_retries, 3);
        assert!(!settings.client.insecure);
    }

    #[test]
    fn test_missing_settings_are_named() {
        let overrides = Overrides {
            url: Some("https://ci".to_string()),
            username: Some("   ".to_string()),
            ..Overrides::default()
        };

        let err = resolve(&Config::default(), &overrides, env_of(&[("TOKEN", "")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("username"));
        assert!(message.contains("token"));
        assert!(!message.contains("url,"));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let overrides = Overrides {
            workers: Some(0),
            ..flags()
        };
        assert!(matches!(
            resolve(&Config::default(), &overrides, env_of(&[])),
            Err(JksError::Config(_))
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed_from_url() {
        let settings = resolve(&Config::default(), &flags(), env_of(&[])).unwrap();
        assert_eq!(settings.url, "https://flag.example.com");
    }
}
