use serde::{Deserialize, Serialize};

/// Maps a Jenkins instance, recognized by a marker in its base URL, to the
/// substring its relevant job names contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SelectionRule {
    pub url_marker: String,
    pub name_contains: String,
}

impl SelectionRule {
    pub fn new(url_marker: &str, name_contains: &str) -> Self {
        Self {
            url_marker: url_marker.to_string(),
            name_contains: name_contains.to_string(),
        }
    }
}

/// Rules for the two Jenkins instances the tool was first written against.
pub fn default_rules() -> Vec<SelectionRule> {
    vec![
        SelectionRule::new("pipeline", "-for-"),
        SelectionRule::new("tech", "git"),
    ]
}

/// Decides which listed jobs enter the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSelector {
    All,
    /// A job is selected when its name contains any of the substrings.
    Contains(Vec<String>),
}

impl JobSelector {
    /// Builds the selector for a Jenkins instance.
    ///
    /// An explicit filter wins. Otherwise every rule whose marker appears in
    /// `base_url` contributes its substring; with no matching rule every job
    /// is selected.
    pub fn for_instance(base_url: &str, filter: Option<&str>, rules: &[SelectionRule]) -> Self {
        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            return Self::Contains(vec![filter.to_string()]);
        }

        let needles: Vec<String> = rules
            .iter()
            .filter(|rule| base_url.contains(&rule.url_marker))
            .map(|rule| rule.name_contains.clone())
            .collect();

        if needles.is_empty() {
            Self::All
        } else {
            Self::Contains(needles)
        }
    }

    pub fn matches(&self, job_name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Contains(needles) => needles.iter().any(|n| job_name.contains(n.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_instance_selects_for_jobs() {
        let selector =
            JobSelector::for_instance("https://pipeline.example.com", None, &default_rules());
        assert!(selector.matches("deploy-for-prod"));
        assert!(!selector.matches("git-mirror"));
    }

    #[test]
    fn test_tech_instance_selects_git_jobs() {
        let selector =
            JobSelector::for_instance("https://tech.example.com", None, &default_rules());
        assert!(selector.matches("gitlab-sync"));
        assert!(!selector.matches("deploy-for-prod"));
    }

    #[test]
    fn test_both_markers_select_each_job_once() {
        let selector =
            JobSelector::for_instance("https://tech-pipeline.example.com", None, &default_rules());
        assert_eq!(
            selector,
            JobSelector::Contains(vec!["-for-".to_string(), "git".to_string()])
        );
        assert!(selector.matches("git-for-all"));
        assert!(selector.matches("git-mirror"));
        assert!(!selector.matches("nightly"));
    }

    #[test]
    fn test_unknown_instance_selects_everything() {
        let selector = JobSelector::for_instance("http://127.0.0.1:8080", None, &default_rules());
        assert_eq!(selector, JobSelector::All);
        assert!(selector.matches("anything"));
    }

    #[test]
    fn test_explicit_filter_overrides_rules() {
        let selector = JobSelector::for_instance(
            "https://pipeline.example.com",
            Some("nightly"),
            &default_rules(),
        );
        assert!(selector.matches("nightly-build"));
        assert!(!selector.matches("deploy-for-prod"));
    }

    #[test]
    fn test_empty_filter_is_ignored() {
        let selector =
            JobSelector::for_instance("https://tech.example.com", Some(""), &default_rules());
        assert_eq!(selector, JobSelector::Contains(vec!["git".to_string()]));
    }
}
