mod client;
mod extract;
mod pipeline;
mod selector;
mod types;

pub use client::{ClientSettings, JenkinsClient};
pub use pipeline::{CollectionPipeline, FailurePolicy, PipelineSettings, RunReport};
pub use selector::{default_rules, JobSelector, SelectionRule};
pub use types::{JobDetail, LastBuildInfo, ResultRecord};
