mod progress;
mod sink;
mod styling;
mod summary;
mod tables;

pub use progress::CollectionProgress;
pub use sink::{JsonLinesSink, ProgressSink, RecordSink};
use styling::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the `jksctl` banner to stderr.
///
/// Displays the tool name, version, and description at the start of execution.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔧 jksctl"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins build metadata collector")
    );
}
