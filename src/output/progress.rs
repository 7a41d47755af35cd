use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Spinner counting records as they reach the output file.
pub struct CollectionProgress {
    pb: ProgressBar,
}

impl CollectionProgress {
    pub fn start(workers: usize) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Collection").underlined());
        let pb = create_spinner(
            bright_yellow(format!("Collecting build metadata ({workers} workers)")).to_string(),
        );
        Self { pb }
    }

    /// A progress tracker that never draws, used with `--debug` so log lines
    /// are not overwritten.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
        }
    }

    pub fn record_written(&self) {
        self.pb.inc(1);
    }

    pub fn written(&self) -> u64 {
        self.pb.position()
    }

    pub fn finish(self) {
        let written = self.written();
        self.pb.finish_with_message(
            bright_green(format!("Collected {written} records ✓")).to_string(),
        );
        eprintln!();
    }

    pub fn abandon(self) {
        let written = self.written();
        self.pb.abandon_with_message(
            bright_yellow(format!("Stopped after {written} records")).to_string(),
        );
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner} {pos} written [{elapsed}]")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
