use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

use comfy_table::{Cell, Color as TableColor};

use crate::providers::jenkins::RunReport;

use super::styling::{bright, bright_green, bright_yellow, cyan, dim};
use super::tables::{count_cell, create_table, failure_count_cell};

/// Prints a human-readable summary of a collection run to stdout.
///
/// Shows how many jobs were listed and selected, how the detail and
/// last-build fetches went, and where the records were written. Failure
/// counts are green when zero and red otherwise.
pub fn print_summary(report: &RunReport, path: &Path, elapsed: Duration) {
    println!("{}", render_summary(report, path, elapsed));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn label(text: &str) -> Cell {
    Cell::new(text).fg(TableColor::Cyan)
}

fn render_summary(report: &RunReport, path: &Path, elapsed: Duration) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let mut table = create_table();
    table.add_row(vec![label("Jobs listed"), count_cell(report.lister.listed)]);
    table.add_row(vec![
        label("Jobs selected"),
        count_cell(report.lister.selected),
    ]);
    table.add_row(vec![
        label("Details fetched"),
        count_cell(report.details_fetched),
    ]);
    table.add_row(vec![
        label("Detail failures"),
        failure_count_cell(report.detail_failures),
    ]);
    table.add_row(vec![
        label("Skipped (not built / disabled)"),
        count_cell(report.enricher.skipped_terminal),
    ]);
    table.add_row(vec![
        label("Last build failures"),
        failure_count_cell(report.enricher.build_failures),
    ]);
    table.add_row(vec![
        label("Records written"),
        Cell::new(report.records_written).fg(TableColor::Green),
    ]);
    table.add_row(vec![
        label("Output file"),
        Cell::new(path.display().to_string()),
    ]);
    let _ = writeln!(output, "{table}");

    if report.lister.failed {
        let _ = writeln!(
            output,
            "{}",
            bright_yellow("⚠️  The job list could not be fetched, nothing was collected")
        );
    } else if report.lister.selected == 0 {
        let _ = writeln!(output, "{}", dim("No jobs matched the selection"));
    }

    let _ = writeln!(
        output,
        "{} {}",
        bright_green("✓"),
        cyan(format!("time cost: {:.3}s", elapsed.as_secs_f64()))
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn report() -> RunReport {
        let mut report = RunReport::default();
        report.lister.listed = 12;
        report.lister.selected = 7;
        report.details_fetched = 6;
        report.detail_failures = 1;
        report.enricher.skipped_terminal = 2;
        report.enricher.build_failures = 1;
        report.records_written = 3;
        report
    }

    #[test]
    fn test_render_summary_lists_counts() {
        let output = render_summary(
            &report(),
            &PathBuf::from("jenkins-demo.json"),
            Duration::from_millis(1500),
        );

        assert!(output.contains("Overview"));
        assert!(output.contains("Jobs listed"));
        assert!(output.contains("12"));
        assert!(output.contains("Records written"));
        assert!(output.contains("jenkins-demo.json"));
        assert!(output.contains("time cost: 1.500s"));
        assert!(!output.contains("could not be fetched"));
    }

    #[test]
    fn test_render_summary_reports_listing_failure() {
        let mut report = RunReport::default();
        report.lister.failed = true;

        let output = render_summary(&report, &PathBuf::from("out.json"), Duration::ZERO);

        assert!(output.contains("could not be fetched"));
    }

    #[test]
    fn test_render_summary_with_no_selected_jobs() {
        let mut report = RunReport::default();
        report.lister.listed = 4;

        let output = render_summary(&report, &PathBuf::from("out.json"), Duration::ZERO);

        assert!(output.contains("No jobs matched the selection"));
    }
}
