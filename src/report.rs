use crate::constants::{ERROR_PREFIX, PROGRESS_BAR_TEMPLATE, PROGRESS_CHARS};
use crate::pipeline::ConversionOutcome;
use crate::runner::{ProgressSink, RunTally, TaskReport};
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Progress bar plus inline warnings and errors for a batch run.
pub struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(PROGRESS_CHARS),
        );
        Self { bar }
    }

    /// Prints above the bar, or straight to stderr when there is no bar.
    fn emit(&self, line: String) {
        if self.bar.is_hidden() {
            eprintln!("{}", line);
        } else {
            self.bar.println(line);
        }
    }
}

impl ProgressSink for ConsoleReporter {
    fn on_start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn on_complete(&mut self, report: &TaskReport, tally: &RunTally) {
        match &report.outcome {
            ConversionOutcome::Failed(error) => {
                for line in failure_lines(&report.display_name, error) {
                    self.emit(style(line).for_stderr().red().to_string());
                }
            }
            outcome => {
                if let Some(warning) = outcome.warning_message(&report.display_name) {
                    self.emit(style(warning).for_stderr().yellow().to_string());
                }
            }
        }
        self.bar.set_position(tally.processed as u64);
        self.bar.set_message(report.display_name.clone());
    }

    fn on_finish(&mut self, _tally: &RunTally) {
        self.bar.finish_and_clear();
    }
}

/// `[ERROR] Processing <name>: <error>` followed by one line per cause.
pub fn failure_lines(display_name: &str, error: &dyn Error) -> Vec<String> {
    let headline = format!("{} Processing {}: {}", ERROR_PREFIX, display_name, error);
    let mut lines = cause_lines(error);
    lines.insert(0, headline);
    lines
}

/// `  Caused by: ...` for every source of `error` whose text the error's own
/// message does not already repeat.
pub fn cause_lines(error: &dyn Error) -> Vec<String> {
    let message = error.to_string();
    let mut lines = Vec::new();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            lines.push(format!("  Caused by: {}", text));
        }
        source = cause.source();
    }
    lines
}

pub fn print_file_names(files: &[PathBuf]) {
    if files.is_empty() {
        return;
    }
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        println!("- {}", name);
    }
    println!();
}

pub fn format_summary(tally: &RunTally, output_dir: &Path, elapsed: Duration) -> String {
    let mut summary = String::new();
    summary.push_str("\n--- Conversion Summary ---\n");
    summary.push_str(&format!("Successfully converted: {} file(s)\n", tally.succeeded));
    if tally.copied > 0 {
        summary.push_str(&format!("  copied unchanged:     {} file(s)\n", tally.copied));
    }
    if tally.warnings > 0 {
        summary.push_str(&format!("  over size budget:     {} file(s)\n", tally.warnings));
    }
    summary.push_str(&format!("Failed to convert:      {} file(s)\n", tally.failed));
    summary.push_str(&format!("Output folder:          '{}'\n", output_dir.display()));
    summary.push_str(&format!("Total time:             {:.2?}", elapsed));
    summary
}

/// Binary units with two decimals, e.g. `1536` is `1.50 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} B", bytes),
        _ => format!("{:.2} {}", size, UNITS[unit]),
    }
}
