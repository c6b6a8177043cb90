use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use ntuple_index_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter: one spinner per table fill, with a running row count.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_branch_start(&self, branch: &str) {
        eprintln!("{} {}", "Branch".bold(), branch.cyan());
    }

    fn on_table_start(&self, table: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Filling {}...", table));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_row(&self, table: &str, rows_so_far: usize) {
        self.with_bar(|pb| pb.set_message(format!("Filling {}... {} rows", table, rows_so_far)));
    }

    fn on_throttle(&self, dirs_probed: usize, pause: Duration) {
        self.with_bar(|pb| {
            pb.println(format!(
                "  {} directories probed, pausing for {:.0}s",
                dirs_probed,
                pause.as_secs_f64()
            ))
        });
    }

    fn on_table_complete(&self, table: &str, rows: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} {}: {} rows in {:.2}s",
            "✓".green(),
            table,
            rows,
            duration_secs
        );
    }
}
