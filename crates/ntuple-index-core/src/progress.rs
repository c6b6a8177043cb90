use std::time::Duration;

/// Trait for reporting indexing progress.
///
/// The CLI implements it with indicatif spinners; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_branch_start(&self, _branch: &str) {}
    fn on_table_start(&self, _table: &str) {}
    fn on_row(&self, _table: &str, _rows_so_far: usize) {}
    fn on_throttle(&self, _dirs_probed: usize, _pause: Duration) {}
    fn on_table_complete(&self, _table: &str, _rows: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
