//! Progress indicators for check runs
//!
//! Uses `linya`, which draws to stderr. One bar per check, advanced as each
//! target result arrives.

use linya::{Bar, Progress};

/// Progress bar for the targets of one check
pub struct TargetProgress {
  progress: Progress,
  bar: Bar,
}

impl TargetProgress {
  /// Create a new progress bar for `total` targets
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Bar only when enabled, so callers can advance an `Option` unconditionally
  pub fn maybe(enabled: bool, total: usize, label: impl Into<String>) -> Option<Self> {
    (enabled && total > 0).then(|| Self::new(total, label))
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
