//! Progress display for resolution runs
//!
//! Uses indicatif on stderr; disabled in quiet and JSON modes.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for a resolution run
pub struct Progress {
    /// Whether anything is drawn (off in quiet and JSON modes)
    enabled: bool,
    /// Spinner or bar currently on screen
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a reporter that never draws
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Spinner while policy documents load
    pub fn spinner(&mut self, message: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(spinner);
    }

    /// Bar counting resolved dependencies
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled || total == 0 {
            return;
        }

        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
        {
            bar.set_style(style.progress_chars("█▓▒░"));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Count one more resolved dependency
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    /// Remove the current spinner or bar from the screen
    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
