//! Progress display for batch runs
//!
//! Draws on stderr with indicatif: a spinner while files are located, then
//! one bar over every (upgrade, project file) invocation. Pair report lines
//! are printed through [`Progress::report_pair`] so they land above the bar.

use crate::domain::UpgradeSpec;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const SPINNER_TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";
const BATCH_TEMPLATE: &str = "{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})";

/// Progress reporter, a no-op when disabled (quiet or JSON mode)
pub struct Progress {
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Spinner shown while walking the tree, e.g. `locating("project files")`
    pub fn locating(&mut self, what: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars(SPINNER_TICKS)
            .template("{spinner:.cyan} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Locating {}...", what));
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.replace(spinner);
    }

    /// Bar over the whole plan × manifests cross product
    pub fn start_batch(&mut self, upgrades: usize, manifests: usize) {
        if !self.enabled {
            return;
        }

        let bar = ProgressBar::new((upgrades * manifests) as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(BATCH_TEMPLATE) {
            bar.set_style(style.progress_chars("█▓▒░"));
        }
        bar.set_message("Upgrading");
        bar.enable_steady_tick(Duration::from_millis(100));
        self.replace(bar);
    }

    /// Show which upgrade is running
    pub fn begin_pair(&self, spec: &UpgradeSpec) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} {}", spec.package, spec.version));
        }
    }

    /// One invocation finished
    pub fn invocation_done(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Run `print` with the bar hidden so pair lines do not garble it
    pub fn report_pair<F: FnOnce() -> T, T>(&self, print: F) -> T {
        match &self.bar {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }

    /// Remove whatever is currently drawn
    pub fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn replace(&mut self, bar: ProgressBar) {
        self.clear();
        self.bar = Some(bar);
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.clear();
    }
}
