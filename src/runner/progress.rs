use super::state::TestVerdict;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Console spinner shown while targets are being tested
///
/// Draws on stderr so machine-readable reports on stdout stay clean, and is
/// hidden entirely when stderr is not a terminal.
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        let bar = if enabled && std::io::stderr().is_terminal() {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_total(&self, total: usize) {
        self.bar.set_length(total as u64);
    }

    pub fn begin(&self, label: &str) {
        self.bar.set_message(format!("Testing {}", label.bold()));
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    pub fn end(&self, verdict: &TestVerdict) {
        let mark = if verdict.success {
            "✓".green()
        } else {
            "✗".red()
        };
        self.bar.println(format!(
            "{} {} ({:.2}s)",
            mark,
            verdict.target_name,
            verdict.elapsed.as_secs_f64()
        ));
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
