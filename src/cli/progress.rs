use fileflow::{BatchEvent, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (unknown total files upfront)
/// - Conversion phase: progress bar (total known once the filter has run)
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
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }
}

impl ProgressReporter for CliReporter {
    fn report(&self, event: &BatchEvent) {
        match event {
            BatchEvent::ScanStarted { .. } => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg}")
                        .unwrap()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
                );
                pb.set_message("Scanning files...");
                pb.enable_steady_tick(std::time::Duration::from_millis(80));
                self.set_bar(pb);
            }
            BatchEvent::CandidateDetected { path, .. } => {
                self.with_bar(|pb| pb.set_message(format!("Detected {}", path.display())));
            }
            BatchEvent::ScanCompleted { checked, detected } => {
                self.finish_bar();
                eprintln!(
                    "  \x1b[32m✓\x1b[0m Scan complete: {} files checked, {} detected",
                    checked, detected
                );
            }
            BatchEvent::SessionOpened { .. } => {
                let pb = ProgressBar::new(0);
                pb.set_style(
                    ProgressStyle::with_template(
                        "  {spinner:.cyan} Converting [{bar:30.cyan/dim}] {pos}/{len} files ({eta} remaining)",
                    )
                    .unwrap()
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
                );
                pb.enable_steady_tick(std::time::Duration::from_millis(80));
                self.set_bar(pb);
            }
            BatchEvent::JobStarted { index, total, .. } => {
                self.with_bar(|pb| {
                    if pb.length() != Some(*total as u64) {
                        pb.set_length(*total as u64);
                    }
                    pb.set_position(*index as u64);
                });
            }
            BatchEvent::JobConverted { .. }
            | BatchEvent::JobFailed { .. }
            | BatchEvent::JobSkipped { .. } => {
                self.with_bar(|pb| pb.inc(1));
            }
            BatchEvent::SessionClosed => self.finish_bar(),
            BatchEvent::BatchCompleted { summary } => {
                self.finish_bar();
                eprintln!("  \x1b[32m✓\x1b[0m Conversion complete: {}", summary);
            }
            BatchEvent::JobOpened { .. } => {}
        }
    }
}
