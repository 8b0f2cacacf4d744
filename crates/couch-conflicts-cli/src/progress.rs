use std::sync::Mutex;
use std::time::Duration;

use couch_conflicts_core::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (the number of conflicted documents is unknown upfront)
/// - Deletion phase: progress bar over the buffered documents
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
    fn on_scan_start(&self) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message("Scanning conflicts view...");
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_scan_heartbeat(&self, documents_processed: u64) {
        self.with_bar(|pb| {
            pb.set_message(format!(
                "Scanning... {} conflicted documents",
                documents_processed
            ))
        });
    }

    fn on_scan_milestone(&self, documents_processed: u64) {
        self.with_bar(|pb| {
            pb.println(format!("  {} conflicted documents processed", documents_processed))
        });
    }

    fn on_scan_complete(&self, total_documents: u64, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} conflicted documents in {:.2}s",
            total_documents, duration_secs
        );
    }

    fn on_deletion_start(&self, total_documents: usize) {
        let pb = ProgressBar::new(total_documents as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Deleting [{bar:30.cyan/dim}] {pos}/{len} documents ({eta} remaining)",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_deletion_progress(&self, documents_processed: usize, total_documents: usize) {
        self.with_bar(|pb| {
            if pb.length() != Some(total_documents as u64) {
                pb.set_length(total_documents as u64);
            }
            pb.set_position(documents_processed as u64);
        });
    }

    fn on_deletion_complete(&self, resolved_documents: u64, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Deletion complete: {} documents resolved in {:.2}s",
            resolved_documents, duration_secs
        );
    }
}
