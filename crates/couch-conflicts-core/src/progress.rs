/// Trait for reporting run progress.
///
/// CLI implements with indicatif. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self) {}
    /// Fired every `progress_minor_interval` valid documents.
    fn on_scan_heartbeat(&self, _documents_processed: u64) {}
    /// Fired every `progress_major_interval` valid documents.
    fn on_scan_milestone(&self, _documents_processed: u64) {}
    fn on_scan_complete(&self, _total_documents: u64, _duration_secs: f64) {}
    fn on_deletion_start(&self, _total_documents: usize) {}
    fn on_deletion_progress(&self, _documents_processed: usize, _total_documents: usize) {}
    fn on_deletion_complete(&self, _resolved_documents: u64, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
