use std::path::PathBuf;

use tracing::{error, info, trace, warn};

use crate::audit::{AuditCsv, SCAN_HEADERS};
use crate::config::AppConfig;
use crate::error::Error;
use crate::gateway::{Gateway, PageCursor, RawConflictRow};
use crate::model::{RunStatistics, ScanReport};
use crate::normalize::normalize;
use crate::progress::{ProgressReporter, SilentReporter};
use crate::remediation::ThresholdPolicy;
use crate::task::Task;
use crate::timer::Stopwatch;

/// Where a scan is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Paginating,
    Fetching,
    Normalizing,
    Recording,
    Draining,
    Done,
    Failed,
}

/// Pages through the conflicts view, writes the scan audit CSV and, in
/// deletion mode, buffers the records that pass the threshold.
///
/// A failed page fetch aborts the scan; a malformed row is logged and skipped.
pub struct ScanTask<'a, G: Gateway + ?Sized> {
    gateway: &'a mut G,
    config: &'a AppConfig,
    policy: ThresholdPolicy,
    remediation_enabled: bool,
    csv_path: PathBuf,
    reporter: &'a dyn ProgressReporter,
    state: ScanState,
}

impl<'a, G: Gateway + ?Sized> ScanTask<'a, G> {
    pub fn new(
        gateway: &'a mut G,
        config: &'a AppConfig,
        remediation_enabled: bool,
        csv_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            config,
            policy: ThresholdPolicy::new(config.threshold),
            remediation_enabled,
            csv_path: csv_path.into(),
            reporter: &SilentReporter,
            state: ScanState::Idle,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    fn process_row(
        &mut self,
        row: &RawConflictRow,
        index: usize,
        stats: &mut RunStatistics,
        report: &mut ScanReport,
        audit: &mut AuditCsv<std::fs::File>,
    ) {
        trace!("[{}] Row: {:?}", index, row);

        self.state = ScanState::Normalizing;
        let record = match normalize(row, index) {
            Ok(record) => record,
            Err(err) => {
                error!("{}", err);
                report.total_invalid_rows += 1;
                return;
            }
        };

        info!(
            "[{}] Document ID: {}. Name: {}. Conflicts: {}.",
            index,
            record.document_id(),
            record.display_name(),
            record.conflict_count()
        );

        self.state = ScanState::Recording;
        stats.total_conflicted_documents += 1;
        stats.total_conflicted_revisions += record.conflict_count() as u64;
        audit.write_scan_row(&record);

        if self.remediation_enabled {
            if self.policy.is_eligible(&record) {
                report.buffer.push(record);
            } else {
                warn!(
                    "Conflicted document omitted from deletion phase due to exceeding revision \
                     threshold. Document ID: {}. Name: {}. Conflicts: {} > {}.",
                    record.document_id(),
                    record.display_name(),
                    record.conflict_count(),
                    self.policy.threshold()
                );
                report.total_omitted_documents += 1;
            }
        }

        self.report_progress(stats.total_conflicted_documents);
    }

    fn report_progress(&self, processed: u64) {
        if processed % self.config.progress_major_interval == 0 {
            info!("Conflicted Documents Processed: {}.", processed);
            self.reporter.on_scan_milestone(processed);
        } else if processed % self.config.progress_minor_interval == 0 {
            self.reporter.on_scan_heartbeat(processed);
        }
    }
}

impl<'a, G: Gateway + ?Sized> Task for ScanTask<'a, G> {
    type Report = ScanReport;

    fn run(&mut self) -> Result<ScanReport, Error> {
        info!("Scanning database for conflicted documents...");
        let stopwatch = Stopwatch::start();
        let mut audit = AuditCsv::create(&self.csv_path, &SCAN_HEADERS)?;
        self.reporter.on_scan_start();
        self.state = ScanState::Paginating;

        let mut report = ScanReport::default();
        let mut stats = RunStatistics::default();
        let mut cursor = PageCursor::Start;
        let mut index = 0usize;

        loop {
            self.state = ScanState::Fetching;
            let page = match self.gateway.fetch_conflict_page(&cursor) {
                Ok(page) => page,
                Err(err) => {
                    self.state = ScanState::Failed;
                    error!("Failed to retrieve conflicts page after {} rows: {}", index, err);
                    if let Err(close_err) = audit.finish() {
                        error!("Failed to close scan CSV file: {}", close_err);
                    }
                    return Err(err.into());
                }
            };
            if page.rows.is_empty() {
                break;
            }

            for row in &page.rows {
                self.process_row(row, index, &mut stats, &mut report, &mut audit);
                index += 1;
            }
            cursor = page.next_cursor;
        }

        self.state = ScanState::Draining;
        if stats.total_conflicted_documents == 0 {
            info!("No conflicted documents found in database.");
        }
        if let Err(err) = audit.finish() {
            error!("Failed to close scan CSV file: {}", err);
        }

        report.total_conflicted_documents = stats.total_conflicted_documents;
        report.total_conflicted_revisions = stats.total_conflicted_revisions;
        report.elapsed = stopwatch.elapsed();
        self.state = ScanState::Done;

        info!(
            "Successfully scanned database for conflicted documents ({} ms).",
            report.elapsed.as_millis()
        );
        self.reporter
            .on_scan_complete(report.total_conflicted_documents, report.elapsed.as_secs_f64());
        Ok(report)
    }
}
