use std::path::PathBuf;

use tracing::{error, info, trace};

use crate::audit::{AuditCsv, DELETION_HEADERS};
use crate::error::Error;
use crate::gateway::Gateway;
use crate::model::{ConflictRecord, DeletionOutcome, DeletionReport, RunStatistics};
use crate::progress::{ProgressReporter, SilentReporter};
use crate::task::Task;
use crate::timer::Stopwatch;

/// Deletes the losing revisions of each buffered record, one document and
/// one revision at a time.
///
/// A failed revision delete is logged and skipped; the document is then
/// left partially resolved and its remaining revisions show up again on the
/// next scan.
pub struct DeletionTask<'a, G: Gateway + ?Sized> {
    gateway: &'a mut G,
    records: Vec<ConflictRecord>,
    csv_path: PathBuf,
    reporter: &'a dyn ProgressReporter,
}

impl<'a, G: Gateway + ?Sized> DeletionTask<'a, G> {
    pub fn new(
        gateway: &'a mut G,
        records: Vec<ConflictRecord>,
        csv_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            records,
            csv_path: csv_path.into(),
            reporter: &SilentReporter,
        }
    }

    pub fn with_reporter(mut self, reporter: &'a dyn ProgressReporter) -> Self {
        self.reporter = reporter;
        self
    }

    fn delete_conflicted_revisions(
        &mut self,
        document_index: usize,
        record: &ConflictRecord,
    ) -> DeletionOutcome {
        let mut outcome = DeletionOutcome::new(record);
        info!(
            "Deleting all conflicted revisions: {} ({})...",
            record.document_id(),
            record.conflict_count()
        );

        for (revision_index, revision_id) in record.losing_revision_ids().iter().enumerate() {
            info!(
                "[{}][{}] Revision ID: {}.",
                document_index, revision_index, revision_id
            );
            if self.gateway.delete_revision(record.document_id(), revision_id) {
                outcome.deleted_revision_ids.push(revision_id.clone());
            }
        }

        if outcome.resolved() {
            info!(
                "Successfully deleted all conflicted revisions: {} (deleted {} out of {}).",
                record.document_id(),
                outcome.deleted_count(),
                outcome.attempted_count
            );
        } else {
            error!(
                "Failed to delete all conflicted revisions: {} (deleted {} out of {}). \
                 Re-run to retry the remaining revisions.",
                record.document_id(),
                outcome.deleted_count(),
                outcome.attempted_count
            );
        }
        outcome
    }
}

impl<'a, G: Gateway + ?Sized> Task for DeletionTask<'a, G> {
    type Report = DeletionReport;

    fn run(&mut self) -> Result<DeletionReport, Error> {
        info!("Deleting document conflicts from database...");
        let stopwatch = Stopwatch::start();
        let mut audit = AuditCsv::create(&self.csv_path, &DELETION_HEADERS)?;

        let records = std::mem::take(&mut self.records);
        let total = records.len();
        self.reporter.on_deletion_start(total);

        let mut stats = RunStatistics::default();
        let mut outcomes = Vec::with_capacity(total);

        for (index, record) in records.iter().enumerate() {
            trace!("[{}] Record: {:?}", index, record);
            info!(
                "[{}] Document ID: {}. Name: {}. Conflicts: {}.",
                index,
                record.document_id(),
                record.display_name(),
                record.conflict_count()
            );

            stats.total_conflicted_documents += 1;
            stats.total_conflicted_revisions += record.conflict_count() as u64;

            let outcome = self.delete_conflicted_revisions(index, record);
            stats.total_deleted_revisions += outcome.deleted_count() as u64;
            if outcome.resolved() {
                stats.total_resolved_documents += 1;
            }

            audit.write_deletion_row(record, &outcome);
            outcomes.push(outcome);
            self.reporter.on_deletion_progress(index + 1, total);
        }

        if let Err(err) = audit.finish() {
            error!("Failed to close deletion CSV file: {}", err);
        }
        let elapsed = stopwatch.elapsed();
        info!(
            "Successfully deleted document conflicts from database ({} ms).",
            elapsed.as_millis()
        );
        self.reporter
            .on_deletion_complete(stats.total_resolved_documents, elapsed.as_secs_f64());

        Ok(DeletionReport {
            total_conflicted_documents: stats.total_conflicted_documents,
            total_conflicted_revisions: stats.total_conflicted_revisions,
            total_resolved_documents: stats.total_resolved_documents,
            total_deleted_revisions: stats.total_deleted_revisions,
            outcomes,
            elapsed,
        })
    }
}
