use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::{error, info};

use crate::error::Error;
use crate::model::{ConflictRecord, DeletionOutcome};

pub const SCAN_HEADERS: [&str; 4] = ["ID", "Name", "Conflicts", "Revisions"];
pub const DELETION_HEADERS: [&str; 5] = ["ID", "Name", "Conflicts", "Deleted", "Revisions"];
pub const REVISION_SEPARATOR: &str = ";";

/// CSV audit file owned by one phase.
///
/// Each row is encoded on its own and written straight through to the file.
/// A row that fails to write (header included) is logged and dropped; the
/// file stays open for the rest of the run.
pub struct AuditCsv<W: Write> {
    label: String,
    encoder: ::csv::Writer<Vec<u8>>,
    inner: W,
    rows_written: usize,
}

impl AuditCsv<File> {
    pub fn create(path: &Path, headers: &[&str]) -> Result<Self, Error> {
        info!("Opening CSV file: {}...", path.display());
        let file = File::create(path)?;
        let audit = Self::from_writer(path.display().to_string(), file, headers);
        info!("Successfully opened CSV file: {}.", path.display());
        Ok(audit)
    }
}

impl<W: Write> AuditCsv<W> {
    pub fn from_writer(label: impl Into<String>, inner: W, headers: &[&str]) -> Self {
        let mut audit = Self {
            label: label.into(),
            encoder: ::csv::Writer::from_writer(Vec::new()),
            inner,
            rows_written: 0,
        };
        if let Err(err) = audit.write_line(headers) {
            error!("Failed to write CSV header to file: {}. {}", audit.label, err);
        }
        audit
    }

    /// Data rows that reached the file. The header is not counted.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// `ID,Name,Conflicts,Revisions` for a conflicted document.
    pub fn write_scan_row(&mut self, record: &ConflictRecord) {
        let conflicts = record.conflict_count().to_string();
        let revisions = record.losing_revision_ids().join(REVISION_SEPARATOR);
        self.write_fields(
            record.document_id(),
            &[
                record.document_id(),
                record.display_name(),
                &conflicts,
                &revisions,
            ],
        );
    }

    /// `ID,Name,Conflicts,Deleted,Revisions`; only revisions actually deleted are listed.
    pub fn write_deletion_row(&mut self, record: &ConflictRecord, outcome: &DeletionOutcome) {
        let conflicts = outcome.attempted_count.to_string();
        let deleted = outcome.deleted_count().to_string();
        let revisions = outcome.deleted_revision_ids.join(REVISION_SEPARATOR);
        self.write_fields(
            record.document_id(),
            &[
                record.document_id(),
                record.display_name(),
                &conflicts,
                &deleted,
                &revisions,
            ],
        );
    }

    fn write_fields(&mut self, document_id: &str, fields: &[&str]) {
        match self.write_line(fields) {
            Ok(()) => self.rows_written += 1,
            Err(err) => error!(
                "Failed to write CSV row to file: {}. Document ID: {}. {}",
                self.label, document_id, err
            ),
        }
    }

    /// Encode one record and push it to the file. The encoded bytes are
    /// taken out of the encoder first, so a failed write never leaks into
    /// the next row.
    fn write_line(&mut self, fields: &[&str]) -> Result<(), Error> {
        self.encoder.write_record(fields)?;
        self.encoder.flush()?;
        let encoder = std::mem::replace(&mut self.encoder, ::csv::Writer::from_writer(Vec::new()));
        let line = encoder.into_inner().map_err(|err| err.into_error())?;
        self.inner.write_all(&line)?;
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and close the file, handing back the underlying writer.
    pub fn finish(mut self) -> Result<W, Error> {
        info!("Closing CSV file: {}...", self.label);
        self.inner.flush()?;
        info!("Successfully closed CSV file: {}.", self.label);
        Ok(self.inner)
    }
}
