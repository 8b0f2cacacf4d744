#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use couch_conflicts_core::{
    ConflictPage, Gateway, GatewayError, PageCursor, ProgressReporter, RawConflictRow,
};
use serde_json::{json, Value};

/// A conflicted document held by [`MemoryGateway`].
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: String,
    pub key: Value,
    pub conflicts: Vec<String>,
}

/// In-memory stand-in for a CouchDB database with a conflicts view.
///
/// Rows are served in insertion order; the cursor is the offset of the next row.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    pub documents: Vec<StoredDocument>,
    /// Raw rows spliced into the view output at the given position.
    pub injected_rows: Vec<(usize, Value)>,
    pub page_size: usize,
    pub document_count: u64,
    pub fail_on_page: Option<usize>,
    pub failing_revisions: HashSet<(String, String)>,
    pub missing_view: bool,
    pub session_open: bool,
    pub sessions_opened: usize,
    pub sessions_closed: usize,
    pub calls_outside_session: usize,
    pub pages_fetched: usize,
    pub delete_calls: Vec<(String, String)>,
}

impl MemoryGateway {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            document_count: 1000,
            ..Self::default()
        }
    }

    pub fn with_document(mut self, id: &str, key: Value, conflicts: &[&str]) -> Self {
        self.documents.push(StoredDocument {
            id: id.to_string(),
            key,
            conflicts: conflicts.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn with_raw_row(mut self, position: usize, row: Value) -> Self {
        self.injected_rows.push((position, row));
        self
    }

    pub fn fail_revision(mut self, id: &str, revision: &str) -> Self {
        self.failing_revisions
            .insert((id.to_string(), revision.to_string()));
        self
    }

    pub fn conflicts_of(&self, id: &str) -> Vec<String> {
        self.documents
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc.conflicts.clone())
            .unwrap_or_default()
    }

    fn view_rows(&self) -> Vec<Value> {
        let mut rows: Vec<Value> = self
            .documents
            .iter()
            .filter(|doc| !doc.conflicts.is_empty())
            .map(|doc| json!({"id": doc.id, "key": doc.key, "value": doc.conflicts}))
            .collect();
        for (position, row) in &self.injected_rows {
            let at = (*position).min(rows.len());
            rows.insert(at, row.clone());
        }
        rows
    }
}

impl Gateway for MemoryGateway {
    fn open_session(&mut self) -> Result<(), GatewayError> {
        self.session_open = true;
        self.sessions_opened += 1;
        Ok(())
    }

    fn close_session(&mut self) -> Result<(), GatewayError> {
        self.session_open = false;
        self.sessions_closed += 1;
        Ok(())
    }

    fn document_count(&mut self) -> Result<u64, GatewayError> {
        Ok(self.document_count)
    }

    fn verify_conflicts_view(&mut self) -> Result<(), GatewayError> {
        if self.missing_view {
            return Err(GatewayError::Protocol("missing view".to_string()));
        }
        Ok(())
    }

    fn fetch_conflict_page(&mut self, cursor: &PageCursor) -> Result<ConflictPage, GatewayError> {
        if !self.session_open {
            self.calls_outside_session += 1;
        }
        let offset = match cursor {
            PageCursor::Start => 0,
            PageCursor::Resume { key, .. } => key.as_u64().unwrap() as usize,
            PageCursor::End => return Ok(ConflictPage::terminal()),
        };

        self.pages_fetched += 1;
        if self.fail_on_page == Some(self.pages_fetched) {
            return Err(GatewayError::Transport {
                url: "memory://conflicts".to_string(),
                reason: "connection reset".to_string(),
            });
        }

        let rows = self.view_rows();
        let end = (offset + self.page_size).min(rows.len());
        let page: Vec<RawConflictRow> = rows[offset.min(end)..end]
            .iter()
            .cloned()
            .map(RawConflictRow::from)
            .collect();
        let next_cursor = if end < rows.len() {
            PageCursor::Resume {
                key: json!(end),
                document_id: String::new(),
            }
        } else {
            PageCursor::End
        };
        Ok(ConflictPage {
            rows: page,
            next_cursor,
        })
    }

    fn delete_revision(&mut self, document_id: &str, revision_id: &str) -> bool {
        if !self.session_open {
            self.calls_outside_session += 1;
        }
        self.delete_calls
            .push((document_id.to_string(), revision_id.to_string()));
        if self
            .failing_revisions
            .contains(&(document_id.to_string(), revision_id.to_string()))
        {
            return false;
        }
        match self.documents.iter_mut().find(|doc| doc.id == document_id) {
            Some(doc) => {
                let before = doc.conflicts.len();
                doc.conflicts.retain(|rev| rev != revision_id);
                doc.conflicts.len() < before
            }
            None => false,
        }
    }
}

/// Read a CSV file into rows of strings, header included.
pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap()
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    ScanStart,
    Heartbeat(u64),
    Milestone(u64),
    ScanComplete(u64),
    DeletionStart(usize),
    DeletionProgress(usize, usize),
    DeletionComplete(u64),
}

/// Progress reporter that remembers every call, in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressReporter for RecordingReporter {
    fn on_scan_start(&self) {
        self.push(ProgressEvent::ScanStart);
    }

    fn on_scan_heartbeat(&self, documents_processed: u64) {
        self.push(ProgressEvent::Heartbeat(documents_processed));
    }

    fn on_scan_milestone(&self, documents_processed: u64) {
        self.push(ProgressEvent::Milestone(documents_processed));
    }

    fn on_scan_complete(&self, total_documents: u64, _duration_secs: f64) {
        self.push(ProgressEvent::ScanComplete(total_documents));
    }

    fn on_deletion_start(&self, total_documents: usize) {
        self.push(ProgressEvent::DeletionStart(total_documents));
    }

    fn on_deletion_progress(&self, documents_processed: usize, total_documents: usize) {
        self.push(ProgressEvent::DeletionProgress(documents_processed, total_documents));
    }

    fn on_deletion_complete(&self, resolved_documents: u64, _duration_secs: f64) {
        self.push(ProgressEvent::DeletionComplete(resolved_documents));
    }
}
