use std::time::Duration;

/// Display name used when a conflicted document has no usable key.
pub const UNRESOLVED_NAME: &str = "__UNRESOLVED__";

/// One conflicted document as surfaced by the conflicts view.
///
/// Always carries at least one losing revision; `conflict_count` is derived
/// from the revision list and cannot drift from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    document_id: String,
    display_name: String,
    losing_revision_ids: Vec<String>,
}

impl ConflictRecord {
    /// Returns `None` when `losing_revision_ids` is empty.
    pub fn new(
        document_id: impl Into<String>,
        display_name: impl Into<String>,
        losing_revision_ids: Vec<String>,
    ) -> Option<Self> {
        if losing_revision_ids.is_empty() {
            return None;
        }
        Some(Self {
            document_id: document_id.into(),
            display_name: display_name.into(),
            losing_revision_ids,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn losing_revision_ids(&self) -> &[String] {
        &self.losing_revision_ids
    }

    pub fn conflict_count(&self) -> usize {
        self.losing_revision_ids.len()
    }
}

/// Result of attempting to delete every losing revision of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub document_id: String,
    pub attempted_count: usize,
    pub deleted_revision_ids: Vec<String>,
}

impl DeletionOutcome {
    pub fn new(record: &ConflictRecord) -> Self {
        Self {
            document_id: record.document_id().to_string(),
            attempted_count: record.conflict_count(),
            deleted_revision_ids: Vec::with_capacity(record.conflict_count()),
        }
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted_revision_ids.len()
    }

    pub fn resolved(&self) -> bool {
        self.deleted_revision_ids.len() == self.attempted_count
    }
}

/// Counters accumulated by a single phase. Each task owns its own copy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStatistics {
    pub total_conflicted_documents: u64,
    pub total_conflicted_revisions: u64,
    pub total_resolved_documents: u64,
    pub total_deleted_revisions: u64,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub total_conflicted_documents: u64,
    pub total_conflicted_revisions: u64,
    /// Valid documents held back from remediation by the threshold.
    pub total_omitted_documents: u64,
    /// Rows rejected by the normalizer.
    pub total_invalid_rows: u64,
    /// Records eligible for remediation, in scan order. Empty unless deletion mode is on.
    pub buffer: Vec<ConflictRecord>,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct DeletionReport {
    pub total_conflicted_documents: u64,
    pub total_conflicted_revisions: u64,
    pub total_resolved_documents: u64,
    pub total_deleted_revisions: u64,
    pub outcomes: Vec<DeletionOutcome>,
    pub elapsed: Duration,
}
