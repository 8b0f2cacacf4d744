use crate::model::ConflictRecord;

/// Whether a record may be handed to the deletion phase.
///
/// Documents with more losing revisions than `threshold` point at a
/// replication problem rather than an ordinary write race; they stay in the
/// scan audit but are left for an operator.
pub fn is_eligible(record: &ConflictRecord, threshold: usize) -> bool {
    record.conflict_count() <= threshold
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    threshold: usize,
}

impl ThresholdPolicy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn is_eligible(&self, record: &ConflictRecord) -> bool {
        is_eligible(record, self.threshold)
    }
}
