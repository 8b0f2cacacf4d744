//! Selecting and deleting losing revisions.

mod deletion_task;
mod threshold;

pub use deletion_task::DeletionTask;
pub use threshold::{is_eligible, ThresholdPolicy};
