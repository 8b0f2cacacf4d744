//! Durable record of a run: per-document CSV files and the text summary.

pub mod csv;
pub mod summary;

pub use self::csv::{AuditCsv, DELETION_HEADERS, REVISION_SEPARATOR, SCAN_HEADERS};
pub use summary::{summarize, write_summary, Overview};
