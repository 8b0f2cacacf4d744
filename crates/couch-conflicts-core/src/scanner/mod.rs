mod scan_task;

pub use scan_task::{ScanState, ScanTask};
