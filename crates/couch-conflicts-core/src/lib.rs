pub mod audit;
pub mod config;
pub mod design_doc;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod progress;
pub mod remediation;
pub mod scanner;
pub mod task;
pub mod timer;

pub use crate::config::AppConfig;
pub use engine::{ConflictEngine, RunOptions, RunOutcome};
pub use error::Error;
pub use gateway::{ConflictPage, CouchGateway, Credentials, Gateway, GatewayError, PageCursor, RawConflictRow};
pub use model::{ConflictRecord, DeletionOutcome, DeletionReport, RunStatistics, ScanReport};
pub use progress::{ProgressReporter, SilentReporter};
pub use remediation::{DeletionTask, ThresholdPolicy};
pub use scanner::{ScanState, ScanTask};
pub use task::Task;
