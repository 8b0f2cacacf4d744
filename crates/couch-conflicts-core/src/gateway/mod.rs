//! Database access used by the scan and deletion phases.
//!
//! [`Gateway`] is the seam between the engine and the network. The engine
//! only ever talks to the database through it, so tests drive the whole
//! pipeline with an in-memory implementation while production uses
//! [`CouchGateway`].

pub mod couch;
pub mod credentials;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::Error;

pub use couch::CouchGateway;
pub use credentials::{obfuscate, Credentials};

/// One row of the conflicts view, exactly as the server returned it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawConflictRow(Value);

impl RawConflictRow {
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for RawConflictRow {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Continuation token for paging through the conflicts view.
///
/// The scanner treats it as opaque and hands back whatever the previous
/// page returned.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageCursor {
    #[default]
    Start,
    /// Resume at the row with this key and document id (inclusive).
    Resume { key: Value, document_id: String },
    /// The previous page was the last one.
    End,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConflictPage {
    pub rows: Vec<RawConflictRow>,
    pub next_cursor: PageCursor,
}

impl ConflictPage {
    /// A well-formed page with no rows. Ends pagination.
    pub fn terminal() -> Self {
        Self {
            rows: Vec::new(),
            next_cursor: PageCursor::End,
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Request failed: {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Unexpected HTTP status {status}: {url}")]
    Status { status: u16, url: String },

    #[error("Malformed response: {0}")]
    Protocol(String),

    #[error("Database session is not open: {0}")]
    SessionClosed(String),
}

/// Capabilities the engine needs from the database.
///
/// All calls are blocking and issued one at a time.
pub trait Gateway {
    fn open_session(&mut self) -> Result<(), GatewayError>;

    fn close_session(&mut self) -> Result<(), GatewayError>;

    fn document_count(&mut self) -> Result<u64, GatewayError>;

    /// Fail unless the design document defining the conflicts view exists.
    fn verify_conflicts_view(&mut self) -> Result<(), GatewayError>;

    fn fetch_conflict_page(&mut self, cursor: &PageCursor) -> Result<ConflictPage, GatewayError>;

    /// Delete a single revision. Failures are reported as `false`, never as errors.
    fn delete_revision(&mut self, document_id: &str, revision_id: &str) -> bool;
}

/// Run `f` inside an open session. The session is closed afterwards whether
/// `f` succeeded or not; a failure to close is logged and does not mask the
/// result of `f`.
pub fn with_session<G, T, F>(gateway: &mut G, f: F) -> Result<T, Error>
where
    G: Gateway + ?Sized,
    F: FnOnce(&mut G) -> Result<T, Error>,
{
    gateway.open_session()?;
    let result = f(gateway);
    match gateway.close_session() {
        Ok(()) => info!("Database session closed."),
        Err(err) => warn!("Failed to close database session: {}", err),
    }
    result
}
