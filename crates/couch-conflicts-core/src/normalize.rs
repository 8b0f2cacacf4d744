use serde_json::Value;
use thiserror::Error;

use crate::gateway::RawConflictRow;
use crate::model::{ConflictRecord, UNRESOLVED_NAME};

pub const SUBSTITUTE_BLOCK_CHAR: char = '█';

const PROPERTY_ID: &str = "id";
const PROPERTY_KEY: &str = "key";
const PROPERTY_VALUE: &str = "value";

/// A conflicts-view row that cannot be turned into a [`ConflictRecord`].
/// Carries the row's position in the scan stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Undefined row encountered in the view result set at index [{0}].")]
    UndefinedRow(usize),

    #[error("Row with an undefined ID encountered in the view result set at index [{0}].")]
    MissingId(usize),

    #[error(
        "Row with an undefined key encountered in the view result set at index [{0}]. \
         Document ID: {1}."
    )]
    MissingKey(usize, String),

    #[error(
        "Invalid or empty list of conflicted document revisions encountered in the view \
         result set at index [{0}]. Document ID: {1}."
    )]
    InvalidRevisionList(usize, String),
}

/// Validate a raw view row and build the canonical record from it.
///
/// Checks run in order and the first failure wins: row present, `id`, `key`,
/// then a non-empty list of revision strings under `value`.
pub fn normalize(row: &RawConflictRow, index: usize) -> Result<ConflictRecord, ValidationError> {
    let fields = match row.as_value() {
        Value::Object(fields) if !fields.is_empty() => fields,
        _ => return Err(ValidationError::UndefinedRow(index)),
    };

    let document_id = match fields.get(PROPERTY_ID) {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        _ => return Err(ValidationError::MissingId(index)),
    };

    let display_name = match fields.get(PROPERTY_KEY) {
        None => return Err(ValidationError::MissingKey(index, document_id)),
        Some(Value::String(key)) if !key.is_empty() => {
            sanitize_control_characters(key, SUBSTITUTE_BLOCK_CHAR)
        }
        Some(_) => UNRESOLVED_NAME.to_string(),
    };

    let revisions = match fields.get(PROPERTY_VALUE) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>(),
        _ => None,
    };

    revisions
        .and_then(|revisions| ConflictRecord::new(document_id.clone(), display_name, revisions))
        .ok_or(ValidationError::InvalidRevisionList(index, document_id))
}

/// Replace every C0 control character and DEL with `substitute`.
pub fn sanitize_control_characters(text: &str, substitute: char) -> String {
    text.chars()
        .map(|c| if c.is_ascii_control() { substitute } else { c })
        .collect()
}
