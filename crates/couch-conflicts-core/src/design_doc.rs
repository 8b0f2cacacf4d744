use serde_json::{json, Value};

/// Map function behind the conflicts view: keyed by `entity.name`, valued
/// with the document's losing revisions.
pub const CONFLICTS_MAP_FUNCTION: &str = "function (doc) {
  if (doc._conflicts) {
    var name = null;
    if (doc.entity && doc.entity.name) {
      name = doc.entity.name;
    }
    emit(name, doc._conflicts);
  }
}";

/// The design document operators install so the scanner has a view to page through.
pub fn conflicts_design_document(design_document: &str, view_name: &str) -> Value {
    let mut views = serde_json::Map::new();
    views.insert(view_name.to_string(), json!({ "map": CONFLICTS_MAP_FUNCTION }));

    json!({
        "_id": format!("_design/{}", design_document),
        "language": "javascript",
        "views": views,
    })
}
