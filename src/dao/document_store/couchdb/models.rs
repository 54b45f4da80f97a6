use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::document::{Collection, Document, Fields};

pub const ID_SEPARATOR: &str = "::";
pub const END_SUFFIX: &str = "\u{ffff}";

/// Key prefix shared by every document of a collection.
pub fn collection_prefix(collection: Collection) -> String {
    format!("{}{}", collection.name(), ID_SEPARATOR)
}

/// CouchDB `_id` of a collection document.
pub fn doc_id(collection: Collection, id: &str) -> String {
    format!("{}{}", collection_prefix(collection), id)
}

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

/// Row of `_all_docs`; rows for unknown keys carry an `error` and no document.
#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub key: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AllDocsKeys<'a> {
    pub keys: &'a [String],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "_deleted", default, skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(flatten)]
    pub fields: Fields,
}

impl CouchDocument {
    /// Strip the collection prefix and CouchDB bookkeeping fields.
    pub fn into_document(self, collection: Collection) -> Document {
        let prefix = collection_prefix(collection);
        let id = self
            .id
            .strip_prefix(&prefix)
            .map(str::to_string)
            .unwrap_or(self.id);
        let fields = self
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .collect();
        Document::new(id, fields)
    }
}

#[derive(Debug, Serialize)]
pub struct BulkDocsRequest {
    pub docs: Vec<CouchDocument>,
}

#[derive(Debug, Deserialize)]
pub struct BulkDocsRow {
    pub id: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseInfo {
    pub update_seq: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChangesResponse {
    pub results: Vec<ChangeRow>,
    pub last_seq: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRow {
    pub id: String,
}

/// Sequence tokens are opaque strings on CouchDB 2+ and integers on 1.x.
pub fn seq_token(value: &Value) -> String {
    match value {
        Value::String(token) => token.clone(),
        other => other.to_string(),
    }
}
