use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::entities::TokenEmbeddings;

/// Name of the score field merged into every ranked result.
pub const SIMILARITY_FIELD: &str = "similarity";

/// A stored document's identity plus caller-supplied attributes.
///
/// Attributes are never inspected by retrieval; they are echoed back in
/// ranked results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// One store entry. Both halves are immutable and shared, so snapshots are
/// cheap to take.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub record: Arc<DocumentRecord>,
    pub embeddings: Arc<TokenEmbeddings>,
}

impl StoredDocument {
    pub fn new(record: DocumentRecord, embeddings: TokenEmbeddings) -> Self {
        Self {
            record: Arc::new(record),
            embeddings: Arc::new(embeddings),
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

#[derive(Debug, Clone)]
pub struct RankedDocument {
    pub record: Arc<DocumentRecord>,
    pub similarity: f32,
}

impl RankedDocument {
    /// Flattens the result into one attribute map.
    ///
    /// Precedence on name collisions, lowest first: record attributes, the
    /// identifier under `key_field`, then `similarity`.
    pub fn to_attributes(&self, key_field: &str) -> Map<String, Value> {
        let mut attributes = self.record.fields.clone();
        attributes.insert(key_field.to_string(), Value::String(self.record.id.clone()));
        attributes.insert(SIMILARITY_FIELD.to_string(), Value::from(self.similarity));
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_attributes_merges_fields() {
        let ranked = RankedDocument {
            record: Arc::new(DocumentRecord::new("7").with_field("title", "Food")),
            similarity: 1.5,
        };

        let attrs = ranked.to_attributes("id");
        assert_eq!(attrs["id"], json!("7"));
        assert_eq!(attrs["title"], json!("Food"));
        assert_eq!(attrs["similarity"], json!(1.5));
    }

    #[test]
    fn test_to_attributes_similarity_wins_collision() {
        let record = DocumentRecord::new("a")
            .with_field("similarity", "caller value")
            .with_field("doc_id", "shadowed");
        let ranked = RankedDocument {
            record: Arc::new(record),
            similarity: 0.25,
        };

        let attrs = ranked.to_attributes("doc_id");
        assert_eq!(attrs["similarity"], json!(0.25));
        assert_eq!(attrs["doc_id"], json!("a"));
        assert_eq!(attrs.len(), 2);
    }
}
