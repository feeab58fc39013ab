//! JSON rendering of translation results.
//!
//! BSON values are written as relaxed extended JSON, so plain numbers and
//! strings stay plain while dates, ids and patterns keep their type:
//!
//! ```text
//! {"type":"find","collection":"users",
//!  "filter":{"_id":{"$oid":"5d3937af498831003e9f6f2a"}},
//!  "options":{"skip":null,"limit":10,"projection":null,"sort":null,"hint":null}}
//! ```
//!
//! # Examples
//!
//! ```
//! use sql_to_mongodb_query::SqlToMongo;
//! use sql_to_mongodb_query::output::to_json;
//!
//! let query = SqlToMongo::new()
//!     .parse("SELECT * FROM users WHERE age > 12")
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(
//!     to_json(&query),
//!     r#"{"type":"find","collection":"users","filter":{"age":{"$gt":12}},"options":{"skip":null,"limit":null,"projection":null,"sort":null,"hint":null}}"#
//! );
//! ```

use bson::{Bson, Document};
use serde_json::{Map, Value, json};

use crate::query::Query;

/// Query as a JSON value.
pub fn to_value(query: &Query) -> Value {
    match query {
        Query::Find(find) => json!({
            "type": query.kind(),
            "collection": find.collection,
            "filter": document_value(find.filter_document()),
            "options": document_value(find.options().to_document()),
        }),
        Query::Aggregate(aggregate) => json!({
            "type": query.kind(),
            "collection": aggregate.collection,
            "pipeline": aggregate
                .pipeline_documents()
                .into_iter()
                .map(document_value)
                .collect::<Vec<_>>(),
            "hint": aggregate.hint,
        }),
    }
}

/// Compact JSON.
pub fn to_json(query: &Query) -> String {
    to_value(query).to_string()
}

/// JSON with 2-space indentation.
pub fn to_json_pretty(query: &Query) -> String {
    // a `Value` always serializes
    serde_json::to_string_pretty(&to_value(query)).unwrap_or_else(|_| to_json(query))
}

/// Relaxed extended JSON of a document, keeping its key order.
pub fn document_value(document: Document) -> Value {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Aggregate, Stage};
    use bson::doc;

    #[test]
    fn test_aggregate_shape() {
        let query = Query::Aggregate(Aggregate {
            collection: "logs".to_string(),
            pipeline: vec![Stage::Match(Document::new()), Stage::Limit(10)],
            hint: Some("created_at_idx".to_string()),
        });

        assert_eq!(
            to_value(&query),
            json!({
                "type": "aggregate",
                "collection": "logs",
                "pipeline": [{ "$match": {} }, { "$limit": 10 }],
                "hint": "created_at_idx",
            })
        );
    }

    #[test]
    fn test_typed_values_keep_their_type() {
        let value = document_value(doc! {
            "name": { "$regex": "^ndd", "$options": "i" },
            "total": 1.5,
        });
        assert_eq!(value["total"], json!(1.5));
        assert_eq!(value["name"]["$regex"], json!("^ndd"));
    }

    #[test]
    fn test_pretty_is_indented() {
        let query = Query::Aggregate(Aggregate {
            collection: "logs".to_string(),
            pipeline: vec![],
            hint: None,
        });
        assert!(to_json_pretty(&query).contains("\n  \"collection\": \"logs\""));
    }
}
