//! Resource graph deserialization: wire documents -> plain resource records.
//!
//! The structural inverse of the resource-object encoding. Links and meta are
//! write-only projections and are deliberately not reversed.

use serde_json::{Map, Value};

use crate::document::{Document, PrimaryData, RelationshipData, ResourceObject};

/// Flatten a document's primary data into plain record(s): `id`, `type`,
/// spread attributes, and each relationship collapsed to its linkage.
pub fn deserialize(document: &Document) -> Value {
    match &document.data {
        None | Some(PrimaryData::Null) => Value::Null,
        Some(PrimaryData::One(object)) => from_resource_object(object),
        Some(PrimaryData::Many(objects)) => {
            Value::Array(objects.iter().map(from_resource_object).collect())
        }
    }
}

fn from_resource_object(object: &ResourceObject) -> Value {
    let mut record = Map::new();
    record.insert("id".to_string(), Value::String(object.id.clone()));
    record.insert("type".to_string(), Value::String(object.kind.clone()));
    for (name, value) in object.attributes.iter().flatten() {
        record.insert(name.clone(), value.clone());
    }
    for (name, relationship) in object.relationships.iter().flatten() {
        record.insert(name.clone(), from_relationship_data(relationship.data.as_ref()));
    }
    Value::Object(record)
}

fn from_relationship_data(data: Option<&RelationshipData>) -> Value {
    match data {
        None | Some(RelationshipData::Null) => Value::Null,
        Some(RelationshipData::One(linkage)) => {
            let mut record = Map::new();
            record.insert("id".to_string(), Value::String(linkage.id.clone()));
            record.insert("type".to_string(), Value::String(linkage.kind.clone()));
            Value::Object(record)
        }
        Some(RelationshipData::Many(linkages)) => Value::Array(
            linkages
                .iter()
                .map(|linkage| {
                    let mut record = Map::new();
                    record.insert("id".to_string(), Value::String(linkage.id.clone()));
                    record.insert("type".to_string(), Value::String(linkage.kind.clone()));
                    Value::Object(record)
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::serializer::{serialize, ResourceOptions, SerializationOptions};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn round_trips_attribute_only_resources() {
        let record = json!({"id": "1", "type": "apples", "kind": "Red Delicious"});
        let options = SerializationOptions {
            resources: HashMap::from([(
                "apples".to_string(),
                ResourceOptions {
                    attributes: vec!["kind".to_string()],
                    relationships: Vec::new(),
                },
            )]),
            ..SerializationOptions::default()
        };
        let document = serialize(&record, &options);
        assert_eq!(deserialize(&document), record);
    }

    #[test]
    fn collapses_relationship_linkage() {
        let document: Document = serde_json::from_value(json!({
            "data": {
                "id": "1",
                "type": "articles",
                "attributes": {"title": "Bikeshed"},
                "relationships": {
                    "author": {"data": {"id": "42", "type": "people"}},
                    "tags": {"data": [{"id": "jsonapi", "type": "tags"}]},
                    "editor": {"data": null}
                }
            }
        }))
        .expect("document should parse");
        let record = deserialize(&document);
        assert_eq!(record["title"], json!("Bikeshed"));
        assert_eq!(record["author"], json!({"id": "42", "type": "people"}));
        assert_eq!(record["tags"], json!([{"id": "jsonapi", "type": "tags"}]));
        assert_eq!(record["editor"], Value::Null);
    }

    #[test]
    fn null_document_data_deserializes_to_null() {
        let document: Document =
            serde_json::from_value(json!({"data": null})).expect("document should parse");
        assert_eq!(deserialize(&document), Value::Null);
    }
}
