//! Wire document shapes for the resource API format (JSON:API 1.0).
//!
//! Option fields distinguish an absent key from an explicit `null`: a to-one
//! relationship with no value serializes `"data": null`, while a relationship
//! whose value was never populated omits the `data` key entirely.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::ErrorObject;

/// `links` member: link name -> URL.
pub type Links = BTreeMap<String, String>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JsonapiObject {
    pub version: String,
}

impl Default for JsonapiObject {
    fn default() -> Self {
        JsonapiObject {
            version: "1.0".to_string(),
        }
    }
}

/// Minimal resource linkage: the `(id, type)` pair identifying one entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ResourceRef {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        ResourceRef {
            id: id.into(),
            kind: kind.into(),
            meta: None,
        }
    }
}

/// Relationship linkage: one ref, a list of refs, or an explicit null.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RelationshipData {
    Many(Vec<ResourceRef>),
    One(ResourceRef),
    Null,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RelationshipObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceObject {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<BTreeMap<String, RelationshipObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

/// Primary `data` member: a single resource object, a collection, or null.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<ResourceObject>),
    One(ResourceObject),
    Null,
}

/// Top-level document: success envelope when `data` is set, error envelope
/// when `errors` is set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Document {
    #[serde(default)]
    pub jsonapi: JsonapiObject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<PrimaryData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorObject>>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            jsonapi: JsonapiObject::default(),
            meta: None,
            links: None,
            data: None,
            included: None,
            errors: None,
        }
    }
}

impl Document {
    pub fn from_errors(errors: Vec<ErrorObject>) -> Self {
        Document {
            errors: Some(errors),
            ..Document::default()
        }
    }

    /// The primary resource object, when `data` holds exactly one.
    pub fn single(&self) -> Option<&ResourceObject> {
        match self.data.as_ref()? {
            PrimaryData::One(obj) => Some(obj),
            _ => None,
        }
    }

    /// The primary resource collection, when `data` holds a list.
    pub fn many(&self) -> Option<&[ResourceObject]> {
        match self.data.as_ref()? {
            PrimaryData::Many(items) => Some(items),
            _ => None,
        }
    }
}
