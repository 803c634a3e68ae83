//! Resource graph serialization: internal object graphs -> wire documents.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::document::{
    Document, Links, PrimaryData, RelationshipData, RelationshipObject, ResourceObject, ResourceRef,
};
use crate::query::Query;
use crate::schema::Registry;

/// Per-type field exposure after sparse-fieldset filtering.
#[derive(Clone, Debug, Default)]
pub struct ResourceOptions {
    pub attributes: Vec<String>,
    pub relationships: Vec<String>,
}

/// Per-request serialization configuration, built fresh for every request
/// from the immutable registry plus the request's query.
#[derive(Clone, Debug, Default)]
pub struct SerializationOptions {
    pub base_url: String,
    /// Top-level `self` link (the current request URL).
    pub self_link: Option<String>,
    /// Top-level meta; for collections a `count` member is added when
    /// `count_in_meta` is set.
    pub top_meta: Option<Map<String, Value>>,
    pub count_in_meta: bool,
    /// Extra top-level links (`prev`/`next` pagination).
    pub page_links: Links,
    /// Requested include paths, gating the `included` expansion.
    pub include: Vec<String>,
    pub resources: HashMap<String, ResourceOptions>,
    /// Present when serializing on behalf of a request; enables resource and
    /// relationship links and schema-derived relationship meta.
    pub registry: Option<Arc<Registry>>,
}

impl SerializationOptions {
    /// The `buildSerializerFromRequest` counterpart: expose every declared
    /// field that survives the sparse-fieldset filter, carry the request URL
    /// as the `self` link, and enable link/meta generation.
    pub fn for_request(
        registry: &Arc<Registry>,
        query: &Query,
        url: &str,
        top_meta: Option<Map<String, Value>>,
    ) -> Self {
        let mut resources = HashMap::new();
        for definition in registry.definitions() {
            let resource = definition.resource.as_str();
            let mut attributes = Vec::new();
            let mut relationships = Vec::new();
            definition.for_each_field(
                |name, _| {
                    if allow_field_if_sparse(name, query, resource) {
                        attributes.push(name.to_string());
                    }
                },
                |name, _| {
                    if allow_field_if_sparse(name, query, resource) {
                        relationships.push(name.to_string());
                    }
                },
            );
            resources.insert(
                resource.to_string(),
                ResourceOptions {
                    attributes,
                    relationships,
                },
            );
        }
        SerializationOptions {
            base_url: registry.base_url().to_string(),
            self_link: Some(format!("{}{}", registry.base_url(), url)),
            top_meta,
            count_in_meta: true,
            page_links: Links::new(),
            include: query.include.clone(),
            resources,
            registry: Some(Arc::clone(registry)),
        }
    }

    fn included(&self, path: &str) -> bool {
        self.include
            .iter()
            .any(|requested| requested == path || requested.starts_with(&format!("{}.", path)))
    }

    fn top_links(&self) -> Option<Links> {
        let mut links = self.page_links.clone();
        if let Some(self_link) = &self.self_link {
            links.insert("self".to_string(), self_link.clone());
        }
        if links.is_empty() {
            None
        } else {
            Some(links)
        }
    }
}

fn allow_field_if_sparse(field: &str, query: &Query, resource: &str) -> bool {
    match query.fields.as_ref().and_then(|f| f.get(resource)) {
        Some(allowed) => allowed.iter().any(|name| name == field),
        None => true,
    }
}

/// Serialize a resource, a list of resources, or null into a document.
///
/// `data: null` is a valid "single resource not found" representation and is
/// distinct from an error document.
pub fn serialize(data: &Value, options: &SerializationOptions) -> Document {
    let mut document = Document::default();
    match data {
        Value::Array(items) => {
            document.meta = collection_meta(items.len(), options);
            document.links = options.top_links();
            let mut visited = HashSet::new();
            let mut included = Vec::new();
            let objects = items
                .iter()
                .filter_map(Value::as_object)
                .map(|item| {
                    collect_included(item, options, &mut visited, &mut included);
                    to_resource_object(item, options)
                })
                .collect();
            document.data = Some(PrimaryData::Many(objects));
            document.included = Some(included);
        }
        Value::Object(item) => {
            document.meta = options.top_meta.clone();
            document.links = options.top_links();
            let mut visited = HashSet::new();
            let mut included = Vec::new();
            collect_included(item, options, &mut visited, &mut included);
            document.data = Some(PrimaryData::One(to_resource_object(item, options)));
            document.included = Some(included);
        }
        _ => {
            document.meta = options.top_meta.clone();
            document.links = options.top_links();
            document.data = Some(PrimaryData::Null);
        }
    }
    document
}

fn collection_meta(count: usize, options: &SerializationOptions) -> Option<Map<String, Value>> {
    if !options.count_in_meta {
        return options.top_meta.clone();
    }
    let mut meta = options.top_meta.clone().unwrap_or_default();
    meta.insert("count".to_string(), Value::from(count as u64));
    Some(meta)
}

fn string_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn to_resource_object(data: &Map<String, Value>, options: &SerializationOptions) -> ResourceObject {
    let id = string_of(data.get("id"));
    let kind = string_of(data.get("type"));

    let mut object = ResourceObject {
        id,
        kind,
        attributes: None,
        relationships: None,
        links: None,
        meta: None,
    };

    let resource_options = match options.resources.get(&object.kind) {
        Some(resource_options) => resource_options,
        None => {
            tracing::warn!(resource = %object.kind, "serializer: undefined resource type");
            return object;
        }
    };

    if options.registry.is_some() {
        object.links = Some(Links::from([(
            "self".to_string(),
            format!("{}/{}/{}", options.base_url, object.kind, object.id),
        )]));
        if let Some(meta) = data.get("$meta").and_then(Value::as_object) {
            object.meta = Some(meta.clone());
        }
    }

    let mut attributes = Map::new();
    for name in &resource_options.attributes {
        if let Some(value) = data.get(name) {
            attributes.insert(name.clone(), value.clone());
        }
    }
    object.attributes = Some(attributes);

    if !resource_options.relationships.is_empty() {
        let mut relationships = std::collections::BTreeMap::new();
        for name in &resource_options.relationships {
            relationships.insert(
                name.clone(),
                to_relationship_object(name, data.get(name), data, options),
            );
        }
        object.relationships = Some(relationships);
    }

    object
}

fn to_relationship_object(
    name: &str,
    value: Option<&Value>,
    parent: &Map<String, Value>,
    options: &SerializationOptions,
) -> RelationshipObject {
    let mut object = RelationshipObject::default();

    let parent_kind = string_of(parent.get("type"));
    let parent_id = string_of(parent.get("id"));
    let field = options
        .registry
        .as_ref()
        .and_then(|registry| registry.definition(&parent_kind))
        .and_then(|definition| definition.relation(name));

    if let Some(field) = field {
        let mut links = Links::new();
        if field.foreign {
            // foreign relations are reachable only as a filtered query against
            // the target collection; there is no relationships/ sub-path
            if let Some(inverse) = &field.inverse {
                links.insert(
                    "related".to_string(),
                    format!(
                        "{}/{}?filter[{}]={}",
                        options.base_url, field.target, inverse, parent_id
                    ),
                );
            }
        } else {
            links.insert(
                "self".to_string(),
                format!(
                    "{}/{}/{}/relationships/{}",
                    options.base_url, parent_kind, parent_id, name
                ),
            );
            links.insert(
                "related".to_string(),
                format!("{}/{}/{}/{}", options.base_url, parent_kind, parent_id, name),
            );
        }
        object.links = Some(links);

        let mut meta = field.meta();
        if !field.foreign {
            if let Some(Value::Array(items)) = value {
                meta.insert("many".to_string(), Value::Bool(true));
                meta.insert("count".to_string(), Value::from(items.len() as u64));
            }
        }
        object.meta = Some(meta);
    }

    match value {
        None => {}
        Some(Value::Null) => object.data = Some(RelationshipData::Null),
        Some(Value::Array(items)) => {
            object.data = Some(RelationshipData::Many(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(to_resource_ref)
                    .collect(),
            ));
        }
        Some(Value::Object(item)) => {
            object.data = Some(RelationshipData::One(to_resource_ref(item)));
        }
        Some(other) => {
            tracing::warn!(relation = name, value = %other, "serializer: scalar relationship value");
            object.data = Some(RelationshipData::Null);
        }
    }
    object
}

fn to_resource_ref(item: &Map<String, Value>) -> ResourceRef {
    ResourceRef::new(string_of(item.get("id")), string_of(item.get("type")))
}

/// Walk the relationship values attached to `data`, appending each entity on a
/// requested include path to `out` at most once. The `type#id` visited set
/// both deduplicates and guarantees termination on cyclic graphs.
fn collect_included(
    data: &Map<String, Value>,
    options: &SerializationOptions,
    visited: &mut HashSet<String>,
    out: &mut Vec<ResourceObject>,
) {
    fn recurse(
        target: &Map<String, Value>,
        path: Option<&str>,
        options: &SerializationOptions,
        visited: &mut HashSet<String>,
        out: &mut Vec<ResourceObject>,
    ) {
        let kind = string_of(target.get("type"));
        let relationships = match options.resources.get(&kind) {
            Some(resource_options) => &resource_options.relationships,
            None => return,
        };
        for name in relationships {
            let current_path = match path {
                Some(path) => format!("{}.{}", path, name),
                None => name.clone(),
            };
            if !options.included(&current_path) {
                continue;
            }
            let items: Vec<&Map<String, Value>> = match target.get(name) {
                Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
                Some(Value::Object(item)) => vec![item],
                _ => continue,
            };
            for item in items {
                let hash = format!("{}#{}", string_of(item.get("type")), string_of(item.get("id")));
                if visited.insert(hash) {
                    out.push(to_resource_object(item, options));
                }
                recurse(item, Some(&current_path), options, visited, out);
            }
        }
    }
    recurse(data, None, options, visited, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apples_options() -> SerializationOptions {
        SerializationOptions {
            resources: HashMap::from([(
                "apples".to_string(),
                ResourceOptions {
                    attributes: vec!["kind".to_string()],
                    relationships: Vec::new(),
                },
            )]),
            ..SerializationOptions::default()
        }
    }

    #[test]
    fn serializes_id_type_and_attributes() {
        let data = json!({"id": "1", "type": "apples", "kind": "Red Delicious"});
        let document = serialize(&data, &apples_options());
        let resource = document.single().expect("single resource");
        assert_eq!(resource.id, "1");
        assert_eq!(resource.kind, "apples");
        assert_eq!(
            resource.attributes.as_ref().and_then(|a| a.get("kind")),
            Some(&json!("Red Delicious"))
        );
    }

    #[test]
    fn serializes_collections_in_order() {
        let data = json!([
            {"id": "1", "type": "apples", "kind": "Red Delicious"},
            {"id": "2", "type": "apples", "kind": "Granny Smith"}
        ]);
        let document = serialize(&data, &apples_options());
        let resources = document.many().expect("collection");
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].id, "1");
        assert_eq!(resources[1].id, "2");
        assert_eq!(
            resources[1].attributes.as_ref().and_then(|a| a.get("kind")),
            Some(&json!("Granny Smith"))
        );
    }

    #[test]
    fn ignores_undeclared_keys() {
        let data = json!({"id": "1", "type": "apples", "kind": "Red Delicious", "tastes": "ok"});
        let document = serialize(&data, &apples_options());
        let resource = document.single().expect("single resource");
        assert!(resource
            .attributes
            .as_ref()
            .map(|a| !a.contains_key("tastes"))
            .unwrap_or(false));
    }

    #[test]
    fn null_data_stays_null() {
        let document = serialize(&Value::Null, &apples_options());
        assert_eq!(document.data, Some(PrimaryData::Null));
        assert!(document.included.is_none());
    }
}
