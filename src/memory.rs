//! In-memory handler, seeded with example resources. Used by tests and demos;
//! also a reference for implementing the handler seam over a real store.
//!
//! The collection lives behind a mutex: the core makes no atomicity guarantee
//! over handler state, so concurrent mutation is this handler's own problem.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use crate::error::JsonapiError;
use crate::handler::{
    DeleteOutcome, FindOutcome, Handler, HandlerRequest, MutateOutcome, Operation, PageData,
    SearchOutcome, UpdateOperation,
};

pub struct MemoryHandler {
    resource: String,
    store: Mutex<Vec<Value>>,
}

impl MemoryHandler {
    pub fn new(resource: impl Into<String>, seed: Vec<Value>) -> Self {
        MemoryHandler {
            resource: resource.into(),
            store: Mutex::new(seed),
        }
    }

    /// Snapshot of the current collection.
    pub async fn records(&self) -> Vec<Value> {
        self.store.lock().await.clone()
    }
}

fn id_of(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// Filter values match either a scalar field, the id of a linked ref, or any
/// id within a to-many ref list. `filter[id]` accepts a comma-separated
/// string or a list of ids (the shape the include resolver sends).
fn matches_filters(item: &Value, filters: &BTreeMap<String, Value>) -> bool {
    filters.iter().all(|(key, expected)| {
        if key == "id" {
            let id = match id_of(item) {
                Some(id) => id,
                None => return false,
            };
            return match expected {
                Value::Array(wanted) => wanted
                    .iter()
                    .any(|value| value.as_str().map(|v| v == id).unwrap_or(false)),
                Value::String(wanted) => wanted.split(',').any(|v| v == id),
                _ => false,
            };
        }
        let expected = match expected {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match item.get(key) {
            Some(Value::Object(linked)) => linked
                .get("id")
                .and_then(Value::as_str)
                .map(|id| id == expected)
                .unwrap_or(false),
            Some(Value::Array(linked)) => linked.iter().any(|entry| {
                entry
                    .get("id")
                    .and_then(Value::as_str)
                    .map(|id| id == expected)
                    .unwrap_or(false)
            }),
            Some(Value::String(s)) => *s == expected,
            Some(other) => other.to_string() == expected,
            None => false,
        }
    })
}

#[async_trait]
impl Handler for MemoryHandler {
    fn supports(&self, _operation: Operation) -> bool {
        true
    }

    fn ready(&self, operation: Operation) -> bool {
        tracing::debug!(resource = %self.resource, %operation, "memory handler: ready");
        true
    }

    async fn search(&self, request: &HandlerRequest) -> Result<SearchOutcome, JsonapiError> {
        tracing::debug!(resource = %self.resource, "memory handler: search");
        let store = self.store.lock().await;
        let matched: Vec<Value> = store
            .iter()
            .filter(|item| matches_filters(item, &request.query.filter))
            .cloned()
            .collect();

        let limit = match request.query.page.limit {
            Some(limit) if limit > 0 => limit,
            _ => return Ok(SearchOutcome::ok(matched)),
        };
        let total = matched.len() as u64;
        let offset = request.query.page.offset.unwrap_or(0);
        let result = matched
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        let page = PageData {
            prev: (offset > 0).then(|| offset.saturating_sub(limit).to_string()),
            next: (offset + limit < total).then(|| (offset + limit).to_string()),
        };
        Ok(SearchOutcome::ok_paged(result, page))
    }

    async fn find(&self, request: &HandlerRequest) -> Result<FindOutcome, JsonapiError> {
        tracing::debug!(resource = %self.resource, "memory handler: find");
        let id = request.params.id.as_deref().unwrap_or_default();
        let store = self.store.lock().await;
        match store.iter().find(|item| id_of(item) == Some(id)) {
            Some(item) => Ok(FindOutcome::ok(item.clone())),
            None => Ok(FindOutcome::not_found()),
        }
    }

    async fn create(
        &self,
        _request: &HandlerRequest,
        mut data: Value,
    ) -> Result<MutateOutcome, JsonapiError> {
        tracing::debug!(resource = %self.resource, "memory handler: create");
        let mut store = self.store.lock().await;
        if let Some(id) = id_of(&data) {
            if store.iter().any(|item| id_of(item) == Some(id)) {
                return Ok(MutateOutcome::conflict());
            }
        }
        if let Some(object) = data.as_object_mut() {
            object.insert("type".to_string(), Value::String(self.resource.clone()));
        }
        store.push(data.clone());
        Ok(MutateOutcome::ok(data))
    }

    async fn update(
        &self,
        request: &HandlerRequest,
        operation: UpdateOperation,
        data: Value,
    ) -> Result<MutateOutcome, JsonapiError> {
        tracing::debug!(resource = %self.resource, ?operation, "memory handler: update");
        let id = request.params.id.as_deref().unwrap_or_default();
        let mut store = self.store.lock().await;
        let target = match store.iter_mut().find(|item| id_of(item) == Some(id)) {
            Some(target) => target,
            None => return Ok(MutateOutcome::not_found()),
        };
        let incoming = data.as_object().cloned().unwrap_or_default();

        match operation {
            UpdateOperation::Update => {
                if let Some(object) = target.as_object_mut() {
                    for (key, value) in incoming {
                        object.insert(key, value);
                    }
                }
            }
            UpdateOperation::RelationshipUpdate => {
                let relation = request.params.relation.as_deref().unwrap_or_default();
                if let Some(object) = target.as_object_mut() {
                    object.insert(
                        relation.to_string(),
                        incoming.get(relation).cloned().unwrap_or(Value::Null),
                    );
                }
            }
            UpdateOperation::RelationshipAdd => {
                let relation = request.params.relation.as_deref().unwrap_or_default();
                let additions = match incoming.get(relation) {
                    Some(Value::Array(items)) => items.clone(),
                    Some(Value::Object(item)) => vec![Value::Object(item.clone())],
                    _ => Vec::new(),
                };
                if let Some(object) = target.as_object_mut() {
                    let members = object
                        .entry(relation.to_string())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(members) = members {
                        members.extend(additions);
                    }
                }
            }
            UpdateOperation::RelationshipRemove => {
                let relation = request.params.relation.as_deref().unwrap_or_default();
                let removals: Vec<String> = match incoming.get(relation) {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(|item| id_of(item).map(str::to_string))
                        .collect(),
                    Some(item @ Value::Object(_)) => {
                        id_of(item).map(str::to_string).into_iter().collect()
                    }
                    _ => Vec::new(),
                };
                if let Some(Value::Array(members)) =
                    target.as_object_mut().and_then(|o| o.get_mut(relation))
                {
                    members.retain(|member| {
                        id_of(member)
                            .map(|id| !removals.iter().any(|r| r == id))
                            .unwrap_or(true)
                    });
                }
            }
        }
        Ok(MutateOutcome::ok(target.clone()))
    }

    async fn delete(&self, request: &HandlerRequest) -> Result<DeleteOutcome, JsonapiError> {
        tracing::debug!(resource = %self.resource, "memory handler: delete");
        let id = request.params.id.as_deref().unwrap_or_default();
        let mut store = self.store.lock().await;
        let before = store.len();
        store.retain(|item| id_of(item) != Some(id));
        if store.len() == before {
            return Ok(DeleteOutcome::not_found());
        }
        Ok(DeleteOutcome::ok())
    }
}
