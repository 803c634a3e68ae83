//! Foreign-key search and include resolution.
//!
//! Related objects are never dereferenced from stored pointers: both forward
//! and foreign relations are satisfied by delegating to the target
//! collection's own search capability with a parent-scoped filter.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{ErrorObject, ErrorSource, JsonapiError};
use crate::handler::{HandlerRequest, Operation, ParentLinkage, PathParams, SearchOutcome};
use crate::query::{IncludeGraph, Query};
use crate::schema::{Association, Registry};

/// Resolve the value of `relation` on `data` by invoking the target
/// collection's search capability.
///
/// Forward relations filter the target by the foreign keys currently linked on
/// the source value; foreign relations filter by the inverse field carrying
/// the parent's id (the same query their `related` link renders). A `one`
/// association yields the first result or null, `many` the full result list.
pub async fn foreign_key_search(
    data: &Value,
    relation: &str,
    registry: &Arc<Registry>,
) -> Result<Value, JsonapiError> {
    let object = data
        .as_object()
        .ok_or_else(|| JsonapiError::Unknown("cannot resolve relations on a non-object".into()))?;
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonapiError::Unknown("resource is missing its type".into()))?;
    let id = object.get("id").and_then(Value::as_str).unwrap_or_default();

    let definition = registry
        .definition(kind)
        .ok_or_else(|| JsonapiError::Unknown(format!("no definition for type '{}'", kind)))?;
    let field = definition
        .relation(relation)
        .ok_or_else(|| not_a_relation(relation, kind))?;
    let target = registry.definition(&field.target).ok_or_else(|| {
        JsonapiError::Unknown(format!("no definition for type '{}'", field.target))
    })?;

    let mut query = Query::default();
    if field.foreign {
        if let Some(inverse) = &field.inverse {
            query
                .filter
                .insert(inverse.clone(), Value::String(id.to_string()));
        }
    } else {
        let foreign_keys: Vec<Value> = match object.get(relation) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.get("id"))
                .cloned()
                .collect(),
            Some(Value::Object(item)) => item.get("id").cloned().into_iter().collect(),
            _ => Vec::new(),
        };
        query
            .filter
            .insert("id".to_string(), Value::Array(foreign_keys));
    }
    let request = HandlerRequest {
        query,
        params: PathParams {
            parent: Some(ParentLinkage {
                id: id.to_string(),
                kind: kind.to_string(),
                relation: relation.to_string(),
            }),
            ..PathParams::default()
        },
    };

    let result = if target.handler.supports(Operation::Search) {
        match target.handler.search(&request).await? {
            SearchOutcome::Ok { result, .. } => result,
            SearchOutcome::NotFound => Vec::new(),
            SearchOutcome::Error(errors) => return Err(JsonapiError::Handler(errors)),
        }
    } else {
        tracing::debug!(target = %field.target, "relation target has no search capability");
        Vec::new()
    };

    match field.association {
        Association::One => Ok(result.into_iter().next().unwrap_or(Value::Null)),
        Association::Many => Ok(Value::Array(result)),
    }
}

fn not_a_relation(relation: &str, kind: &str) -> JsonapiError {
    JsonapiError::Validation(vec![ErrorObject {
        status: Some("422".to_string()),
        code: Some("EINVALID".to_string()),
        title: Some("Invalid Query".to_string()),
        detail: Some(format!(
            "'{}' is not a relationship on resource '{}'.",
            relation, kind
        )),
        source: Some(ErrorSource {
            pointer: None,
            parameter: Some("include".to_string()),
        }),
        ..ErrorObject::default()
    }])
}

/// Resolve every requested include path onto `result` in place, depth first,
/// so the serializer finds fully populated relationship values.
///
/// A resolution failure anywhere aborts the whole request: compound documents
/// must be internally consistent.
pub async fn resolve_includes(
    result: &mut Value,
    include: &[String],
    registry: &Arc<Registry>,
) -> Result<(), JsonapiError> {
    let graph = IncludeGraph::from_paths(include);
    if graph.is_empty() {
        return Ok(());
    }
    match result {
        Value::Array(items) => {
            for item in items {
                resolve_node(item, &graph, registry).await?;
            }
            Ok(())
        }
        Value::Object(_) => resolve_node(result, &graph, registry).await,
        _ => Ok(()),
    }
}

fn resolve_node<'a>(
    data: &'a mut Value,
    graph: &'a IncludeGraph,
    registry: &'a Arc<Registry>,
) -> Pin<Box<dyn Future<Output = Result<(), JsonapiError>> + Send + 'a>> {
    Box::pin(async move {
        for (relation, children) in graph.iter() {
            let resolved = foreign_key_search(data, relation, registry).await?;
            if let Some(object) = data.as_object_mut() {
                object.insert(relation.clone(), resolved);
            }
            if children.is_empty() {
                continue;
            }
            let value = data
                .as_object_mut()
                .and_then(|object| object.get_mut(relation));
            match value {
                Some(Value::Array(items)) => {
                    for item in items {
                        resolve_node(item, children, registry).await?;
                    }
                }
                Some(value @ Value::Object(_)) => {
                    resolve_node(value, children, registry).await?;
                }
                _ => {}
            }
        }
        Ok(())
    })
}
