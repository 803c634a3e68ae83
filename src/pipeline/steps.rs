//! Shared step factories used by every operation.

use async_trait::async_trait;
use std::sync::Arc;

use crate::codec;
use crate::document::Document;
use crate::error::{ErrorObject, JsonapiError};
use crate::handler::{HandlerRequest, Operation, UpdateOperation};
use crate::pipeline::{Context, Step};
use crate::query;
use crate::relations;
use crate::schema::{Association, ResourceDefinition};

/// Probe the handler before touching it: authorization, readiness, and
/// capability presence, each a terminal signal on failure.
pub struct VerifyHandler {
    pub definition: Arc<ResourceDefinition>,
    pub operation: Operation,
}

#[async_trait]
impl Step for VerifyHandler {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let handler = &self.definition.handler;
        let request = HandlerRequest {
            query: ctx.raw.query.clone(),
            params: ctx.raw.params.clone(),
        };
        if !handler.authorize(self.operation, &request).await? {
            return Err(JsonapiError::Unauthorized);
        }
        if !handler.ready(self.operation) {
            return Err(JsonapiError::Unavailable(self.operation));
        }
        if !handler.supports(self.operation) {
            return Err(JsonapiError::Forbidden(format!(
                "{} is not implemented for resource '{}'",
                self.operation, self.definition.resource
            )));
        }
        Ok(())
    }
}

pub struct VerifySparseFieldsets;

#[async_trait]
impl Step for VerifySparseFieldsets {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        query::verify_sparse_fieldsets(&ctx.raw.query, &ctx.registry)
    }
}

/// Freeze the normalized handler request from the raw transport input.
pub struct BuildRequest;

#[async_trait]
impl Step for BuildRequest {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        ctx.request = Some(HandlerRequest {
            query: ctx.raw.query.clone(),
            params: ctx.raw.params.clone(),
        });
        Ok(())
    }
}

/// Deserialize the request body document into a plain resource record.
pub struct DeserializeBody;

#[async_trait]
impl Step for DeserializeBody {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let body = ctx.raw.body.as_ref().ok_or_else(|| {
            JsonapiError::Validation(vec![ErrorObject::invalid(
                "/",
                "A request body is required for this operation.",
            )])
        })?;
        let document: Document = serde_json::from_value(body.clone()).map_err(|e| {
            JsonapiError::Validation(vec![ErrorObject::invalid(
                "/data",
                format!("The request body is not a valid document: {}.", e),
            )])
        })?;
        let record = codec::deserialize(&document);
        reject_foreign_fields(&record, &ctx.definition)?;
        ctx.resource = Some(record);
        Ok(())
    }
}

/// Foreign relations are computed at read time and never writable input.
fn reject_foreign_fields(
    record: &serde_json::Value,
    definition: &ResourceDefinition,
) -> Result<(), JsonapiError> {
    let records = match record {
        serde_json::Value::Array(records) => records.as_slice(),
        single => std::slice::from_ref(single),
    };
    for record in records {
        let object = match record.as_object() {
            Some(object) => object,
            None => continue,
        };
        for name in object.keys() {
            if let Some(field) = definition.relation(name) {
                if field.foreign {
                    return Err(JsonapiError::ForeignRelation {
                        relation: name.clone(),
                        meta: field.meta(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Resolve requested include paths onto the handler result in place.
pub struct ResolveIncludes;

#[async_trait]
impl Step for ResolveIncludes {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let include = ctx.raw.query.include.clone();
        if include.is_empty() {
            return Ok(());
        }
        if let Some(result) = ctx.response.as_mut().and_then(|r| r.result.as_mut()) {
            relations::resolve_includes(result, &include, &ctx.registry).await?;
        }
        Ok(())
    }
}

/// Gate relationship operations: the named field must be a relationship,
/// foreign relationships are never reachable through `relationships/` routes,
/// and add/remove semantics are only valid on to-many relations.
pub struct ValidateRelationship {
    pub definition: Arc<ResourceDefinition>,
    pub relation: String,
    pub operation: Option<UpdateOperation>,
}

#[async_trait]
impl Step for ValidateRelationship {
    async fn run(&self, _ctx: &mut Context) -> Result<(), JsonapiError> {
        let field = self.definition.relation(&self.relation).ok_or_else(|| {
            JsonapiError::NotFound("The relationship does not exist on this resource.".into())
        })?;
        if field.foreign {
            return Err(JsonapiError::ForeignRelation {
                relation: self.relation.clone(),
                meta: field.meta(),
            });
        }
        let is_to_many_operation = matches!(
            self.operation,
            Some(UpdateOperation::RelationshipAdd) | Some(UpdateOperation::RelationshipRemove)
        );
        if field.association == Association::One && is_to_many_operation {
            return Err(JsonapiError::Forbidden(format!(
                "cannot add or remove members of the to-one relationship '{}'",
                self.relation
            )));
        }
        Ok(())
    }
}

/// Backstop: reaching the end of a sequence without a reply is a fault.
pub struct EndRoute;

#[async_trait]
impl Step for EndRoute {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        if ctx.sent() {
            Ok(())
        } else {
            Err(JsonapiError::Unknown("no response was sent".into()))
        }
    }
}
