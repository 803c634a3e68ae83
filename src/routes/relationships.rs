//! Relationship routes: fetch related resources, fetch relationship linkage,
//! and mutate relationship membership.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{MutateOutcome, Operation, UpdateOperation};
use crate::pipeline::steps::{
    BuildRequest, DeserializeBody, EndRoute, ResolveIncludes, ValidateRelationship, VerifyHandler,
    VerifySparseFieldsets,
};
use crate::pipeline::{Context, HandlerResponse, Reply, Step, Steps};
use crate::relations::foreign_key_search;
use crate::routes::{find, SendResource};

fn required_relation(ctx: &Context) -> Result<String, JsonapiError> {
    ctx.raw.params.relation.clone().ok_or_else(|| {
        JsonapiError::Unknown("relationship routes require a relation path parameter".into())
    })
}

/// `GET {type}/{id}/{relation}`: the related resources themselves. Both the
/// parent's find and the target's search capability must be live.
pub(crate) fn find_related_steps(ctx: &Context) -> Result<Steps, JsonapiError> {
    let relation = required_relation(ctx)?;
    let field = ctx.definition.relation(&relation).ok_or_else(|| {
        JsonapiError::NotFound("The relationship does not exist on this resource.".into())
    })?;
    let target = ctx.registry.definition(&field.target).ok_or_else(|| {
        JsonapiError::Unknown(format!("no definition for type '{}'", field.target))
    })?;
    Ok(vec![
        Box::new(VerifySparseFieldsets),
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Find,
        }),
        Box::new(VerifyHandler {
            definition: target.clone(),
            operation: Operation::Search,
        }),
        Box::new(BuildRequest),
        Box::new(find::Invoke),
        Box::new(FindRelated { relation }),
        Box::new(ResolveIncludes),
        Box::new(SendResource { status: 200 }),
        Box::new(EndRoute),
    ])
}

/// `GET {type}/{id}/relationships/{relation}`: the relationship linkage.
pub(crate) fn find_relationship_steps(ctx: &Context) -> Result<Steps, JsonapiError> {
    let relation = required_relation(ctx)?;
    Ok(vec![
        Box::new(ValidateRelationship {
            definition: ctx.definition.clone(),
            relation: relation.clone(),
            operation: None,
        }),
        Box::new(VerifySparseFieldsets),
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Find,
        }),
        Box::new(BuildRequest),
        Box::new(ProjectRelation { relation }),
        Box::new(ResolveIncludes),
        Box::new(SendResource { status: 200 }),
        Box::new(EndRoute),
    ])
}

/// `PATCH|POST|DELETE {type}/{id}/relationships/{relation}`: replace, add to,
/// or remove from the relationship.
pub(crate) fn update_relationship_steps(
    ctx: &Context,
    operation: UpdateOperation,
) -> Result<Steps, JsonapiError> {
    let relation = required_relation(ctx)?;
    Ok(vec![
        Box::new(ValidateRelationship {
            definition: ctx.definition.clone(),
            relation: relation.clone(),
            operation: Some(operation),
        }),
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Update,
        }),
        Box::new(DeserializeBody),
        Box::new(BuildRequest),
        Box::new(InvokeRelationshipUpdate {
            relation,
            operation,
        }),
        Box::new(SendResource { status: 200 }),
        Box::new(EndRoute),
    ])
}

/// Resolve the relation against the target collection after the parent has
/// been found.
struct FindRelated {
    relation: String,
}

#[async_trait]
impl Step for FindRelated {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let response = ctx
            .response
            .as_mut()
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;
        let result = response
            .result
            .as_ref()
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;
        if !result.is_object() {
            return Err(JsonapiError::Unknown(
                "find related should only operate on a single resource".into(),
            ));
        }
        let related = foreign_key_search(result, &self.relation, &ctx.registry).await?;
        response.result = Some(related);
        Ok(())
    }
}

/// Find the parent and project the relationship value out of it.
struct ProjectRelation {
    relation: String,
}

#[async_trait]
impl Step for ProjectRelation {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        find::Invoke.run(ctx).await?;
        if let Some(response) = ctx.response.as_mut() {
            let projected = response
                .result
                .as_ref()
                .and_then(|result| result.get(&self.relation))
                .cloned()
                .unwrap_or(Value::Null);
            response.result = Some(projected);
        }
        Ok(())
    }
}

struct InvokeRelationshipUpdate {
    relation: String,
    operation: UpdateOperation,
}

#[async_trait]
impl Step for InvokeRelationshipUpdate {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let refs = ctx
            .resource
            .take()
            .ok_or_else(|| JsonapiError::Unknown("request body was not deserialized".into()))?;
        let id = ctx.request()?.params.id.clone().ok_or_else(|| {
            JsonapiError::Unknown("relationship updates require an id path parameter".into())
        })?;

        let mut data = Map::new();
        data.insert("id".to_string(), Value::String(id));
        data.insert(
            "type".to_string(),
            Value::String(ctx.definition.resource.clone()),
        );
        data.insert(self.relation.clone(), refs);

        let outcome = ctx
            .definition
            .handler
            .update(ctx.request()?, self.operation, Value::Object(data))
            .await?;
        match outcome {
            MutateOutcome::Ok { result: None, .. } => {
                ctx.send(Reply::status(204));
                Ok(())
            }
            MutateOutcome::Ok { result, meta } => {
                let projected = result
                    .as_ref()
                    .and_then(|resource| resource.get(&self.relation))
                    .cloned()
                    .unwrap_or(Value::Null);
                ctx.response = Some(HandlerResponse {
                    result: Some(projected),
                    page: None,
                    meta,
                });
                Ok(())
            }
            MutateOutcome::Accepted { meta } => {
                let mut document = Document::default();
                document.meta = meta;
                ctx.send(Reply::with_document(202, document));
                Ok(())
            }
            MutateOutcome::Conflict => Err(JsonapiError::Conflict(
                "The requested update conflicts with the server state.".into(),
            )),
            MutateOutcome::NotFound => Err(JsonapiError::NotFound(
                "The requested resource does not exist on this server.".into(),
            )),
            MutateOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}
