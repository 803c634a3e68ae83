//! Create: deserialize the body, check for conflicts, invoke the handler.

use async_trait::async_trait;
use serde_json::Value;

use crate::codec::{serialize, SerializationOptions};
use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{FindOutcome, MutateOutcome, Operation};
use crate::pipeline::steps::{BuildRequest, DeserializeBody, EndRoute, VerifyHandler};
use crate::pipeline::{Context, HandlerResponse, Reply, Step, Steps};

pub(crate) fn steps(ctx: &Context) -> Steps {
    vec![
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Create,
        }),
        Box::new(DeserializeBody),
        Box::new(BuildRequest),
        Box::new(CheckConflicts),
        Box::new(Invoke),
        Box::new(SendCreated),
        Box::new(EndRoute),
    ]
}

/// A client-generated id must not collide with an existing resource, and the
/// supplied type must match the addressed collection.
struct CheckConflicts;

#[async_trait]
impl Step for CheckConflicts {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let resource = ctx
            .resource
            .as_ref()
            .ok_or_else(|| JsonapiError::Unknown("request body was not deserialized".into()))?;

        if let Some(kind) = resource.get("type").and_then(Value::as_str) {
            if kind != ctx.definition.resource {
                return Err(JsonapiError::Conflict(format!(
                    "Resource type '{}' is not among the types of collection '{}'.",
                    kind, ctx.definition.resource
                )));
            }
        }

        let id = match resource.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => return Ok(()),
        };

        // existence probe via the find capability
        let handler = &ctx.definition.handler;
        if !handler.supports(Operation::Find) {
            tracing::warn!(
                resource = %ctx.definition.resource,
                "cannot check for conflicts without a find capability"
            );
            return Err(JsonapiError::Forbidden(
                "client-generated ids are not accepted by this resource".into(),
            ));
        }
        let mut request = ctx.request()?.clone();
        request.params.id = Some(id);
        match handler.find(&request).await? {
            FindOutcome::Ok { .. } => Err(JsonapiError::Conflict(
                "A resource with this id already exists on the server.".into(),
            )),
            FindOutcome::NotFound => Ok(()),
            FindOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}

struct Invoke;

#[async_trait]
impl Step for Invoke {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let mut resource = ctx
            .resource
            .take()
            .ok_or_else(|| JsonapiError::Unknown("request body was not deserialized".into()))?;
        let needs_id = resource
            .get("id")
            .and_then(Value::as_str)
            .map(str::is_empty)
            .unwrap_or(true);
        if needs_id {
            let id = ctx.definition.generate_id();
            if let Some(object) = resource.as_object_mut() {
                object.insert("id".to_string(), Value::String(id));
            }
        }

        let outcome = ctx
            .definition
            .handler
            .create(ctx.request()?, resource)
            .await?;
        match outcome {
            MutateOutcome::Ok { result, meta } => {
                ctx.response = Some(HandlerResponse {
                    result,
                    page: None,
                    meta,
                });
                Ok(())
            }
            MutateOutcome::Accepted { meta } => {
                // processing continues after the response; the server must
                // answer 202 with any meta the handler supplied
                let mut document = Document::default();
                let mut merged = ctx.registry.meta().cloned().unwrap_or_default();
                merged.extend(meta.unwrap_or_default());
                if !merged.is_empty() {
                    document.meta = Some(merged);
                }
                ctx.send(Reply::with_document(202, document));
                Ok(())
            }
            MutateOutcome::Conflict => Err(JsonapiError::Conflict(
                "A resource with this id already exists on the server.".into(),
            )),
            MutateOutcome::NotFound => Err(JsonapiError::NotFound(
                "The requested resource does not exist on this server.".into(),
            )),
            MutateOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}

struct SendCreated;

#[async_trait]
impl Step for SendCreated {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let response = ctx.response.take().unwrap_or_default();
        let result = match response.result {
            Some(result) => result,
            // a create that accepted a client-generated id may legitimately
            // answer with no document
            None if ctx.definition.allows_id_on_create => {
                ctx.send(Reply::status(204));
                return Ok(());
            }
            None => {
                return Err(JsonapiError::Unknown(
                    "missing response data from create request".into(),
                ))
            }
        };

        let options = SerializationOptions::for_request(
            &ctx.registry,
            &ctx.raw.query,
            &ctx.raw.url,
            response.meta,
        );
        let mut document = serialize(&result, &options);
        if let Some(configured) = ctx.registry.meta() {
            let mut merged = configured.clone();
            merged.extend(document.meta.take().unwrap_or_default());
            document.meta = Some(merged);
        }

        // the location of the created resource mirrors its self link
        let location = document
            .single()
            .and_then(|resource| resource.links.as_ref())
            .and_then(|links| links.get("self"))
            .cloned();
        ctx.send(Reply {
            status: 201,
            document: Some(document),
            location,
        });
        Ok(())
    }
}
