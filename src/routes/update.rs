//! Update: deserialize the body and merge it into the addressed resource.

use async_trait::async_trait;
use serde_json::Value;

use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{MutateOutcome, Operation, UpdateOperation};
use crate::pipeline::steps::{BuildRequest, DeserializeBody, EndRoute, VerifyHandler};
use crate::pipeline::{Context, HandlerResponse, Reply, Step, Steps};
use crate::routes::SendResource;

pub(crate) fn steps(ctx: &Context) -> Steps {
    vec![
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Update,
        }),
        Box::new(DeserializeBody),
        Box::new(BuildRequest),
        Box::new(Invoke),
        Box::new(SendResource { status: 200 }),
        Box::new(EndRoute),
    ]
}

struct Invoke;

#[async_trait]
impl Step for Invoke {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let mut data = ctx
            .resource
            .take()
            .ok_or_else(|| JsonapiError::Unknown("request body was not deserialized".into()))?;
        // the path id addresses the resource, whatever the body carried
        let id = ctx.request()?.params.id.clone().ok_or_else(|| {
            JsonapiError::Unknown("update requires an id path parameter".into())
        })?;
        if let Some(object) = data.as_object_mut() {
            object.insert("id".to_string(), Value::String(id));
        }

        let outcome = ctx
            .definition
            .handler
            .update(ctx.request()?, UpdateOperation::Update, data)
            .await?;
        match outcome {
            MutateOutcome::Ok { result: None, .. } => {
                ctx.send(Reply::status(204));
                Ok(())
            }
            MutateOutcome::Ok { result, meta } => {
                ctx.response = Some(HandlerResponse {
                    result,
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
