//! Find: fetch a single resource by id.

use async_trait::async_trait;

use crate::error::JsonapiError;
use crate::handler::{FindOutcome, Operation};
use crate::pipeline::steps::{
    BuildRequest, EndRoute, ResolveIncludes, VerifyHandler, VerifySparseFieldsets,
};
use crate::pipeline::{Context, HandlerResponse, Step, Steps};
use crate::routes::SendResource;

pub(crate) fn steps(ctx: &Context) -> Steps {
    vec![
        Box::new(VerifySparseFieldsets),
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Find,
        }),
        Box::new(BuildRequest),
        Box::new(Invoke),
        Box::new(ResolveIncludes),
        Box::new(SendResource { status: 200 }),
        Box::new(EndRoute),
    ]
}

pub(crate) struct Invoke;

#[async_trait]
impl Step for Invoke {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let outcome = ctx.definition.handler.find(ctx.request()?).await?;
        match outcome {
            FindOutcome::Ok { result, meta } => {
                ctx.response = Some(HandlerResponse {
                    result: Some(result),
                    page: None,
                    meta,
                });
                Ok(())
            }
            FindOutcome::NotFound => Err(JsonapiError::NotFound(
                "The requested resource does not exist on this server.".into(),
            )),
            FindOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}
