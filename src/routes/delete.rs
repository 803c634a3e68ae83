//! Delete: remove the addressed resource.

use async_trait::async_trait;

use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{DeleteOutcome, Operation};
use crate::pipeline::steps::{BuildRequest, EndRoute, VerifyHandler};
use crate::pipeline::{Context, Reply, Step, Steps};

pub(crate) fn steps(ctx: &Context) -> Steps {
    vec![
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Delete,
        }),
        Box::new(BuildRequest),
        Box::new(Invoke),
        Box::new(EndRoute),
    ]
}

struct Invoke;

#[async_trait]
impl Step for Invoke {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let outcome = ctx.definition.handler.delete(ctx.request()?).await?;
        match outcome {
            DeleteOutcome::Ok { meta: Some(meta) } => {
                let mut document = Document::default();
                document.meta = Some(meta);
                ctx.send(Reply::with_document(200, document));
                Ok(())
            }
            DeleteOutcome::Ok { meta: None } => {
                ctx.send(Reply::status(204));
                Ok(())
            }
            DeleteOutcome::Accepted { meta } => {
                let mut document = Document::default();
                document.meta = meta;
                ctx.send(Reply::with_document(202, document));
                Ok(())
            }
            DeleteOutcome::NotFound => Err(JsonapiError::NotFound(
                "The requested resource does not exist on this server.".into(),
            )),
            DeleteOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}
