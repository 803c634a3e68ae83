//! Search: list a collection, with pagination links and includes.

use async_trait::async_trait;
use serde_json::Value;

use crate::codec::{serialize, SerializationOptions};
use crate::error::JsonapiError;
use crate::handler::{Operation, SearchOutcome};
use crate::pagination::{pagination_links, PaginationScope};
use crate::pipeline::{Context, HandlerResponse, Reply, Step, Steps};
use crate::pipeline::steps::{
    BuildRequest, EndRoute, ResolveIncludes, VerifyHandler, VerifySparseFieldsets,
};

pub(crate) fn steps(ctx: &Context) -> Steps {
    vec![
        Box::new(VerifySparseFieldsets),
        Box::new(VerifyHandler {
            definition: ctx.definition.clone(),
            operation: Operation::Search,
        }),
        Box::new(BuildRequest),
        Box::new(Invoke),
        Box::new(ResolveIncludes),
        Box::new(SendCollection),
        Box::new(EndRoute),
    ]
}

struct Invoke;

#[async_trait]
impl Step for Invoke {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        // default the page limit before invoking so the handler and the
        // generated links agree on it
        let default_page_size = ctx.definition.default_page_size;
        if let Some(request) = ctx.request.as_mut() {
            request.query.page.limit.get_or_insert(default_page_size);
        }
        let outcome = ctx.definition.handler.search(ctx.request()?).await?;
        match outcome {
            SearchOutcome::Ok { result, page, meta } => {
                ctx.response = Some(HandlerResponse {
                    result: Some(Value::Array(result)),
                    page,
                    meta,
                });
                Ok(())
            }
            SearchOutcome::NotFound => Err(JsonapiError::NotFound(
                "The requested resource does not exist on this server.".into(),
            )),
            SearchOutcome::Error(errors) => Err(JsonapiError::Handler(errors)),
        }
    }
}

struct SendCollection;

#[async_trait]
impl Step for SendCollection {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let response = ctx
            .response
            .take()
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;
        let result = response
            .result
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;

        let limit = ctx
            .request()?
            .query
            .page
            .limit
            .unwrap_or(ctx.definition.default_page_size);
        let mut options = SerializationOptions::for_request(
            &ctx.registry,
            &ctx.raw.query,
            &ctx.raw.url,
            response.meta,
        );
        options.page_links = pagination_links(
            response.page.as_ref(),
            &PaginationScope {
                prefix: ctx.registry.base_url(),
                kind: &ctx.definition.resource,
                relationship: None,
                style: ctx.definition.handler.page_style(),
                limit,
            },
        );

        let document = serialize(&result, &options);
        ctx.send(Reply::with_document(200, document));
        Ok(())
    }
}
