//! The five operations plus relationship routes, each a fixed step sequence
//! over the shared pipeline.

pub mod create;
pub mod delete;
pub mod find;
pub mod relationships;
pub mod search;
pub mod update;

use async_trait::async_trait;
use std::sync::Arc;

use crate::codec::{serialize, SerializationOptions};
use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{Operation, UpdateOperation};
use crate::pipeline::{sequence, Context, RawRequest, Reply, Step};
use crate::schema::Registry;

/// Addressable routes exposed to the transport layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Search,
    Find,
    Create,
    Update,
    Delete,
    /// `GET {type}/{id}/{relation}`
    FindRelated,
    /// `GET {type}/{id}/relationships/{relation}`
    FindRelationship,
    /// `PATCH {type}/{id}/relationships/{relation}`
    UpdateRelationship,
    /// `POST {type}/{id}/relationships/{relation}`
    AddRelationship,
    /// `DELETE {type}/{id}/relationships/{relation}`
    RemoveRelationship,
}

impl Route {
    fn operation(self) -> Operation {
        match self {
            Route::Search => Operation::Search,
            Route::Find | Route::FindRelated | Route::FindRelationship => Operation::Find,
            Route::Create => Operation::Create,
            Route::Update
            | Route::UpdateRelationship
            | Route::AddRelationship
            | Route::RemoveRelationship => Operation::Update,
            Route::Delete => Operation::Delete,
        }
    }
}

/// Run one request through the route's step sequence.
///
/// Returns the terminal reply, or the structured error the transport layer
/// maps onto the wire (see [`error_reply`] for the default mapping).
pub async fn execute(
    registry: &Arc<Registry>,
    route: Route,
    resource: &str,
    raw: RawRequest,
) -> Result<Reply, JsonapiError> {
    let definition = registry
        .definition(resource)
        .ok_or_else(|| {
            JsonapiError::NotFound(format!(
                "The collection '{}' does not exist on this server.",
                resource
            ))
        })?
        .clone();
    tracing::debug!(route = ?route, resource = %resource, "invoke route");

    let mut ctx = Context::new(
        Arc::clone(registry),
        definition,
        route.operation(),
        raw,
    );
    let steps = match route {
        Route::Search => search::steps(&ctx),
        Route::Find => find::steps(&ctx),
        Route::Create => create::steps(&ctx),
        Route::Update => update::steps(&ctx),
        Route::Delete => delete::steps(&ctx),
        Route::FindRelated => relationships::find_related_steps(&ctx)?,
        Route::FindRelationship => relationships::find_relationship_steps(&ctx)?,
        Route::UpdateRelationship => {
            relationships::update_relationship_steps(&ctx, UpdateOperation::RelationshipUpdate)?
        }
        Route::AddRelationship => {
            relationships::update_relationship_steps(&ctx, UpdateOperation::RelationshipAdd)?
        }
        Route::RemoveRelationship => {
            relationships::update_relationship_steps(&ctx, UpdateOperation::RelationshipRemove)?
        }
    };
    sequence(&mut ctx, &steps).await?;
    ctx.take_reply()
        .ok_or_else(|| JsonapiError::Unknown("no response was sent".into()))
}

/// Default transport-side mapping of a pipeline error onto the wire: its
/// status code plus an error envelope.
pub fn error_reply(error: JsonapiError) -> Reply {
    Reply {
        status: error.status(),
        document: Some(Document::from_errors(error.into_errors())),
        location: None,
    }
}

/// Serialize the captured handler result and finalize with `status`. Shared
/// by find, update, and the relationship routes.
pub(crate) struct SendResource {
    pub status: u16,
}

#[async_trait]
impl Step for SendResource {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError> {
        let response = ctx
            .response
            .take()
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;
        let result = response
            .result
            .ok_or_else(|| JsonapiError::Unknown("must provide result data on response".into()))?;
        let options =
            SerializationOptions::for_request(&ctx.registry, &ctx.raw.query, &ctx.raw.url, response.meta);
        let document = serialize(&result, &options);
        ctx.send(Reply::with_document(self.status, document));
        Ok(())
    }
}
