//! The request pipeline: an ordered sequence of async steps threading one
//! request-scoped context, stopping as soon as a terminal reply exists.

pub mod steps;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::document::Document;
use crate::error::JsonapiError;
use crate::handler::{HandlerRequest, Operation, PageData, PathParams};
use crate::query::Query;
use crate::schema::{Registry, ResourceDefinition};

/// Terminal response signal handed back to the transport layer: a status
/// code, an optional document body, and an optional location for created
/// resources.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub document: Option<Document>,
    pub location: Option<String>,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Reply {
            status,
            document: None,
            location: None,
        }
    }

    pub fn with_document(status: u16, document: Document) -> Self {
        Reply {
            status,
            document: Some(document),
            location: None,
        }
    }
}

/// Raw request input from the transport layer: the request URL (used for the
/// top-level `self` link), its parsed query, path parameters, and body.
#[derive(Clone, Debug, Default)]
pub struct RawRequest {
    pub url: String,
    pub query: Query,
    pub params: PathParams,
    pub body: Option<Value>,
}

impl RawRequest {
    /// Build a request from a URL whose query fragment still needs parsing.
    pub fn from_url(
        url: impl Into<String>,
        params: PathParams,
        body: Option<Value>,
    ) -> Result<Self, JsonapiError> {
        let url = url.into();
        let query = match url.split_once('?') {
            Some((_, fragment)) => Query::parse(fragment)?,
            None => Query::default(),
        };
        Ok(RawRequest {
            url,
            query,
            params,
            body,
        })
    }
}

/// Result data captured from a handler invocation, pending serialization.
#[derive(Debug, Default)]
pub struct HandlerResponse {
    pub result: Option<Value>,
    pub page: Option<PageData>,
    pub meta: Option<Map<String, Value>>,
}

/// Request-scoped state threaded through every step by reference. Constructed
/// at the top of the pipeline; there is no ambient per-request state anywhere
/// else.
pub struct Context {
    pub registry: Arc<Registry>,
    pub definition: Arc<ResourceDefinition>,
    pub operation: Operation,
    pub raw: RawRequest,
    /// Normalized handler request, built by the build-request step.
    pub request: Option<HandlerRequest>,
    /// Deserialized request body resource, when the operation carries one.
    pub resource: Option<Value>,
    pub response: Option<HandlerResponse>,
    reply: Option<Reply>,
}

impl Context {
    pub fn new(
        registry: Arc<Registry>,
        definition: Arc<ResourceDefinition>,
        operation: Operation,
        raw: RawRequest,
    ) -> Self {
        Context {
            registry,
            definition,
            operation,
            raw,
            request: None,
            resource: None,
            response: None,
            reply: None,
        }
    }

    /// Finalize the reply. The first terminal reply wins; later sends are
    /// ignored.
    pub fn send(&mut self, reply: Reply) {
        if self.reply.is_none() {
            self.reply = Some(reply);
        }
    }

    pub fn sent(&self) -> bool {
        self.reply.is_some()
    }

    pub fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }

    pub fn request(&self) -> Result<&HandlerRequest, JsonapiError> {
        self.request
            .as_ref()
            .ok_or_else(|| JsonapiError::Unknown("handler request was not built".into()))
    }
}

/// One pipeline step: transform the context, optionally finalizing the reply.
#[async_trait]
pub trait Step: Send + Sync {
    async fn run(&self, ctx: &mut Context) -> Result<(), JsonapiError>;
}

pub type Steps = Vec<Box<dyn Step>>;

/// Run `steps` strictly in order, stopping once a reply has been finalized.
/// This short-circuit is the pipeline's only control flow; errors abort the
/// sequence and surface to the transport layer.
pub async fn sequence(ctx: &mut Context, steps: &[Box<dyn Step>]) -> Result<(), JsonapiError> {
    tracing::trace!(operation = %ctx.operation, resource = %ctx.definition.resource, "executing sequence");
    for step in steps {
        if ctx.sent() {
            tracing::trace!("reply was sent; breaking sequence");
            break;
        }
        step.run(ctx).await?;
    }
    tracing::trace!("sequence completed");
    Ok(())
}
