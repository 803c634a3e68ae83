//! The handler seam: the capability set a storage collaborator exposes to the
//! pipeline. Capability presence is an explicit [`Handler::supports`] check
//! plus the `ready` probe; there is no reflection.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ErrorObject, JsonapiError};
use crate::query::Query;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Find,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Search => "search",
            Operation::Find => "find",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The kind of update requested by the client: a resource update, or one of
/// the relationship mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOperation {
    Update,
    RelationshipUpdate,
    RelationshipAdd,
    RelationshipRemove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageStyle {
    Offset,
    Cursor,
}

impl fmt::Display for PageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStyle::Offset => f.write_str("offset"),
            PageStyle::Cursor => f.write_str("cursor"),
        }
    }
}

/// Page cursors returned by a search handler, combined with the configured
/// page style and limit to build `prev`/`next` links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageData {
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Parent linkage attached to the synthetic request of a foreign-key search.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentLinkage {
    pub id: String,
    pub kind: String,
    pub relation: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathParams {
    pub id: Option<String>,
    pub relation: Option<String>,
    pub parent: Option<ParentLinkage>,
}

/// Normalized request handed to a handler capability.
#[derive(Clone, Debug, Default)]
pub struct HandlerRequest {
    pub query: Query,
    pub params: PathParams,
}

#[derive(Debug)]
pub enum SearchOutcome {
    Ok {
        result: Vec<Value>,
        page: Option<PageData>,
        meta: Option<Map<String, Value>>,
    },
    NotFound,
    Error(Vec<ErrorObject>),
}

impl SearchOutcome {
    pub fn ok(result: Vec<Value>) -> Self {
        SearchOutcome::Ok {
            result,
            page: None,
            meta: None,
        }
    }

    pub fn ok_paged(result: Vec<Value>, page: PageData) -> Self {
        SearchOutcome::Ok {
            result,
            page: Some(page),
            meta: None,
        }
    }

    pub fn not_found() -> Self {
        SearchOutcome::NotFound
    }

    pub fn error(errors: Vec<ErrorObject>) -> Self {
        SearchOutcome::Error(errors)
    }
}

#[derive(Debug)]
pub enum FindOutcome {
    Ok {
        result: Value,
        meta: Option<Map<String, Value>>,
    },
    NotFound,
    Error(Vec<ErrorObject>),
}

impl FindOutcome {
    pub fn ok(result: Value) -> Self {
        FindOutcome::Ok { result, meta: None }
    }

    pub fn not_found() -> Self {
        FindOutcome::NotFound
    }

    pub fn error(errors: Vec<ErrorObject>) -> Self {
        FindOutcome::Error(errors)
    }
}

/// Outcome of a create or update capability.
#[derive(Debug)]
pub enum MutateOutcome {
    Ok {
        result: Option<Value>,
        meta: Option<Map<String, Value>>,
    },
    NotFound,
    /// Accepted for asynchronous processing.
    Accepted { meta: Option<Map<String, Value>> },
    /// Client-generated id collision, or type not part of this collection.
    Conflict,
    Error(Vec<ErrorObject>),
}

impl MutateOutcome {
    pub fn ok(result: Value) -> Self {
        MutateOutcome::Ok {
            result: Some(result),
            meta: None,
        }
    }

    /// Success without a response document (e.g. update applied verbatim).
    pub fn ok_empty() -> Self {
        MutateOutcome::Ok {
            result: None,
            meta: None,
        }
    }

    pub fn not_found() -> Self {
        MutateOutcome::NotFound
    }

    pub fn accepted(meta: Option<Map<String, Value>>) -> Self {
        MutateOutcome::Accepted { meta }
    }

    pub fn conflict() -> Self {
        MutateOutcome::Conflict
    }

    pub fn error(errors: Vec<ErrorObject>) -> Self {
        MutateOutcome::Error(errors)
    }
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// Successful deletion; meta produces a 200 body, otherwise 204.
    Ok { meta: Option<Map<String, Value>> },
    NotFound,
    Accepted { meta: Option<Map<String, Value>> },
    Error(Vec<ErrorObject>),
}

impl DeleteOutcome {
    pub fn ok() -> Self {
        DeleteOutcome::Ok { meta: None }
    }

    pub fn ok_meta(meta: Map<String, Value>) -> Self {
        DeleteOutcome::Ok { meta: Some(meta) }
    }

    pub fn not_found() -> Self {
        DeleteOutcome::NotFound
    }

    pub fn accepted(meta: Option<Map<String, Value>>) -> Self {
        DeleteOutcome::Accepted { meta }
    }

    pub fn error(errors: Vec<ErrorObject>) -> Self {
        DeleteOutcome::Error(errors)
    }
}

/// Storage collaborator for one resource type. Every capability is optional;
/// the pipeline asks `supports` before invoking and treats a missing
/// capability as a terminal forbidden signal.
///
/// The core makes no atomicity guarantee over handler state: an
/// implementation that supports concurrent mutation owns its own locking.
#[async_trait]
pub trait Handler: Send + Sync {
    fn supports(&self, operation: Operation) -> bool;

    /// Liveness probe per operation; `false` signals temporary unavailability.
    fn ready(&self, _operation: Operation) -> bool {
        true
    }

    async fn authorize(
        &self,
        _operation: Operation,
        _request: &HandlerRequest,
    ) -> Result<bool, JsonapiError> {
        Ok(true)
    }

    fn page_style(&self) -> PageStyle {
        PageStyle::Offset
    }

    async fn search(&self, _request: &HandlerRequest) -> Result<SearchOutcome, JsonapiError> {
        Err(JsonapiError::Forbidden(
            "search is not implemented for this resource".into(),
        ))
    }

    async fn find(&self, _request: &HandlerRequest) -> Result<FindOutcome, JsonapiError> {
        Err(JsonapiError::Forbidden(
            "find is not implemented for this resource".into(),
        ))
    }

    async fn create(
        &self,
        _request: &HandlerRequest,
        _data: Value,
    ) -> Result<MutateOutcome, JsonapiError> {
        Err(JsonapiError::Forbidden(
            "create is not implemented for this resource".into(),
        ))
    }

    async fn update(
        &self,
        _request: &HandlerRequest,
        _operation: UpdateOperation,
        _data: Value,
    ) -> Result<MutateOutcome, JsonapiError> {
        Err(JsonapiError::Forbidden(
            "update is not implemented for this resource".into(),
        ))
    }

    async fn delete(&self, _request: &HandlerRequest) -> Result<DeleteOutcome, JsonapiError> {
        Err(JsonapiError::Forbidden(
            "delete is not implemented for this resource".into(),
        ))
    }
}
