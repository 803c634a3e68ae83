//! JSON:API document codec and request pipeline for resource-oriented
//! backends. Transport (routing, status emission) stays outside: the crate
//! exposes the codec, the include resolver, the pipeline step machinery, and
//! an `execute` entry point a routing layer drives.

pub mod codec;
pub mod document;
pub mod error;
pub mod handler;
pub mod memory;
pub mod pagination;
pub mod pipeline;
pub mod query;
pub mod relations;
pub mod routes;
pub mod schema;

pub use codec::{deserialize, serialize, SerializationOptions};
pub use document::{
    Document, Links, PrimaryData, RelationshipData, RelationshipObject, ResourceObject, ResourceRef,
};
pub use error::{ErrorObject, ErrorSource, JsonapiError};
pub use handler::{
    DeleteOutcome, FindOutcome, Handler, HandlerRequest, MutateOutcome, Operation, PageData,
    PageStyle, ParentLinkage, PathParams, SearchOutcome, UpdateOperation,
};
pub use memory::MemoryHandler;
pub use pipeline::{Context, RawRequest, Reply};
pub use query::{IncludeGraph, Query};
pub use relations::{foreign_key_search, resolve_includes};
pub use routes::{error_reply, execute, Route};
pub use schema::{
    attribute, attribute_with, belongs_to_many, belongs_to_one, to_many, to_one, Association,
    FieldDefinition, Registry, ResourceDefinition,
};
