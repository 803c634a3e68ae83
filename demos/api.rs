//! Example API core: builds a registry over in-memory handlers and drives a
//! few requests through the pipeline, printing the wire documents.

use jsonapi_sdk::{
    attribute, belongs_to_many, error_reply, execute, to_many, to_one, MemoryHandler, PathParams,
    RawRequest, Registry, ResourceDefinition, Route,
};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jsonapi_sdk=debug".parse()?))
        .init();

    let people = ResourceDefinition::builder(
        "people",
        Arc::new(MemoryHandler::new(
            "people",
            vec![
                json!({"id": "42", "type": "people", "firstname": "John", "lastname": "Doe"}),
                json!({"id": "24", "type": "people", "firstname": "Jane", "lastname": "Doe"}),
            ],
        )),
    )
    .field("firstname", attribute())
    .field("lastname", attribute())
    .field("articles", belongs_to_many("articles", "author"))
    .build();

    let articles = ResourceDefinition::builder(
        "articles",
        Arc::new(MemoryHandler::new(
            "articles",
            vec![json!({
                "id": "1",
                "type": "articles",
                "title": "JSON:API paints my bikeshed!",
                "body": "The shortest article. Ever.",
                "author": {"id": "42", "type": "people"},
                "tags": [{"id": "jsonapi", "type": "tags"}]
            })],
        )),
    )
    .field("title", attribute())
    .field("body", attribute())
    .field("author", to_one("people"))
    .field("tags", to_many("tags"))
    .build();

    let tags = ResourceDefinition::builder(
        "tags",
        Arc::new(MemoryHandler::new(
            "tags",
            vec![json!({"id": "jsonapi", "type": "tags", "value": "#jsonapi"})],
        )),
    )
    .field("value", attribute())
    .allows_id_on_create(true)
    .build();

    let registry = Registry::builder()
        .base_url("http://localhost:3000")
        .definition(people)
        .definition(articles)
        .definition(tags)
        .build();

    let requests = [
        (Route::Search, "articles", "/articles?include=author,tags", None),
        (Route::Find, "people", "/people/42", Some("42")),
        (Route::FindRelated, "people", "/people/42/articles", Some("42")),
    ];
    for (route, resource, url, id) in requests {
        let params = PathParams {
            id: id.map(str::to_string),
            relation: url.rsplit('/').next().filter(|_| route == Route::FindRelated).map(str::to_string),
            ..PathParams::default()
        };
        let raw = RawRequest::from_url(url, params, None)?;
        let reply = match execute(&registry, route, resource, raw).await {
            Ok(reply) => reply,
            Err(error) => error_reply(error),
        };
        println!("== {} -> {}", url, reply.status);
        if let Some(document) = reply.document {
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
    }
    Ok(())
}
