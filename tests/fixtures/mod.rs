//! Shared fixture set: articles, comments, people, and tags over the
//! in-memory handler.
#![allow(dead_code)] // each test binary uses a different slice of the fixtures

use jsonapi_sdk::{
    attribute, attribute_with, belongs_to_many, to_many, to_one, MemoryHandler, PathParams,
    RawRequest, Registry, ResourceDefinition,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn people_seed() -> Vec<Value> {
    vec![
        json!({"id": "42", "type": "people", "firstname": "John", "lastname": "Doe"}),
        json!({"id": "24", "type": "people", "firstname": "Jane", "lastname": "Doe"}),
        json!({"id": "22", "type": "people", "firstname": "Billy", "lastname": "Idol"}),
    ]
}

pub fn tags_seed() -> Vec<Value> {
    vec![
        json!({"id": "jsonapi", "type": "tags", "value": "#jsonapi"}),
        json!({"id": "apis", "type": "tags", "value": "#apis"}),
    ]
}

pub fn comments_seed() -> Vec<Value> {
    vec![
        json!({
            "id": "5",
            "type": "comments",
            "body": "First!",
            "author": {"id": "42", "type": "people"}
        }),
        json!({
            "id": "12",
            "type": "comments",
            "body": "I like XML better",
            "author": {"id": "24", "type": "people"}
        }),
        json!({
            "id": "17",
            "type": "comments",
            "body": "Can't argue with the shortest article ever.",
            "author": {"id": "42", "type": "people"}
        }),
    ]
}

pub fn articles_seed() -> Vec<Value> {
    vec![
        json!({
            "id": "1",
            "type": "articles",
            "title": "JSON:API paints my bikeshed!",
            "body": "The shortest article. Ever.",
            "created": "2015-05-22T14:56:29.000Z",
            "updated": "2015-05-22T14:56:28.000Z",
            "author": {"id": "42", "type": "people"},
            "tags": [
                {"id": "jsonapi", "type": "tags"},
                {"id": "apis", "type": "tags"}
            ],
            "comments": [
                {"id": "5", "type": "comments"},
                {"id": "12", "type": "comments"}
            ]
        }),
        json!({
            "id": "2",
            "type": "articles",
            "title": "Bikeshedding, part two",
            "body": "A sequel nobody asked for.",
            "created": "2015-06-01T08:00:00.000Z",
            "updated": "2015-06-01T08:00:00.000Z",
            "author": {"id": "24", "type": "people"},
            "tags": [],
            "comments": [
                {"id": "17", "type": "comments"}
            ]
        }),
    ]
}

pub fn registry() -> Arc<Registry> {
    let people = ResourceDefinition::builder(
        "people",
        Arc::new(MemoryHandler::new("people", people_seed())),
    )
    .description("The people's resource")
    .field("firstname", attribute())
    .field("lastname", attribute())
    .field("articles", belongs_to_many("articles", "author"))
    .build();

    let tags =
        ResourceDefinition::builder("tags", Arc::new(MemoryHandler::new("tags", tags_seed())))
            .field(
                "value",
                attribute_with(Arc::new(|value| {
                    value
                        .as_str()
                        .map(|_| ())
                        .ok_or_else(|| "value must be a string".to_string())
                })),
            )
            .allows_id_on_create(true)
            .build();

    let comments = ResourceDefinition::builder(
        "comments",
        Arc::new(MemoryHandler::new("comments", comments_seed())),
    )
    .field("body", attribute())
    .field("author", to_one("people"))
    .build();

    let articles = ResourceDefinition::builder(
        "articles",
        Arc::new(MemoryHandler::new("articles", articles_seed())),
    )
    .field("title", attribute())
    .field("body", attribute())
    .field("created", attribute())
    .field("updated", attribute())
    .field("author", to_one("people"))
    .field("tags", to_many("tags"))
    .field("comments", to_many("comments"))
    .build();

    Registry::builder()
        .definition(people)
        .definition(tags)
        .definition(comments)
        .definition(articles)
        .build()
}

pub fn get(url: &str, id: Option<&str>) -> RawRequest {
    RawRequest::from_url(
        url,
        PathParams {
            id: id.map(str::to_string),
            ..PathParams::default()
        },
        None,
    )
    .expect("request should parse")
}

pub fn with_relation(url: &str, id: &str, relation: &str, body: Option<Value>) -> RawRequest {
    RawRequest::from_url(
        url,
        PathParams {
            id: Some(id.to_string()),
            relation: Some(relation.to_string()),
            ..PathParams::default()
        },
        body,
    )
    .expect("request should parse")
}

pub fn with_body(url: &str, id: Option<&str>, body: Value) -> RawRequest {
    RawRequest::from_url(
        url,
        PathParams {
            id: id.map(str::to_string),
            ..PathParams::default()
        },
        Some(body),
    )
    .expect("request should parse")
}
