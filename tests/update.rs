//! Updating resources and relationship membership.

mod fixtures;

use jsonapi_sdk::{execute, RelationshipData, ResourceRef, Route};
use serde_json::json;

#[tokio::test]
async fn update_merges_attributes_into_the_resource() {
    let registry = fixtures::registry();
    let body = json!({
        "data": {
            "id": "1",
            "type": "articles",
            "attributes": {"title": "JSON:API paints every bikeshed"}
        }
    });
    let reply = execute(
        &registry,
        Route::Update,
        "articles",
        fixtures::with_body("/articles/1", Some("1"), body),
    )
    .await
    .expect("update should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let resource = document.single().expect("single resource");
    assert_eq!(
        resource.attributes.as_ref().and_then(|a| a.get("title")),
        Some(&json!("JSON:API paints every bikeshed"))
    );
    // untouched attributes survive the merge
    assert_eq!(
        resource.attributes.as_ref().and_then(|a| a.get("body")),
        Some(&json!("The shortest article. Ever."))
    );
}

#[tokio::test]
async fn update_of_a_missing_resource_is_not_found() {
    let registry = fixtures::registry();
    let body = json!({
        "data": {"id": "99", "type": "articles", "attributes": {"title": "ghost"}}
    });
    let error = execute(
        &registry,
        Route::Update,
        "articles",
        fixtures::with_body("/articles/99", Some("99"), body),
    )
    .await
    .expect_err("update should fail");
    assert_eq!(jsonapi_sdk::error_reply(error).status, 404);
}

#[tokio::test]
async fn replacing_a_to_one_relationship_rewires_the_linkage() {
    let registry = fixtures::registry();
    let body = json!({"data": {"id": "24", "type": "people"}});
    let reply = execute(
        &registry,
        Route::UpdateRelationship,
        "articles",
        fixtures::with_relation("/articles/1/relationships/author", "1", "author", Some(body)),
    )
    .await
    .expect("relationship update should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let resource = document.single().expect("linkage");
    assert_eq!(resource.id, "24");
    assert_eq!(resource.kind, "people");

    // the rewire is visible on a subsequent find
    let found = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1", Some("1")),
    )
    .await
    .expect("find should succeed");
    let author = found
        .document
        .as_ref()
        .and_then(|d| d.single())
        .and_then(|r| r.relationships.as_ref())
        .and_then(|r| r.get("author"))
        .cloned()
        .expect("author relationship");
    assert_eq!(
        author.data,
        Some(RelationshipData::One(ResourceRef::new("24", "people")))
    );
}

#[tokio::test]
async fn adding_to_a_to_many_relationship_appends_members() {
    let registry = fixtures::registry();
    let body = json!({"data": [{"id": "17", "type": "comments"}]});
    let reply = execute(
        &registry,
        Route::AddRelationship,
        "articles",
        fixtures::with_relation(
            "/articles/1/relationships/comments",
            "1",
            "comments",
            Some(body),
        ),
    )
    .await
    .expect("relationship add should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let refs = document.many().expect("linkage collection");
    assert_eq!(refs.len(), 3);
    assert!(refs.iter().any(|r| r.id == "17"));
}

#[tokio::test]
async fn removing_from_a_to_many_relationship_drops_members() {
    let registry = fixtures::registry();
    let body = json!({"data": [{"id": "jsonapi", "type": "tags"}]});
    let reply = execute(
        &registry,
        Route::RemoveRelationship,
        "articles",
        fixtures::with_relation("/articles/1/relationships/tags", "1", "tags", Some(body)),
    )
    .await
    .expect("relationship remove should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let refs = document.many().expect("linkage collection");
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].id, "apis");
}

#[tokio::test]
async fn replacing_a_to_many_relationship_with_an_empty_list_empties_it() {
    let registry = fixtures::registry();
    let body = json!({"data": []});
    let reply = execute(
        &registry,
        Route::UpdateRelationship,
        "articles",
        fixtures::with_relation("/articles/2/relationships/comments", "2", "comments", Some(body)),
    )
    .await
    .expect("relationship replace should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    // an empty to-many relationship is an empty collection, never null
    assert_eq!(document.many().map(<[_]>::len), Some(0));
}
