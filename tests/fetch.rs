//! Fetching resources: search, find, includes, sparse fieldsets, pagination.

mod fixtures;

use jsonapi_sdk::{execute, JsonapiError, RelationshipData, Route};
use serde_json::json;

#[tokio::test]
async fn search_returns_the_collection() {
    let registry = fixtures::registry();
    let reply = execute(&registry, Route::Search, "people", fixtures::get("/people", None))
        .await
        .expect("search should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    assert_eq!(document.many().map(<[_]>::len), Some(3));
    assert_eq!(
        document.meta.as_ref().and_then(|m| m.get("count")),
        Some(&json!(3))
    );
    assert_eq!(
        document.links.as_ref().and_then(|l| l.get("self")).map(String::as_str),
        Some("/people")
    );
}

#[tokio::test]
async fn search_pages_with_offset_links() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Search,
        "people",
        fixtures::get("/people?page[offset]=1&page[limit]=1", None),
    )
    .await
    .expect("search should succeed");
    let document = reply.document.expect("has document");
    assert_eq!(document.many().map(<[_]>::len), Some(1));
    let links = document.links.expect("has links");
    assert_eq!(
        links.get("next").map(String::as_str),
        Some("/people?page[offset]=2&page[limit]=1")
    );
    assert_eq!(
        links.get("prev").map(String::as_str),
        Some("/people?page[offset]=0&page[limit]=1")
    );
}

#[tokio::test]
async fn find_returns_one_resource_with_relationships() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1", Some("1")),
    )
    .await
    .expect("find should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let resource = document.single().expect("single resource");
    assert_eq!(resource.id, "1");
    assert_eq!(
        resource.attributes.as_ref().and_then(|a| a.get("title")),
        Some(&json!("JSON:API paints my bikeshed!"))
    );

    let relationships = resource.relationships.as_ref().expect("has relationships");
    let author = relationships.get("author").expect("author relationship");
    assert_eq!(
        author.data,
        Some(RelationshipData::One(jsonapi_sdk::ResourceRef::new(
            "42", "people"
        )))
    );
    let links = author.links.as_ref().expect("author links");
    assert_eq!(
        links.get("self").map(String::as_str),
        Some("/articles/1/relationships/author")
    );
    assert_eq!(
        links.get("related").map(String::as_str),
        Some("/articles/1/author")
    );
}

#[tokio::test]
async fn find_unknown_id_is_not_found() {
    let registry = fixtures::registry();
    let error = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/99", Some("99")),
    )
    .await
    .expect_err("find should fail");
    assert!(matches!(error, JsonapiError::NotFound(_)));
    let reply = jsonapi_sdk::error_reply(error);
    assert_eq!(reply.status, 404);
    let errors = reply.document.and_then(|d| d.errors).expect("error envelope");
    assert_eq!(errors[0].code.as_deref(), Some("ENOTFOUND"));
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let registry = fixtures::registry();
    let error = execute(
        &registry,
        Route::Search,
        "recipes",
        fixtures::get("/recipes", None),
    )
    .await
    .expect_err("unknown collection");
    assert_eq!(jsonapi_sdk::error_reply(error).status, 404);
}

#[tokio::test]
async fn compound_documents_deduplicate_included_resources() {
    // two articles, three comments, two distinct comment authors
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Search,
        "articles",
        fixtures::get("/articles?include=comments.author", None),
    )
    .await
    .expect("search should succeed");
    let document = reply.document.expect("has document");
    let included = document.included.expect("has included");
    assert_eq!(included.len(), 5);
    let comments = included.iter().filter(|r| r.kind == "comments").count();
    let authors = included.iter().filter(|r| r.kind == "people").count();
    assert_eq!(comments, 3);
    assert_eq!(authors, 2);
}

#[tokio::test]
async fn include_resolves_forward_to_one_relations() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1?include=author", Some("1")),
    )
    .await
    .expect("find should succeed");
    let document = reply.document.expect("has document");
    let included = document.included.expect("has included");
    assert_eq!(included.len(), 1);
    assert_eq!(included[0].kind, "people");
    assert_eq!(included[0].id, "42");
    assert_eq!(
        included[0].attributes.as_ref().and_then(|a| a.get("firstname")),
        Some(&json!("John"))
    );
}

#[tokio::test]
async fn sparse_fieldsets_limit_attributes_and_relationships() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1?fields[articles]=title", Some("1")),
    )
    .await
    .expect("find should succeed");
    let document = reply.document.expect("has document");
    let resource = document.single().expect("single resource");
    let attributes = resource.attributes.as_ref().expect("attributes");
    assert!(attributes.contains_key("title"));
    assert!(!attributes.contains_key("body"));
    assert!(resource.relationships.is_none());
}

#[tokio::test]
async fn requesting_every_declared_field_matches_no_fieldset_at_all() {
    let registry = fixtures::registry();
    let full = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get(
            "/articles/1?fields[articles]=title,body,created,updated,author,tags,comments",
            Some("1"),
        ),
    )
    .await
    .expect("find should succeed");
    let unfiltered = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1", Some("1")),
    )
    .await
    .expect("find should succeed");
    // the self links differ by query string; compare the resource objects
    assert_eq!(
        full.document.as_ref().and_then(|d| d.single()),
        unfiltered.document.as_ref().and_then(|d| d.single())
    );
}

#[tokio::test]
async fn unknown_sparse_field_is_a_validation_error() {
    let registry = fixtures::registry();
    let error = execute(
        &registry,
        Route::Find,
        "articles",
        fixtures::get("/articles/1?fields[articles]=flavor", Some("1")),
    )
    .await
    .expect_err("should reject unknown field");
    let reply = jsonapi_sdk::error_reply(error);
    assert_eq!(reply.status, 422);
    let errors = reply.document.and_then(|d| d.errors).expect("error envelope");
    assert_eq!(errors[0].code.as_deref(), Some("EINVALID"));
}

#[tokio::test]
async fn foreign_relationships_render_filter_links_and_meta() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::Find,
        "people",
        fixtures::get("/people/42", Some("42")),
    )
    .await
    .expect("find should succeed");
    let document = reply.document.expect("has document");
    let resource = document.single().expect("single resource");
    let articles = resource
        .relationships
        .as_ref()
        .and_then(|r| r.get("articles"))
        .expect("articles relationship");

    let links = articles.links.as_ref().expect("links");
    assert_eq!(
        links.get("related").map(String::as_str),
        Some("/articles?filter[author]=42")
    );
    assert!(!links.contains_key("self"));

    let meta = articles.meta.as_ref().expect("meta");
    assert_eq!(meta.get("relation"), Some(&json!("foreign")));
    assert_eq!(meta.get("readOnly"), Some(&json!(true)));
    assert_eq!(meta.get("belongsTo"), Some(&json!("articles")));
    assert_eq!(meta.get("as"), Some(&json!("author")));
    // the relationship key is absent from the record, so linkage is omitted
    assert!(articles.data.is_none());
}

#[tokio::test]
async fn find_related_resolves_through_the_target_search() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::FindRelated,
        "people",
        fixtures::with_relation("/people/42/articles", "42", "articles", None),
    )
    .await
    .expect("find related should succeed");
    assert_eq!(reply.status, 200);
    let document = reply.document.expect("has document");
    let resources = document.many().expect("related collection");
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].id, "1");
    assert_eq!(resources[0].kind, "articles");
}

#[tokio::test]
async fn find_relationship_returns_linkage() {
    let registry = fixtures::registry();
    let reply = execute(
        &registry,
        Route::FindRelationship,
        "articles",
        fixtures::with_relation("/articles/1/relationships/tags", "1", "tags", None),
    )
    .await
    .expect("find relationship should succeed");
    let document = reply.document.expect("has document");
    let refs = document.many().expect("linkage collection");
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].id, "jsonapi");
    assert_eq!(refs[1].id, "apis");
}
