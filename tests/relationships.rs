//! Relationship access gating: foreign relations are read-only and only
//! reachable as filtered queries; to-one relations reject add/remove
//! semantics. The expectations here pin the two rules independently.

mod fixtures;

use jsonapi_sdk::{execute, Route};
use rstest::rstest;
use serde_json::json;

#[rstest]
// mutating a foreign relationship is a 404 foreign-relation rejection,
// whatever the association or verb
#[case::foreign_replace("people", "42", "articles", Route::UpdateRelationship, 404, "EFOREIGN")]
#[case::foreign_add("people", "42", "articles", Route::AddRelationship, 404, "EFOREIGN")]
#[case::foreign_remove("people", "42", "articles", Route::RemoveRelationship, 404, "EFOREIGN")]
// reading a foreign relationship through the relationships sub-path is
// rejected the same way
#[case::foreign_read("people", "42", "articles", Route::FindRelationship, 404, "EFOREIGN")]
// add/remove on a primary to-one relation is forbidden
#[case::to_one_add("articles", "1", "author", Route::AddRelationship, 403, "EFORBIDDEN")]
#[case::to_one_remove("articles", "1", "author", Route::RemoveRelationship, 403, "EFORBIDDEN")]
// a primitive attribute is not addressable as a relationship
#[case::not_a_relation("articles", "1", "title", Route::FindRelationship, 404, "ENOTFOUND")]
#[tokio::test]
async fn relationship_access_is_gated(
    #[case] resource: &str,
    #[case] id: &str,
    #[case] relation: &str,
    #[case] route: Route,
    #[case] status: u16,
    #[case] code: &str,
) {
    let registry = fixtures::registry();
    let body = json!({"data": []});
    let raw = fixtures::with_relation(
        &format!("/{}/{}/relationships/{}", resource, id, relation),
        id,
        relation,
        Some(body),
    );
    let error = execute(&registry, route, resource, raw)
        .await
        .expect_err("access should be rejected");
    let reply = jsonapi_sdk::error_reply(error);
    assert_eq!(reply.status, status);
    let errors = reply.document.and_then(|d| d.errors).expect("error envelope");
    assert_eq!(errors[0].code.as_deref(), Some(code));
}

#[tokio::test]
async fn foreign_rejections_carry_the_relationship_meta() {
    let registry = fixtures::registry();
    let error = execute(
        &registry,
        Route::FindRelationship,
        "people",
        fixtures::with_relation("/people/42/relationships/articles", "42", "articles", None),
    )
    .await
    .expect_err("foreign relationship read should be rejected");
    let reply = jsonapi_sdk::error_reply(error);
    let errors = reply.document.and_then(|d| d.errors).expect("error envelope");
    let meta = errors[0].meta.as_ref().expect("foreign meta");
    assert_eq!(meta.get("relation"), Some(&json!("foreign")));
    assert_eq!(meta.get("belongsTo"), Some(&json!("articles")));
    assert_eq!(meta.get("as"), Some(&json!("author")));
    assert_eq!(meta.get("readOnly"), Some(&json!(true)));
}

#[tokio::test]
async fn replacing_a_to_one_relation_is_allowed() {
    let registry = fixtures::registry();
    let body = json!({"data": {"id": "22", "type": "people"}});
    let reply = execute(
        &registry,
        Route::UpdateRelationship,
        "articles",
        fixtures::with_relation("/articles/1/relationships/author", "1", "author", Some(body)),
    )
    .await
    .expect("to-one replace should succeed");
    assert_eq!(reply.status, 200);
}
