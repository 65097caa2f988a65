//! End-to-end tests for user lifecycle events feeding the compatibility
//! queries.

use pretty_assertions::assert_eq;
use tunematch::ingest::apply_json;
use tunematch::{
    Compatibility, Error, GraphStore, IngestOutcome, Label, MemoryGraph, NodeId, PropertyMap,
    RelType, UserEvent,
};

fn id(key: &str) -> NodeId {
    NodeId::new(key)
}

fn create_event(event_type: &str, user_id: u32, first: &str, gender: &str, age: u32) -> String {
    format!(
        r#"{{
            "eventType": "{event_type}",
            "userId": {user_id},
            "firstName": "{first}",
            "lastName": "Doe",
            "profil": {{ "information": {{ "gender": "{gender}", "age": {age}, "orientation": "bi" }} }}
        }}"#
    )
}

fn delete_event(user_id: u32) -> String {
    format!(r#"{{"eventType": "USER_DELETED", "userId": {user_id}}}"#)
}

async fn apply(compat: &Compatibility<MemoryGraph>, raw: &str) -> tunematch::Result<IngestOutcome> {
    compat.apply_event(UserEvent::from_json(raw)?).await
}

/// Users 1, 2 and 3 created through events, all liking the same genre.
async fn seeded() -> Compatibility<MemoryGraph> {
    let compat = Compatibility::open_memory();
    for (user, name) in [(1, "Ann"), (2, "Ben"), (3, "Cal")] {
        apply(&compat, &create_event("USER_CREATE", user, name, "FEMALE", 30)).await.unwrap();
    }

    let db = compat.store();
    db.merge_node(Label::Genre, &id("soul"), PropertyMap::new()).await.unwrap();
    for user in ["1", "2", "3"] {
        db.merge_relationship(&id(user), RelType::LikesGenre, &id("soul")).await.unwrap();
    }
    compat
}

#[tokio::test]
async fn test_create_then_recreate() {
    let compat = Compatibility::open_memory();

    let first = apply(&compat, &create_event("USER_CREATE", 7, "Eve", "female", 41)).await.unwrap();
    assert_eq!(first, IngestOutcome::Created(id("7")));

    let again = apply(&compat, &create_event("USER_CREATE", 7, "Eve", "female", 42)).await.unwrap();
    assert_eq!(again, IngestOutcome::Updated(id("7")));
    assert_eq!(compat.store().node_count(Label::User).await.unwrap(), 1);

    let node = compat.store().get_node(&id("7"), Label::User).await.unwrap().unwrap();
    assert_eq!(node.get("age").and_then(|v| v.as_int()), Some(42));
}

#[tokio::test]
async fn test_created_profile_reaches_results() {
    let compat = seeded().await;

    let pair = compat.compute_pair_compatibility(&id("1"), &id("2")).await.unwrap();
    assert_eq!(pair.user1.name.as_deref(), Some("Ann Doe"));
    assert_eq!(pair.user1.gender.as_deref(), Some("Female"));
    assert_eq!(pair.user1.age, Some(30));
    assert_eq!(pair.user1.orientation.as_deref(), Some("Bi"));
    assert_eq!(pair.compatibility_score, 25.0);
}

#[tokio::test]
async fn test_update_keeps_relationships() {
    let compat = seeded().await;

    let outcome = apply(&compat, &create_event("USER_UPDATED", 2, "Bea", "male", 31)).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Updated(id("2")));

    let pair = compat.compute_pair_compatibility(&id("1"), &id("2")).await.unwrap();
    assert_eq!(pair.user2.name.as_deref(), Some("Bea Doe"));
    assert_eq!(pair.user2.gender.as_deref(), Some("Male"));
    assert_eq!(pair.shared_genres, vec!["soul".to_string()]);
}

#[tokio::test]
async fn test_deleted_user_leaves_rankings() {
    let compat = seeded().await;
    let top = compat.compute_top_k(&id("1"), None).await.unwrap();
    assert_eq!(top.len(), 2);

    let outcome = apply_json(compat.store(), &delete_event(2)).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Deleted(id("2")));

    let top = compat.compute_top_k(&id("1"), None).await.unwrap();
    let remaining: Vec<&str> = top.iter().map(|m| m.user.id.as_str()).collect();
    assert_eq!(remaining, vec!["3"]);

    let result = compat.compute_pair_compatibility(&id("1"), &id("2")).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
    // the genre itself survives the user
    assert!(compat.store().exists(&id("soul"), Label::Genre).await.unwrap());
}

#[tokio::test]
async fn test_update_or_delete_of_unknown_user() {
    let compat = seeded().await;

    let update = apply(&compat, &create_event("USER_UPDATED", 99, "Nix", "male", 20)).await;
    assert!(matches!(update, Err(Error::NotFound(_))));
    assert!(!compat.store().exists(&id("99"), Label::User).await.unwrap());

    let delete = apply(&compat, &delete_event(99)).await;
    assert!(matches!(delete, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_unknown_event_changes_nothing() {
    let compat = seeded().await;

    let outcome = apply(&compat, r#"{"eventType": "USER_SUSPENDED", "userId": 1}"#).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Ignored("USER_SUSPENDED".into()));
    assert_eq!(compat.store().node_count(Label::User).await.unwrap(), 3);
}

#[tokio::test]
async fn test_malformed_event_is_rejected() {
    let compat = seeded().await;

    let result = apply_json(compat.store(), r#"{"eventType": "USER_CREATE", "userId": 4}"#).await;
    assert!(matches!(result, Err(Error::MalformedEvent(_))));
    assert_eq!(compat.store().node_count(Label::User).await.unwrap(), 3);
}
