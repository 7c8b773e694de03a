use std::sync::Arc;
use std::time::{Duration, Instant};

use drawconnect::{
    Error, NewUser, UserId, UserStore,
    store::{InMemory, StoreError},
};

use super::helpers::*;

#[tokio::test]
async fn test_insert_then_find_by_id_scenario() {
    let users = in_memory_users();

    let id = users
        .insert(NewUser::new("a@example.com").with_signatures(sample_signatures()))
        .await
        .unwrap();

    let external = id.to_string();
    assert_eq!(external.len(), 24);
    assert!(external.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(UserId::decode(&external).unwrap(), id);

    let found = users.find_by_id(&external).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].email, "a@example.com");
    assert_eq!(found[0].signatures, Some(sample_signatures()));
    assert_eq!(found[0].token, None);
}

#[tokio::test]
async fn test_malformed_ids_never_reach_the_store() {
    let store = Arc::new(CountingStore::new());
    let users = UserStore::new(store.clone());

    for bad in [
        "",
        "not-a-valid-id",
        "5c3476f7869f6e013359b2f",
        "5c3476f7869f6e013359b2fa0",
        "5c3476f7869f6e013359b2fg",
        "\"5c3476f7869f6e013359b2fa\"",
    ] {
        let err = users.find_by_id(bad).await.unwrap_err();
        assert!(err.is_invalid_identifier(), "{bad:?} gave {err:?}");
    }
    assert_eq!(store.calls(), 0);

    users
        .find_by_id("5c3476f7869f6e013359b2fa")
        .await
        .unwrap();
    assert_eq!(store.finds(), 1);
}

#[tokio::test]
async fn test_list_all_empty_and_populated() {
    let users = in_memory_users();
    assert!(users.list_all().await.unwrap().is_empty());

    let first = users.insert(NewUser::new("a@example.com")).await.unwrap();
    let second = users
        .insert(NewUser::new("b@example.com").with_token("opaque"))
        .await
        .unwrap();

    let all = users.list_all().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, first);
    assert_eq!(all[1].id, second);
    assert_eq!(all[1].token.as_deref(), Some("opaque"));
}

#[tokio::test]
async fn test_find_by_email_rejects_duplicates() {
    let users = in_memory_users();
    users.insert(NewUser::new("a@example.com")).await.unwrap();
    users.insert(NewUser::new("a@example.com")).await.unwrap();

    match users.find_by_email("a@example.com").await {
        Err(Error::Store(StoreError::MultipleMatches { value, count, .. })) => {
            assert_eq!(value, "a@example.com");
            assert_eq!(count, 2);
        }
        other => panic!("expected MultipleMatches, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unique_email_store_prevents_duplicates() {
    let users = UserStore::new(Arc::new(InMemory::new().with_unique_email(true)));
    users.insert(NewUser::new("a@example.com")).await.unwrap();

    let err = users.insert(NewUser::new("a@example.com")).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::InsertFailed { .. })));
    assert_eq!(users.find_by_email("a@example.com").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_check_connectivity_stalled_store_is_bounded() {
    let users = UserStore::with_deadlines(Arc::new(StalledStore), short_deadlines());

    let started = Instant::now();
    let err = users.check_connectivity().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_unavailable(), "{err:?}");
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test]
async fn test_queries_and_inserts_time_out() {
    let users = UserStore::with_deadlines(Arc::new(StalledStore), short_deadlines());

    let err = users.list_all().await.unwrap_err();
    assert!(err.is_timeout());
    match err {
        Error::Store(e) => assert_eq!(e.operation(), Some("list_all")),
        other => panic!("Unexpected error: {other:?}"),
    }

    assert!(
        users
            .find_by_id("5c3476f7869f6e013359b2fa")
            .await
            .unwrap_err()
            .is_timeout()
    );
    assert!(
        users
            .find_by_email("a@example.com")
            .await
            .unwrap_err()
            .is_timeout()
    );
    assert!(
        users
            .insert(NewUser::new("a@example.com"))
            .await
            .unwrap_err()
            .is_timeout()
    );

    // The identifier is still checked before the store is involved.
    assert!(
        users
            .find_by_id("nope")
            .await
            .unwrap_err()
            .is_invalid_identifier()
    );
}

#[tokio::test]
async fn test_insert_without_identifier() {
    let users = UserStore::new(Arc::new(AnonymousInsertStore));
    let err = users.insert(NewUser::new("a@example.com")).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::NoIdentifierAssigned)));
    assert!(err.is_integrity_error());
}

#[tokio::test]
async fn test_concurrent_inserts_get_distinct_ids() {
    let users = in_memory_users();

    let mut tasks = Vec::new();
    for i in 0..32 {
        let users = users.clone();
        tasks.push(tokio::spawn(async move {
            users
                .insert(NewUser::new(format!("user{i}@example.com")))
                .await
                .unwrap()
        }));
    }

    let mut ids = std::collections::HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap());
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(users.list_all().await.unwrap().len(), 32);
}
