//! Behaviour every storage backend must share.
//!
//! Each check takes a namespace prefix so it can run against a shared
//! database without colliding with other runs.

use linkstore::domain::entities::{ShortRecord, UserRecord, user_id};
use linkstore::domain::repositories::{Backend, ShortRepository, UserRepository};
use linkstore::error::StoreError;
use linkstore::utils::validation::{MAX_SHORT_LEN, validate_short};
use std::sync::Arc;

pub async fn put_then_get(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}miserable");
    backend
        .put(&ShortRecord::new(&short, "http://pigeon", 7))
        .await
        .unwrap();

    let record = backend.get(&short).await.unwrap();
    assert_eq!(record, ShortRecord::new(&short, "http://pigeon", 7));

    // Reads have no side effects.
    assert_eq!(backend.get(&short).await.unwrap(), record);
}

pub async fn get_missing(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}missing");
    assert_eq!(
        backend.get(&short).await,
        Err(StoreError::NotFound(short.clone()))
    );
}

pub async fn overwrite_by_owner(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}a");
    backend
        .put(&ShortRecord::new(&short, "http://one", 1))
        .await
        .unwrap();
    backend
        .put(&ShortRecord::new(&short, "http://two", 1))
        .await
        .unwrap();

    assert_eq!(backend.get(&short).await.unwrap().long, "http://two");
}

pub async fn overwrite_by_other_owner(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}a");
    backend
        .put(&ShortRecord::new(&short, "http://mine", 1))
        .await
        .unwrap();

    let result = backend
        .put(&ShortRecord::new(&short, "http://theirs", 2))
        .await;

    assert_eq!(result, Err(StoreError::PermissionDenied));
    assert_eq!(
        backend.get(&short).await.unwrap(),
        ShortRecord::new(&short, "http://mine", 1)
    );
}

pub async fn delete_by_owner(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}a");
    backend
        .put(&ShortRecord::new(&short, "http://x", 1))
        .await
        .unwrap();

    backend.delete(&short, 1).await.unwrap();

    assert!(backend.get(&short).await.unwrap_err().is_not_found());
}

pub async fn delete_by_other_owner(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}a");
    backend
        .put(&ShortRecord::new(&short, "http://x", 1))
        .await
        .unwrap();

    assert_eq!(
        backend.delete(&short, 2).await,
        Err(StoreError::PermissionDenied)
    );
    assert!(backend.get(&short).await.is_ok());
}

/// `absent_ok` is false for backends that cannot tell an absent key from
/// one held by someone else.
pub async fn delete_missing(backend: Arc<dyn Backend>, ns: &str, absent_ok: bool) {
    let short = format!("{ns}never");
    let result = backend.delete(&short, 1).await;

    if absent_ok {
        assert_eq!(result, Ok(()));
    } else {
        assert_eq!(result, Err(StoreError::PermissionDenied));
    }
}

pub async fn list_inclusive_range(backend: Arc<dyn Backend>, ns: &str) {
    for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        backend
            .put(&ShortRecord::new(
                format!("{ns}{key}"),
                format!("http://{key}"),
                i as u64,
            ))
            .await
            .unwrap();
    }

    let mut keys: Vec<String> = backend
        .list(&format!("{ns}b"), &format!("{ns}d"))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.short)
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![format!("{ns}b"), format!("{ns}c"), format!("{ns}d")]
    );

    let reversed = backend
        .list(&format!("{ns}d"), &format!("{ns}b"))
        .await
        .unwrap();
    assert!(reversed.is_empty());
}

pub async fn lookup_or_create_is_idempotent(backend: Arc<dyn Backend>, ns: &str) {
    let email = format!("{ns}pigeon@example.com");

    let first = backend.lookup_or_create(&email, "Pigeon").await.unwrap();
    let second = backend.lookup_or_create(&email, "Renamed").await.unwrap();

    assert_eq!(first, UserRecord::new(&email, "Pigeon"));
    assert_eq!(second, first);
    assert_eq!(backend.get_user(user_id(&email)).await.unwrap(), first);
}

pub async fn user_delete_and_missing(backend: Arc<dyn Backend>, ns: &str) {
    let email = format!("{ns}dove@example.com");
    let user = backend.lookup_or_create(&email, "Dove").await.unwrap();

    backend.delete_user(user.id).await.unwrap();

    assert!(backend.get_user(user.id).await.unwrap_err().is_not_found());
}

pub async fn concurrent_lookup_or_create(backend: Arc<dyn Backend>, ns: &str) {
    let email = format!("{ns}crowd@example.com");

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let backend = backend.clone();
            let email = email.clone();
            tokio::spawn(async move { backend.lookup_or_create(&email, &format!("n{i}")).await })
        })
        .collect();

    let mut users = Vec::new();
    for task in tasks {
        users.push(task.await.unwrap().unwrap());
    }

    let stored = backend.get_user(user_id(&email)).await.unwrap();
    assert!(users.iter().all(|u| u.id == stored.id));
    assert!(users.iter().all(|u| *u == stored));
}

/// Many owners race to claim one alias: exactly one wins and the stored
/// record is the winner's.
pub async fn concurrent_put_single_winner(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}contended");

    let tasks: Vec<_> = (1..=16u64)
        .map(|owner| {
            let backend = backend.clone();
            let short = short.clone();
            tokio::spawn(async move {
                let record = ShortRecord::new(short, format!("http://owner{owner}"), owner);
                (owner, backend.put(&record).await)
            })
        })
        .collect();

    let mut winners = Vec::new();
    for task in tasks {
        let (owner, result) = task.await.unwrap();
        match result {
            Ok(()) => winners.push(owner),
            Err(StoreError::PermissionDenied | StoreError::Ambiguous(_)) => {}
            Err(e) => panic!("unexpected error for owner {owner}: {e}"),
        }
    }

    assert_eq!(winners.len(), 1, "winners: {winners:?}");
    let stored = backend.get(&short).await.unwrap();
    assert_eq!(stored.owner, winners[0]);
    assert_eq!(stored.long, format!("http://owner{}", winners[0]));
}

/// The longest alias validation accepts is storable everywhere.
pub async fn longest_alias(backend: Arc<dyn Backend>, ns: &str) {
    let short = format!("{ns}{}", "k".repeat(MAX_SHORT_LEN - ns.len()));
    assert!(validate_short(&short).is_ok());

    backend
        .put(&ShortRecord::new(&short, "http://long", 4))
        .await
        .unwrap();

    assert_eq!(backend.get(&short).await.unwrap().owner, 4);
    backend.delete(&short, 4).await.unwrap();
}
