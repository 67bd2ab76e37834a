// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-table ordering of store operations under concurrent submission.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tinystore_storage::QueryOptions;
use tinystore_test_utils::{Contact, TestHarness};
use tokio::sync::oneshot;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn later_write_to_same_id_wins() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    for round in 0..20u32 {
        let first = Contact::new("c1", format!("first {round}"), round);
        let second = Contact::new("c1", format!("second {round}"), round);
        let (a, b) = tokio::join!(store.upsert(&first), store.upsert(&second));
        a.unwrap();
        b.unwrap();
        assert_eq!(store.get("c1").await.unwrap(), Some(second));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn call_order_decides_even_when_awaited_in_reverse() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    let first = Contact::new("c1", "first", 1);
    let second = Contact::new("c1", "second", 2);
    let pending_first = store.upsert(&first);
    let pending_second = store.upsert(&second);
    pending_second.await.unwrap();
    pending_first.await.unwrap();

    let stored = store.get("c1").await.unwrap().unwrap();
    assert_eq!(stored.name, "second");

    let pending_delete = store.delete(&second);
    let pending_get = store.get("c1");
    assert_eq!(pending_get.await.unwrap(), None);
    assert_eq!(pending_delete.await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_table_operations_complete_in_submission_order() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    let completed = Arc::new(Mutex::new(Vec::new()));

    let ops = (0..25u32).map(|i| {
        let store = store.clone();
        let completed = Arc::clone(&completed);
        async move {
            let result = if i % 3 == 0 {
                store.query(QueryOptions::new()).await.map(|_| ())
            } else {
                store.upsert(&Contact::new(format!("c{i}"), "x", i)).await
            };
            result.unwrap();
            completed.lock().unwrap().push(i);
        }
    });
    join_all(ops).await;

    let completed = completed.lock().unwrap().clone();
    assert_eq!(completed, (0..25).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn query_observes_every_earlier_write() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    let writes = (0..30u32).map(|i| {
        let store = store.clone();
        async move { store.upsert(&Contact::new(format!("c{i}"), "x", i)).await }
    });
    let read = {
        let store = store.clone();
        async move { store.query(QueryOptions::new()).await }
    };

    let (writes, read) = tokio::join!(join_all(writes), read);
    assert!(writes.into_iter().all(|w| w.is_ok()));
    assert_eq!(read.unwrap().len(), 30);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn blocked_table_does_not_hold_up_another() {
    let harness = TestHarness::new().await.unwrap();
    let contacts = harness.initialized_store::<Contact>("contacts").await.unwrap();
    let archive = harness.initialized_store::<Contact>("archive").await.unwrap();

    // Park the "contacts" key until released.
    let (release, parked) = oneshot::channel::<()>();
    let gate = harness.scheduler.enqueue("contacts", async move {
        let _ = parked.await;
    });
    let queued = {
        let contacts = contacts.clone();
        tokio::spawn(async move { contacts.upsert(&Contact::new("c1", "Ann", 30)).await })
    };

    // The other table proceeds while "contacts" is parked.
    tokio::time::timeout(
        Duration::from_secs(5),
        archive.upsert(&Contact::new("a1", "Old", 90)),
    )
    .await
    .expect("archive write should not wait for contacts")
    .unwrap();
    assert!(!queued.is_finished());

    release.send(()).unwrap();
    gate.await.unwrap();
    queued.await.unwrap().unwrap();
    assert!(contacts.get("c1").await.unwrap().is_some());
    assert!(archive.get("a1").await.unwrap().is_some());
}
