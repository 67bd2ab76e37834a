// SPDX-FileCopyrightText: 2026 TinyStore Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for `RecordStore` against a real SQLite file.

use std::sync::Arc;

use serde_json::json;
use tinystore_core::{SqlEngine, TinyStoreError};
use tinystore_storage::{
    Database, Filters, QueryOptions, RecordStore, SqliteEngine, TaskScheduler,
};
use tinystore_test_utils::{init_test_tracing, Contact, Sample, TestHarness};

fn filters(pairs: &[(&str, serde_json::Value)]) -> Filters {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn every_kind_round_trips_through_storage() {
    init_test_tracing("debug");
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Sample>("samples").await.unwrap();

    let ordinary = Sample::new("s1", 42);
    let extremes = Sample::extremes("s2");
    store.upsert(&ordinary).await.unwrap();
    store.upsert(&extremes).await.unwrap();

    assert_eq!(store.get("s1").await.unwrap(), Some(ordinary));
    assert_eq!(store.get("s2").await.unwrap(), Some(extremes));
}

#[tokio::test]
async fn upsert_replaces_existing_row() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap();
    let mut renamed = Contact::new("c1", "Annie", 31);
    renamed.nickname = Some("A".into());
    store.upsert(&renamed).await.unwrap();

    let all = store.query(QueryOptions::new()).await.unwrap();
    assert_eq!(all, vec![renamed]);
}

#[tokio::test]
async fn get_missing_id_is_none() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    assert_eq!(store.get("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn numeric_columns_sort_arithmetically() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    for (id, age) in [("a", 2), ("b", 10), ("c", 1)] {
        store.upsert(&Contact::new(id, age.to_string(), age)).await.unwrap();
    }

    let ages: Vec<u32> = store
        .query(QueryOptions::new().sort_by("age"))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.age)
        .collect();
    assert_eq!(ages, vec![1, 2, 10]);

    let descending: Vec<u32> = store
        .query(QueryOptions::new().sort_by("age").reverse(true))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.age)
        .collect();
    assert_eq!(descending, vec![10, 2, 1]);

    // Text columns keep text order.
    let names: Vec<String> = store
        .query(QueryOptions::new().sort_by("name"))
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["1", "10", "2"]);
}

#[tokio::test]
async fn offset_and_limit_window_the_result() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    let contacts: Vec<Contact> = (0..10)
        .map(|i| Contact::new(format!("c{i}"), format!("n{i}"), i))
        .collect();
    store.upsert_batch(&contacts).await.unwrap();

    let page = store
        .query(QueryOptions::new().sort_by("age").offset(3).limit(4))
        .await
        .unwrap();
    assert_eq!(page.iter().map(|c| c.age).collect::<Vec<_>>(), vec![3, 4, 5, 6]);

    let tail = store
        .query(QueryOptions::new().sort_by("age").offset(8))
        .await
        .unwrap();
    assert_eq!(tail.iter().map(|c| c.age).collect::<Vec<_>>(), vec![8, 9]);
}

#[tokio::test]
async fn raw_filter_is_applied() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    for i in 0..6 {
        store.upsert(&Contact::new(format!("c{i}"), "x", i * 10)).await.unwrap();
    }

    let adults = store
        .query(QueryOptions::new().filter("\"age\" + 0 >= 20").sort_by("age"))
        .await
        .unwrap();
    assert_eq!(adults.len(), 4);
    assert_eq!(adults[0].age, 20);
}

#[tokio::test]
async fn batch_upsert_writes_every_row() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Sample>("samples").await.unwrap();
    let samples: Vec<Sample> = (0..25).map(|i| Sample::new(format!("s{i}"), i)).collect();

    assert_eq!(store.upsert_batch(&samples).await.unwrap(), 25);
    for sample in &samples {
        assert_eq!(store.get(&sample.id).await.unwrap().as_ref(), Some(sample));
    }
}

#[tokio::test]
async fn empty_batches_are_rejected() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    assert!(matches!(
        store.delete_batch(&[]).await,
        Err(TinyStoreError::InvalidInput(_))
    ));
    assert!(matches!(
        store.upsert_batch(&[]).await,
        Err(TinyStoreError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn row_missing_required_field_is_left_out() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    store.upsert(&Contact::new("ok", "Ann", 30)).await.unwrap();
    // Empty text reads back as absent, and `email` is required.
    let mut broken = Contact::new("broken", "Bob", 40);
    broken.email = String::new();
    store.upsert(&broken).await.unwrap();

    let all = store.query(QueryOptions::new()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, "ok");
    assert_eq!(store.get("broken").await.unwrap(), None);
}

#[tokio::test]
async fn missing_column_is_added_on_initialize() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .db
        .execute(|conn| {
            let mut engine = SqliteEngine::new(conn);
            engine.create_schema_object(
                "CREATE TABLE \"contacts\" (\"id\" TEXT PRIMARY KEY NOT NULL, \"name\" TEXT, \"email\" TEXT, \"age\" TEXT)",
            )?;
            engine.mutate("INSERT INTO \"contacts\" VALUES ('old', 'Old', 'old@example.com', '70')")
        })
        .await
        .unwrap();

    let store = harness.store::<Contact>("contacts").unwrap();
    assert_eq!(store.initialize().await.unwrap(), vec!["nickname"]);
    // A second pass has nothing left to add.
    assert!(store.initialize().await.unwrap().is_empty());

    let mut fresh = Contact::new("new", "New", 1);
    fresh.nickname = Some("N".into());
    store.upsert(&fresh).await.unwrap();

    assert_eq!(store.get("new").await.unwrap(), Some(fresh));
    let old = store.get("old").await.unwrap().unwrap();
    assert_eq!(old.age, 70);
    assert_eq!(old.nickname, None);
}

#[tokio::test]
async fn operations_before_initialize_fail_at_the_engine() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.store::<Contact>("contacts").unwrap();

    let err = store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap_err();
    assert!(matches!(err, TinyStoreError::Storage { .. }));

    store.initialize().await.unwrap();
    store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap();
}

#[tokio::test]
async fn deletes() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    let contacts: Vec<Contact> = (0..6)
        .map(|i| Contact::new(format!("c{i}"), format!("n{i}"), i))
        .collect();
    store.upsert_batch(&contacts).await.unwrap();

    assert_eq!(store.delete(&contacts[0]).await.unwrap(), 1);
    assert_eq!(store.delete(&contacts[0]).await.unwrap(), 0);
    assert_eq!(store.delete_batch(&contacts[1..3]).await.unwrap(), 2);
    assert_eq!(store.delete_where("\"age\" + 0 >= 5").await.unwrap(), 1);
    assert_eq!(
        store.delete_eq(&filters(&[("name", json!("n3"))])).await.unwrap(),
        1
    );

    let left = store.query(QueryOptions::new()).await.unwrap();
    assert_eq!(left, vec![contacts[4].clone()]);

    assert_eq!(store.delete_all().await.unwrap(), 1);
    assert!(store.query(QueryOptions::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn equality_queries_stringify_by_kind() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Sample>("samples").await.unwrap();
    let samples: Vec<Sample> = (0..4).map(|i| Sample::new(format!("s{i}"), i)).collect();
    store.upsert_batch(&samples).await.unwrap();

    let even = store
        .query_eq(&filters(&[("flag", json!(true))]), QueryOptions::new().sort_by("uint32"))
        .await
        .unwrap();
    assert_eq!(even.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["s0", "s2"]);

    let one = store
        .query_eq(
            &filters(&[("uint32", json!(3)), ("id", json!("s3"))]),
            QueryOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(one, vec![samples[3].clone()]);

    let combined = store
        .query_eq(
            &filters(&[("flag", json!(true))]),
            QueryOptions::new().filter("\"uint32\" + 0 > 0"),
        )
        .await
        .unwrap();
    assert_eq!(combined, vec![samples[2].clone()]);
}

#[tokio::test]
async fn unstringifiable_equality_values_fail() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    for bad in [
        filters(&[("name", serde_json::Value::Null)]),
        filters(&[("age", json!("thirty"))]),
        filters(&[("undeclared", json!("x"))]),
        filters(&[("id", json!(7))]),
        Filters::new(),
    ] {
        assert!(matches!(
            store.query_eq(&bad, QueryOptions::new()).await,
            Err(TinyStoreError::InvalidInput(_))
        ));
        assert!(matches!(
            store.delete_eq(&bad).await,
            Err(TinyStoreError::InvalidInput(_))
        ));
    }
}

#[tokio::test]
async fn failed_statement_does_not_affect_later_ones() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();

    let err = store.delete_where("no_such_column = 1").await.unwrap_err();
    assert!(matches!(err, TinyStoreError::Storage { .. }));
    assert!(store.query(QueryOptions::new().filter("((")).await.is_err());

    store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap();
    assert_eq!(store.query(QueryOptions::new()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn operations_after_teardown_report_not_open() {
    let harness = TestHarness::new().await.unwrap();
    let store = harness.initialized_store::<Contact>("contacts").await.unwrap();
    store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap();

    harness.teardown().await.unwrap();

    assert!(matches!(
        store.get("c1").await,
        Err(TinyStoreError::NotOpen)
    ));
    assert!(matches!(
        store.upsert(&Contact::new("c2", "Bob", 3)).await,
        Err(TinyStoreError::NotOpen)
    ));
    assert!(matches!(harness.db.configure().await, Err(TinyStoreError::AlreadyOpen)));
}

#[tokio::test]
async fn teardown_drains_work_issued_just_before_it() {
    let harness = TestHarness::new().await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    harness
        .db
        .execute_with(
            |conn| conn.execute_batch("CREATE TABLE drained (id TEXT)"),
            None,
            move |result| {
                let _ = tx.send(result);
            },
        )
        .unwrap();

    harness.teardown().await.unwrap();

    let delivered = rx.await.unwrap();
    assert!(delivered.is_ok(), "issued before teardown: {delivered:?}");
}

#[tokio::test]
async fn blob_store_from_harness() {
    let harness = TestHarness::new().await.unwrap();
    let blobs = harness.blob_store().unwrap();
    blobs.put("cards/c1.json", &Contact::new("c1", "Ann", 30)).await.unwrap();
    let card: Option<Contact> = blobs.get("cards/c1.json").await.unwrap();
    assert_eq!(card.map(|c| c.name), Some("Ann".into()));
    assert!(harness.dir().join("blobs/cards/c1.json").exists());
}

#[tokio::test]
async fn stores_run_on_a_database_built_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("from-config.db");
    let toml = format!(
        "[storage]\ndatabase_path = \"{}\"\nwal_mode = false\nbusy_timeout_ms = 250\n\n[logging]\nlevel = \"debug\"\n",
        db_path.display()
    );
    let config = tinystore_config::load_and_validate_str(&toml).unwrap();
    init_test_tracing(&config.logging.level);

    let db = Arc::new(Database::new(config.storage));
    db.configure().await.unwrap();
    let scheduler = Arc::new(TaskScheduler::new().unwrap());
    let store = RecordStore::<Contact>::new("contacts", scheduler, Arc::clone(&db)).unwrap();
    store.initialize().await.unwrap();
    store.upsert(&Contact::new("c1", "Ann", 30)).await.unwrap();
    assert_eq!(store.get("c1").await.unwrap().map(|c| c.age), Some(30));

    db.teardown().await.unwrap();
    assert!(db_path.exists());
}
