mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use common::{raw_row, slots_for, ScriptedFeed};
use parkwatch_lib::ingest::Ingestor;
use parkwatch_lib::{Database, IngestError, RawReading};

fn batch() -> Vec<RawReading> {
    vec![
        raw_row(1, "2025-06-02T08:00:00Z", slots_for(2)),
        raw_row(2, "2025-06-02T08:00:15Z", slots_for(8)),
        raw_row(3, "2025-06-02T08:00:30Z", slots_for(10)),
    ]
}

fn ingestor_with(db: &Database, feed: ScriptedFeed) -> Ingestor {
    Ingestor::new(db.clone(), Arc::new(feed))
}

#[tokio::test]
async fn second_ingest_of_same_batch_inserts_nothing() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));

    assert_eq!(ingestor.ingest(&batch()).await.unwrap(), 3);
    assert_eq!(ingestor.ingest(&batch()).await.unwrap(), 0);
    assert_eq!(db.count_readings().await.unwrap(), 3);
}

#[tokio::test]
async fn overlapping_polls_only_add_new_ids() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));

    ingestor.ingest(&batch()[..2]).await.unwrap();
    let inserted = ingestor.ingest(&batch()).await.unwrap();
    assert_eq!(inserted, 1);
}

#[tokio::test]
async fn stored_occupancy_is_not_clamped() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));
    ingestor.ingest(&batch()).await.unwrap();

    let since = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let occupied: Vec<i64> = db
        .select_since(since)
        .await
        .unwrap()
        .iter()
        .map(|r| r.occupied)
        .collect();
    assert_eq!(occupied, vec![2, 8, 10]);

    let latest = db.latest_reading().await.unwrap().unwrap();
    assert_eq!(latest.entry_id, 3);
    assert_eq!(latest.available(), -2);
}

#[tokio::test]
async fn malformed_rows_are_dropped_without_failing_batch() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));

    let mut rows = batch();
    rows.push(serde_json::from_value(json!({"entry_id": 4, "created_at": "2025-06-02T08:00:45Z", "field1": "on"})).unwrap());
    rows.push(serde_json::from_value(json!({"created_at": "2025-06-02T08:01:00Z"})).unwrap());
    rows.push(serde_json::from_value(json!({"entry_id": 6, "created_at": "2025-06-02T08:01:15Z", "field2": "1"})).unwrap());

    assert_eq!(ingestor.ingest(&rows).await.unwrap(), 4);
    assert_eq!(db.count_readings().await.unwrap(), 4);
}

#[tokio::test]
async fn concurrent_ingest_of_same_ids_stores_each_once() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));

    let rows: Vec<RawReading> = (1..=200)
        .map(|id| raw_row(id, "2025-06-02T08:00:00Z", slots_for(id % 9)))
        .collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ingestor = ingestor.clone();
            let rows = rows.clone();
            tokio::spawn(async move { ingestor.ingest(&rows).await.unwrap() })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }

    assert_eq!(total, 200);
    assert_eq!(db.count_readings().await.unwrap(), 200);
}

#[tokio::test]
async fn collect_once_propagates_fetch_failure() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(batch()).then_fail_first(503));

    let err = ingestor.collect_once(100).await.unwrap_err();
    assert!(matches!(err, IngestError::Fetch(_)));

    assert_eq!(ingestor.collect_once(100).await.unwrap(), 3);
}

#[tokio::test]
async fn bootstrap_replaces_existing_rows() {
    let db = Database::in_memory().unwrap();
    let history = vec![
        raw_row(100, "2025-05-01T00:00:00Z", slots_for(1)),
        raw_row(101, "2025-05-01T00:00:15Z", slots_for(3)),
    ];
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(history));

    ingestor.ingest(&batch()).await.unwrap();
    assert_eq!(ingestor.bootstrap(8000).await.unwrap(), 2);

    let since = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let ids: Vec<i64> = db
        .select_since(since)
        .await
        .unwrap()
        .iter()
        .map(|r| r.entry_id)
        .collect();
    assert_eq!(ids, vec![100, 101]);
}

#[tokio::test]
async fn oversized_slot_total_is_dropped_not_fatal() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));

    let mut huge = [0; 8];
    huge[0] = i64::MAX;
    huge[1] = i64::MAX;
    let rows = vec![
        raw_row(1, "2025-06-02T08:00:00Z", huge),
        raw_row(2, "2025-06-02T08:00:15Z", slots_for(3)),
    ];

    assert_eq!(ingestor.ingest(&rows).await.unwrap(), 1);
    let latest = db.latest_reading().await.unwrap().unwrap();
    assert_eq!(latest.entry_id, 2);
    assert_eq!(latest.occupied, 3);
}

fn rows_for(ids: &[i64], created_at: &str) -> Vec<RawReading> {
    ids.iter()
        .map(|&id| raw_row(id, created_at, slots_for(2)))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reinitialize_never_splits_a_concurrent_batch() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));
    ingestor.ingest(&batch()).await.unwrap();

    let history_ids: Vec<i64> = (1_000..1_100).collect();
    let history = rows_for(&history_ids, "2025-06-01T08:00:00Z");

    let mut writers = Vec::new();
    for writer in 0..8_i64 {
        let ingestor = ingestor.clone();
        writers.push(tokio::spawn(async move {
            let ids: Vec<i64> = (0..50).map(|n| 10_000 + writer * 100 + n).collect();
            ingestor
                .ingest(&rows_for(&ids, "2025-06-03T08:00:00Z"))
                .await
                .unwrap();
            ids
        }));
    }

    let reset = {
        let ingestor = ingestor.clone();
        tokio::spawn(async move { ingestor.reinitialize(&history).await.unwrap() })
    };

    let mut batches = Vec::new();
    for writer in writers {
        batches.push(writer.await.unwrap());
    }
    assert_eq!(reset.await.unwrap(), 100);

    let late: Vec<i64> = (20_000..20_050).collect();
    assert_eq!(
        ingestor
            .ingest(&rows_for(&late, "2025-06-04T08:00:00Z"))
            .await
            .unwrap(),
        50
    );
    batches.push(late);

    assert_eq!(db.select_existing_ids(&history_ids).await.unwrap().len(), 100);
    assert!(db.select_existing_ids(&[1, 2, 3]).await.unwrap().is_empty());

    let mut expected = history_ids.len();
    for ids in &batches {
        let present = db.select_existing_ids(ids).await.unwrap().len();
        assert!(
            present == 0 || present == ids.len(),
            "batch split across reset: {present} of {} rows kept",
            ids.len()
        );
        expected += present;
    }
    assert_eq!(db.count_readings().await.unwrap(), expected as u64);
}

#[tokio::test]
async fn failed_bootstrap_fetch_leaves_store_untouched() {
    let db = Database::in_memory().unwrap();
    let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()).then_fail_first(500));

    ingestor.ingest(&batch()).await.unwrap();
    assert!(ingestor.bootstrap(8000).await.is_err());
    assert_eq!(db.count_readings().await.unwrap(), 3);
}

#[tokio::test]
async fn on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("parking.db");

    {
        let db = Database::new(path.clone()).unwrap();
        let ingestor = ingestor_with(&db, ScriptedFeed::serving(Vec::new()));
        ingestor.ingest(&batch()).await.unwrap();
    }

    let reopened = Database::new(path).unwrap();
    assert_eq!(reopened.count_readings().await.unwrap(), 3);
    let ingestor = ingestor_with(&reopened, ScriptedFeed::serving(Vec::new()));
    assert_eq!(ingestor.ingest(&batch()).await.unwrap(), 0);
}
