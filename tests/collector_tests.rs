mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{raw_row, slots_for, wait_until, ScriptedFeed};
use parkwatch_lib::collector::CollectorController;
use parkwatch_lib::ingest::Ingestor;
use parkwatch_lib::{Database, ParkingService, Settings};

fn rows() -> Vec<parkwatch_lib::RawReading> {
    vec![
        raw_row(1, "2025-06-02T08:00:00Z", slots_for(2)),
        raw_row(2, "2025-06-02T08:00:15Z", slots_for(3)),
    ]
}

#[tokio::test]
async fn second_start_is_a_no_op() {
    let db = Database::in_memory().unwrap();
    let feed = ScriptedFeed::serving(rows()).shared();
    let ingestor = Ingestor::new(db.clone(), feed.clone());

    let mut controller = CollectorController::new();
    assert!(controller.start(ingestor.clone(), Duration::from_secs(3600), 100));
    assert!(!controller.start(ingestor, Duration::from_secs(3600), 100));
    assert!(controller.is_running());

    let metrics = controller.metrics();
    for _ in 0..400 {
        if metrics.snapshot().await.iterations >= 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    controller.stop().await.unwrap();
    assert!(!controller.is_running());
    assert_eq!(feed.calls(), 1, "only one polling loop may exist");
    assert_eq!(db.count_readings().await.unwrap(), 2);
}

#[tokio::test]
async fn failures_are_logged_and_polling_continues() {
    let db = Database::in_memory().unwrap();
    let feed = ScriptedFeed::serving(rows()).then_fail_first(503).shared();
    let ingestor = Ingestor::new(db.clone(), feed.clone());

    let mut controller = CollectorController::new();
    controller.start(ingestor, Duration::from_millis(10), 100);

    let polled = feed.clone();
    wait_until(move || polled.calls() >= 3).await;
    controller.stop().await.unwrap();

    let snapshot = controller.metrics().snapshot().await;
    assert_eq!(snapshot.failures, 1);
    assert!(snapshot.iterations >= 3);
    assert_eq!(snapshot.rows_inserted, 2);
    assert!(snapshot.last_error.unwrap().contains("503"));
    assert_eq!(db.count_readings().await.unwrap(), 2);
}

#[tokio::test]
async fn oversized_row_does_not_stop_the_collector() {
    let db = Database::in_memory().unwrap();
    let mut huge = [0; 8];
    huge[0] = i64::MAX;
    huge[1] = i64::MAX;
    let feed = ScriptedFeed::serving(vec![
        raw_row(1, "2025-06-02T08:00:00Z", huge),
        raw_row(2, "2025-06-02T08:00:15Z", slots_for(3)),
    ])
    .shared();
    let ingestor = Ingestor::new(db.clone(), feed.clone());

    let mut controller = CollectorController::new();
    controller.start(ingestor, Duration::from_millis(10), 100);

    let polled = feed.clone();
    wait_until(move || polled.calls() >= 3).await;
    assert!(controller.is_running());
    controller.stop().await.unwrap();

    let snapshot = controller.metrics().snapshot().await;
    assert_eq!(snapshot.failures, 0);
    assert_eq!(snapshot.rows_inserted, 1);
    assert_eq!(db.count_readings().await.unwrap(), 1);
}

#[tokio::test]
async fn stop_lets_the_in_flight_pass_finish() {
    let db = Database::in_memory().unwrap();
    let feed = ScriptedFeed::serving(rows())
        .with_delay(Duration::from_millis(150))
        .shared();
    let ingestor = Ingestor::new(db.clone(), feed.clone());

    let mut controller = CollectorController::new();
    controller.start(ingestor, Duration::from_secs(3600), 100);

    let polled = feed.clone();
    wait_until(move || polled.calls() >= 1).await;
    controller.stop().await.unwrap();

    assert_eq!(controller.metrics().snapshot().await.iterations, 1);
    assert_eq!(db.count_readings().await.unwrap(), 2);
}

#[tokio::test]
async fn collector_can_restart_after_stop() {
    let db = Database::in_memory().unwrap();
    let service = ParkingService::new(
        db,
        Arc::new(ScriptedFeed::serving(rows())),
        Settings::default(),
    );

    assert!(service.start_collector(Duration::from_secs(3600)).await);
    assert!(service.collector_running().await);
    service.stop_collector().await.unwrap();
    assert!(!service.collector_running().await);

    assert!(service.start_collector(Duration::from_secs(3600)).await);
    service.stop_collector().await.unwrap();

    let snapshot = service.collector_metrics().await;
    assert!(snapshot.iterations <= 2);
}

#[tokio::test]
async fn stop_without_start_is_harmless() {
    let mut controller = CollectorController::new();
    controller.stop().await.unwrap();
    assert!(!controller.is_running());
}
