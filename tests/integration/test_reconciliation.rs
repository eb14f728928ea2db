//! Batch status reconciliation through the controller.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use obligo::{
    CalendarCache, DateRange, EventFilter, EventLifecycleController, EventStatus, FinancialEvent,
    MemoryEventStore, ObligationKind,
};

use crate::support::{payable, receivable, seed, FlakyStore};

#[tokio::test]
async fn test_partial_failure_tolerance() {
    let today = Utc::now().date_naive();
    let due = today - Duration::days(10);

    let inner = MemoryEventStore::new();
    let batch: Vec<FinancialEvent> = (1..=5)
        .map(|i| receivable(&format!("r{i}"), "U1", dec!(10), due))
        .collect();
    seed(&inner, batch.clone()).await;

    let store = Arc::new(FlakyStore::new(inner).with_failing_mutations(&["r3"]));
    let controller = EventLifecycleController::new(Arc::clone(&store), CalendarCache::default())
        .with_auto_reconcile(false);

    let report = controller.reconcile_batch(&batch).await;

    // Item 3 failed; 1, 2, 4, 5 were still corrected.
    assert_eq!(report.corrected, 4);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, "r3");
    assert!(!report.is_complete());

    let range = DateRange::new(today - Duration::days(30), today);
    let snapshot = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();
    for event in &snapshot.events {
        let expected = if event.id == "r3" {
            EventStatus::Pending
        } else {
            EventStatus::Settled
        };
        assert_eq!(event.status, expected, "event {}", event.id);
    }
}

#[tokio::test]
async fn test_batch_refetches_the_viewer() {
    let today = Utc::now().date_naive();
    let due = today - Duration::days(3);

    let store = MemoryEventStore::new();
    seed(&store, vec![receivable("r1", "U1", dec!(70), due)]).await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default())
        .with_auto_reconcile(false);

    let range = DateRange::new(today - Duration::days(30), today + Duration::days(30));
    let before = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();
    assert_eq!(before.events[0].status, EventStatus::Pending);

    let report = controller.reconcile_batch(&before.events).await;
    assert_eq!(report.corrected, 1);

    let after = controller.snapshot().await;
    assert_eq!(after.events[0].status, EventStatus::Settled);
    assert_eq!(after.events[0].actual_date, Some(due));
}

#[tokio::test]
async fn test_explicit_batch_covers_payables_but_not_compensations() {
    let today = Utc::now().date_naive();
    let due = today - Duration::days(5);

    let store = MemoryEventStore::new();
    let compensation =
        FinancialEvent::with_id("c1", ObligationKind::Compensation, "U1", dec!(15), due);
    seed(
        &store,
        vec![payable("p1", "U1", dec!(20), due), compensation.clone()],
    )
    .await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default())
        .with_auto_reconcile(false);

    let range = DateRange::new(today - Duration::days(30), today);
    let loaded = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();

    let report = controller.reconcile_batch(&loaded.events).await;
    assert_eq!(report.corrected, 1);
    assert!(report.is_complete());

    let after = controller.snapshot().await;
    let by_id = |id: &str| after.events.iter().find(|e| e.id == id).unwrap();
    assert_eq!(by_id("p1").status, EventStatus::Settled);
    assert_eq!(by_id("c1").status, EventStatus::Pending);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let store = MemoryEventStore::new();
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default());

    let report = controller.reconcile_batch(&[]).await;
    assert_eq!(report.corrected, 0);
    assert!(report.is_complete());
}
