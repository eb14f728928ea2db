//! End-to-end lifecycle tests: loading, status self-healing, mutation
//! commands, and error capture through the controller.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use obligo::{
    CalendarCache, DateRange, EventFilter, EventLifecycleController, EventStatus, LoadState,
    MemoryEventStore, ObligoError, StoreError,
};

use crate::support::{date, payable, receivable, seed, FlakyStore};

#[tokio::test]
async fn test_past_due_receivable_is_settled_on_load() {
    let store = MemoryEventStore::new();
    seed(
        &store,
        vec![receivable("e1", "U1", dec!(100), date(2024, 1, 1))],
    )
    .await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default());

    let january = DateRange::month(2024, 1).unwrap();
    let snapshot = controller
        .get_events("U1", january, EventFilter::all())
        .await
        .unwrap();

    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.events.len(), 1);
    let e1 = &snapshot.events[0];
    assert_eq!(e1.status, EventStatus::Settled);
    assert_eq!(e1.actual_date, Some(date(2024, 1, 1)));
    assert!(!e1.is_overdue);

    let summary = controller.overall_summary(january).await;
    assert_eq!(summary.receivables_settled, dec!(100));
    assert_eq!(summary.overdue_count, 0);
}

#[tokio::test]
async fn test_status_date_invariant_holds_after_load() {
    let today = Utc::now().date_naive();
    let past = today - Duration::days(20);
    let future = today + Duration::days(20);

    let store = MemoryEventStore::new();
    seed(
        &store,
        vec![
            receivable("r-past-pending", "U1", dec!(10), past),
            receivable("r-future-pending", "U1", dec!(10), future),
            // Marked settled before its due date: the date rule demotes it.
            receivable("r-premature", "U1", dec!(10), future).settled_on(future),
            receivable("r-cancelled", "U1", dec!(10), past).with_status(EventStatus::Cancelled),
            receivable("r-reconciled", "U1", dec!(10), past)
                .settled_on(past)
                .with_status(EventStatus::Reconciled),
        ],
    )
    .await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default());

    let range = DateRange::new(today - Duration::days(60), today + Duration::days(60));
    let snapshot = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();
    assert_eq!(snapshot.events.len(), 5);

    for event in &snapshot.events {
        match event.status {
            EventStatus::Cancelled | EventStatus::Reconciled => continue,
            status => {
                let should_be_settled = event.expected_date <= today;
                assert_eq!(
                    status == EventStatus::Settled,
                    should_be_settled,
                    "event {} disagrees with its due date",
                    event.id
                );
            }
        }
    }

    let by_id = |id: &str| {
        snapshot
            .events
            .iter()
            .find(|e| e.id == id)
            .unwrap_or_else(|| panic!("missing {id}"))
    };
    assert_eq!(by_id("r-premature").status, EventStatus::Pending);
    assert_eq!(by_id("r-premature").actual_date, None);
    assert_eq!(by_id("r-cancelled").status, EventStatus::Cancelled);
    assert_eq!(by_id("r-reconciled").status, EventStatus::Reconciled);
}

#[tokio::test]
async fn test_overdue_payables_survive_the_automatic_pass() {
    let today = Utc::now().date_naive();
    let store = MemoryEventStore::new();
    seed(
        &store,
        vec![payable("p-late", "U1", dec!(45), today - Duration::days(7))],
    )
    .await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default());

    let range = DateRange::new(today - Duration::days(30), today + Duration::days(30));
    let snapshot = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();

    let p = &snapshot.events[0];
    assert_eq!(p.status, EventStatus::Pending);
    assert!(p.is_overdue);
    assert_eq!(p.days_until_due, -7);
}

#[tokio::test]
async fn test_mark_settled_round_trip() {
    let today = Utc::now().date_naive();
    let settled_on = today - Duration::days(2);
    let store = MemoryEventStore::new();
    seed(
        &store,
        vec![payable("p1", "U1", dec!(80), today - Duration::days(5))],
    )
    .await;
    let controller = EventLifecycleController::new(Arc::new(store), CalendarCache::default());

    let range = DateRange::new(today - Duration::days(30), today + Duration::days(30));
    controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();

    let snapshot = controller.mark_settled("p1", Some(settled_on)).await.unwrap();
    let p1 = &snapshot.events[0];
    assert_eq!(p1.status, EventStatus::Settled);
    assert_eq!(p1.actual_date, Some(settled_on));
    assert!(!p1.is_overdue);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test]
async fn test_failed_fetch_preserves_last_good_data() {
    let today = Utc::now().date_naive();
    let inner = MemoryEventStore::new();
    seed(
        &inner,
        vec![payable("p1", "U1", dec!(30), today + Duration::days(3))],
    )
    .await;
    let store = Arc::new(FlakyStore::new(inner));
    let controller =
        EventLifecycleController::new(Arc::clone(&store), CalendarCache::disabled());

    let range = DateRange::new(today, today + Duration::days(30));
    let good = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();
    assert_eq!(good.events.len(), 1);

    store.set_fail_queries(true);
    let snapshot = controller.refetch().await.unwrap();

    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.events.len(), 1, "last good data must survive");
    assert!(matches!(
        snapshot.last_error.as_deref(),
        Some(ObligoError::Store(StoreError::Transient(_)))
    ));

    // Recovery clears the recorded error.
    store.set_fail_queries(false);
    let recovered = controller.refetch().await.unwrap();
    assert!(recovered.last_error.is_none());
}

#[tokio::test]
async fn test_failed_mutation_keeps_previous_data() {
    let today = Utc::now().date_naive();
    let inner = MemoryEventStore::new();
    seed(
        &inner,
        vec![payable("p1", "U1", dec!(30), today + Duration::days(3))],
    )
    .await;
    let store = Arc::new(FlakyStore::new(inner).with_failing_mutations(&["p1"]));
    let controller = EventLifecycleController::new(store, CalendarCache::default());

    let range = DateRange::new(today, today + Duration::days(30));
    controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();

    let snapshot = controller.mark_settled("p1", None).await.unwrap();
    assert_eq!(snapshot.state, LoadState::Ready);
    assert_eq!(snapshot.events[0].status, EventStatus::Pending);
    assert!(snapshot.last_error.is_some());
}

#[tokio::test]
async fn test_auto_pass_tolerates_correction_failures() {
    let today = Utc::now().date_naive();
    let inner = MemoryEventStore::new();
    seed(
        &inner,
        vec![
            receivable("r-ok", "U1", dec!(10), today - Duration::days(5)),
            receivable("r-stuck", "U1", dec!(10), today - Duration::days(5)),
        ],
    )
    .await;
    let store = Arc::new(FlakyStore::new(inner).with_failing_mutations(&["r-stuck"]));
    let controller = EventLifecycleController::new(store, CalendarCache::default());

    let range = DateRange::new(today - Duration::days(30), today + Duration::days(30));
    let snapshot = controller
        .get_events("U1", range, EventFilter::all())
        .await
        .unwrap();

    // The batch continued past the failing item and the load still finished.
    assert_eq!(snapshot.state, LoadState::Ready);
    assert!(snapshot.last_error.is_none());
    let by_id = |id: &str| snapshot.events.iter().find(|e| e.id == id).unwrap();
    assert_eq!(by_id("r-ok").status, EventStatus::Settled);
    assert_eq!(by_id("r-stuck").status, EventStatus::Pending);
}
