mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use walker_core::{JobEvent, JobState, JobStatePatch, PageTotal, Record};
use walker_engine::{Coordinator, DeliveryOutcome, EventSink, JobStore, MemoryJobStore};

use common::{fixed_clock, fixed_time};

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record {
            reference: Some(format!("REF-{i}")),
            ..Record::default()
        })
        .collect()
}

fn coordinator(store: Arc<MemoryJobStore>) -> Coordinator {
    Coordinator::with_clock(store, fixed_clock())
}

#[test]
fn completion_is_persisted_without_a_listener() {
    let store = Arc::new(MemoryJobStore::new());
    store.set(JobStatePatch::started(fixed_time())).unwrap();
    let coordinator = coordinator(store.clone());

    let outcome = coordinator.publish(JobEvent::Completed { records: records(2) });

    assert_eq!(
        outcome,
        DeliveryOutcome {
            persisted: true,
            relayed: false
        }
    );
    let state = store.get().unwrap();
    assert!(!state.running);
    assert_eq!(state.records.len(), 2);
    assert_eq!(state.completed_at, Some(fixed_time()));
}

#[test]
fn completion_reaches_an_attached_listener() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store);
    let mut listener = coordinator.subscribe();

    let outcome = coordinator.publish(JobEvent::Completed { records: records(1) });

    assert!(outcome.persisted && outcome.relayed);
    assert_eq!(
        listener.try_recv().unwrap(),
        JobEvent::Completed { records: records(1) }
    );
}

#[test]
fn failure_keeps_the_last_good_records() {
    let store = Arc::new(MemoryJobStore::with_state(JobState {
        records: records(4),
        completed_at: Some(fixed_time()),
        ..JobState::default()
    }));
    store.set(JobStatePatch::started(fixed_time())).unwrap();
    let coordinator = coordinator(store.clone());

    let outcome = coordinator.publish(JobEvent::Failed {
        reason: "element not found: .p-paginator-next".to_string(),
    });

    assert!(outcome.persisted);
    let state = store.get().unwrap();
    assert!(!state.running);
    assert_eq!(state.started_at, None);
    assert_eq!(state.records, records(4));
    assert_eq!(state.completed_at, Some(fixed_time()));
}

#[test]
fn progress_is_relayed_but_never_persisted() {
    let store = Arc::new(MemoryJobStore::new());
    store.set(JobStatePatch::started(fixed_time())).unwrap();
    let before = store.get().unwrap();
    let coordinator = coordinator(store.clone());
    let mut listener = coordinator.subscribe();

    let outcome = coordinator.publish(JobEvent::Progress {
        page: 3,
        total: PageTotal::Unknown,
    });

    assert_eq!(
        outcome,
        DeliveryOutcome {
            persisted: false,
            relayed: true
        }
    );
    assert_eq!(store.get().unwrap(), before);
    assert!(listener.try_recv().is_ok());
}

#[test]
fn dropped_listener_is_not_an_error() {
    let store = Arc::new(MemoryJobStore::new());
    let coordinator = coordinator(store);
    drop(coordinator.subscribe());

    let outcome = coordinator.publish(JobEvent::Failed {
        reason: "cancelled".to_string(),
    });

    assert!(outcome.persisted);
    assert!(!outcome.relayed);
}
