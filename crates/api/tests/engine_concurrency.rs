//! Racing transitions against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use htw_api::engine::{Outcome, TransitionEngine, TransitionRequest};
use htw_core::actor::Actor;
use htw_core::error::CoreError;
use htw_core::event_workflow::EventStatus;
use htw_core::roles::Role;
use htw_db::models::event::CreateEvent;
use htw_db::{MemoryStore, WorkflowStore};
use htw_events::EventBus;

const HOST: i64 = 1;

async fn event_in_review(store: &MemoryStore, engine: &TransitionEngine) -> i64 {
    let event = store
        .create_event(
            HOST,
            &CreateEvent {
                title: Some("Hack night".into()),
                description: Some("Bring a laptop".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let host = Actor::user(HOST, [Role::EventHost]);
    let staff = Actor::user(2, [Role::HtwStaff]);
    engine
        .transition_event(event.id, TransitionRequest::to(EventStatus::Submitted), &host)
        .await
        .unwrap();
    engine
        .transition_event(event.id, TransitionRequest::to(EventStatus::InReview), &staff)
        .await
        .unwrap();
    event.id
}

#[tokio::test]
async fn two_reviewers_approving_at_once_yield_one_success() {
    let store = Arc::new(MemoryStore::new());
    let bus = Arc::new(EventBus::default());
    let engine = TransitionEngine::new(
        Arc::clone(&store) as Arc<dyn WorkflowStore>,
        Arc::clone(&bus),
        Duration::from_secs(2),
    );
    let id = event_in_review(&store, &engine).await;
    let mut rx = bus.subscribe();

    // Both requests read `in_review` before either writes.
    store.set_latency(Duration::from_millis(30));
    let alice = Actor::user(2, [Role::HtwStaff]);
    let bob = Actor::user(3, [Role::HtwStaff]);
    let (a, b) = tokio::join!(
        engine.transition_event(id, TransitionRequest::to(EventStatus::Approved), &alice),
        engine.transition_event(id, TransitionRequest::to(EventStatus::Approved), &bob),
    );
    store.set_latency(Duration::ZERO);

    let results = [a, b];
    let applied = results
        .iter()
        .filter(|r| matches!(r, Ok(Outcome::Applied { .. })))
        .count();
    assert_eq!(applied, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(CoreError::ConcurrentModification { entity: "Event", .. })
    )));

    let history = store.event_history(id).await.unwrap();
    let approvals = history.iter().filter(|h| h.to_status == "approved").count();
    assert_eq!(approvals, 1);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.status_change().unwrap().to, "approved");
    assert_matches!(rx.try_recv(), Err(_));
}

#[tokio::test]
async fn loser_sees_the_winners_status_on_reload() {
    let store = Arc::new(MemoryStore::new());
    let engine = TransitionEngine::new(
        Arc::clone(&store) as Arc<dyn WorkflowStore>,
        Arc::new(EventBus::default()),
        Duration::from_secs(2),
    );
    let id = event_in_review(&store, &engine).await;

    store.set_latency(Duration::from_millis(30));
    let staff = Actor::user(2, [Role::HtwStaff]);
    let (approve, decline) = tokio::join!(
        engine.transition_event(id, TransitionRequest::to(EventStatus::Approved), &staff),
        engine.transition_event(id, TransitionRequest::to(EventStatus::Declined), &staff),
    );
    store.set_latency(Duration::ZERO);

    let final_status = store.find_event(id).await.unwrap().unwrap().status;
    match (approve, decline) {
        (Ok(_), Err(CoreError::ConcurrentModification { .. })) => {
            assert_eq!(final_status, EventStatus::Approved)
        }
        (Err(CoreError::ConcurrentModification { .. }), Ok(_)) => {
            assert_eq!(final_status, EventStatus::Declined)
        }
        other => panic!("expected exactly one winner, got {other:?}"),
    }
    assert_eq!(store.event_history(id).await.unwrap().len(), 3);
}
