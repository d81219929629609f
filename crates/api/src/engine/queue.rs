//! Review queue projection.
//!
//! Read-only: resolves the actor's view, builds the store filter and lists
//! matching events. Actions taken from the queue go through
//! [`TransitionEngine`](super::TransitionEngine).

use std::time::Duration;

use htw_core::actor::Actor;
use htw_core::error::CoreError;
use htw_core::event_workflow::EventStatus;
use htw_core::queue::{build_filter, resolve_view, QueueView};
use htw_db::models::event::Event;
use htw_db::WorkflowStore;
use serde::Serialize;

use super::bounded;

/// Parsed queue query.
#[derive(Debug, Clone, Default)]
pub struct QueueRequest {
    pub view: Option<QueueView>,
    pub statuses: Option<Vec<EventStatus>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QueuePage {
    pub view: QueueView,
    pub limit: i64,
    pub offset: i64,
    pub events: Vec<Event>,
}

/// `listEventsForActor`: the events `actor` sees for `request`.
pub async fn list_events_for_actor(
    store: &dyn WorkflowStore,
    store_timeout: Duration,
    actor: &Actor,
    request: QueueRequest,
) -> Result<QueuePage, CoreError> {
    let view = resolve_view(actor, request.view)?;
    let filter = build_filter(actor, view, request.statuses, request.limit, request.offset)?;

    let events = bounded(store_timeout, store.list_events(&filter)).await?;
    tracing::debug!(
        user_id = ?actor.user_id(),
        view = %view,
        count = events.len(),
        "Review queue listed"
    );

    Ok(QueuePage {
        view,
        limit: filter.limit,
        offset: filter.offset,
        events,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use htw_core::roles::Role;
    use htw_db::models::event::CreateEvent;
    use htw_db::models::status_history::StatusChange;
    use htw_db::MemoryStore;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(1);

    async fn seed(store: &MemoryStore, host: i64, title: &str, status: EventStatus) {
        let event = store
            .create_event(
                host,
                &CreateEvent {
                    title: Some(title.to_string()),
                    description: Some("d".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        if status != EventStatus::Draft {
            store
                .apply_event_transition(&StatusChange {
                    entity_id: event.id,
                    from: EventStatus::Draft,
                    to: status,
                    changed_by: Some(host),
                    note: None,
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn staff_sees_attention_queue_oldest_first() {
        let store = MemoryStore::new();
        seed(&store, 1, "first", EventStatus::Submitted).await;
        seed(&store, 1, "draft", EventStatus::Draft).await;
        seed(&store, 2, "second", EventStatus::Resubmitted).await;

        let staff = Actor::user(10, [Role::HtwStaff]);
        let page = list_events_for_actor(&store, TIMEOUT, &staff, QueueRequest::default())
            .await
            .unwrap();

        assert_eq!(page.view, QueueView::Staff);
        let titles: Vec<_> = page.events.iter().filter_map(|e| e.title.as_deref()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn host_sees_only_own_events_newest_first() {
        let store = MemoryStore::new();
        seed(&store, 1, "mine-old", EventStatus::Draft).await;
        seed(&store, 2, "theirs", EventStatus::Submitted).await;
        seed(&store, 1, "mine-new", EventStatus::Submitted).await;

        let host = Actor::user(1, [Role::EventHost]);
        let page = list_events_for_actor(&store, TIMEOUT, &host, QueueRequest::default())
            .await
            .unwrap();

        let titles: Vec<_> = page.events.iter().filter_map(|e| e.title.as_deref()).collect();
        assert_eq!(titles, vec!["mine-new", "mine-old"]);
    }

    #[tokio::test]
    async fn venue_host_has_no_queue() {
        let store = MemoryStore::new();
        let actor = Actor::user(3, [Role::VenueHost]);
        let result = list_events_for_actor(&store, TIMEOUT, &actor, QueueRequest::default()).await;
        assert_matches!(result, Err(CoreError::Forbidden(_)));
    }
}
