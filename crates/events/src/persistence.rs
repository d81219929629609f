//! Durable audit trail.
//!
//! [`AuditPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends every [`PlatformEvent`] to the audit log as one hash-chained
//! row. It runs as a long-lived background task and stops when the bus is
//! dropped or the cancellation token fires. Each append is bounded by the
//! store timeout so a hung store cannot stall the subscriber.

use std::sync::Arc;
use std::time::Duration;

use htw_core::audit::{
    action_for_event_type, canonical_entry_data, compute_integrity_hash, redact_sensitive_fields,
};
use htw_db::models::audit::{AuditLog, CreateAuditLog};
use htw_db::{with_timeout, StoreResult, WorkflowStore};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::PlatformEvent;

/// Background service that writes platform events to the audit log.
pub struct AuditPersistence;

impl AuditPersistence {
    /// Run the persistence loop until the channel closes or `cancel` fires.
    pub async fn run(
        store: Arc<dyn WorkflowStore>,
        mut receiver: broadcast::Receiver<PlatformEvent>,
        store_timeout: Duration,
        cancel: CancellationToken,
    ) {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Audit persistence cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    let written =
                        with_timeout(store_timeout, Self::persist(store.as_ref(), &event)).await;
                    if let Err(e) = written {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to write audit entry"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Audit persistence lagged, events were not recorded");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, audit persistence shutting down");
                    break;
                }
            }
        }
    }

    /// Append one event, chaining its hash onto the latest stored entry.
    ///
    /// Only this task appends, so reading the last hash and then inserting
    /// keeps the chain linear.
    pub async fn persist(store: &dyn WorkflowStore, event: &PlatformEvent) -> StoreResult<AuditLog> {
        let details = serde_json::json!({
            "event_type": event.event_type,
            "occurred_at": event.timestamp,
            "data": redact_sensitive_fields(&event.payload),
        });
        let action_type = action_for_event_type(&event.event_type);

        let entry_data = canonical_entry_data(
            action_type,
            event.source_entity_type.as_deref(),
            event.source_entity_id,
            event.actor_user_id,
            &details,
        );
        let prev = store.last_audit_hash().await?;
        let integrity_hash = compute_integrity_hash(prev.as_deref(), &entry_data);

        store
            .append_audit(&CreateAuditLog {
                user_id: event.actor_user_id,
                action_type: action_type.to_string(),
                entity_type: event.source_entity_type.clone(),
                entity_id: event.source_entity_id,
                details_json: details,
                integrity_hash,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use htw_core::audit::{action_types, first_broken_link};
    use htw_db::MemoryStore;

    use super::*;
    use crate::bus::{event_names, EventBus};

    fn transition(id: i64, to: &str) -> PlatformEvent {
        PlatformEvent::new(event_names::EVENT_STATUS_CHANGED)
            .with_source("event", id)
            .with_actor(Some(3))
            .with_payload(serde_json::json!({"from": "draft", "to": to, "phone": "555-0100"}))
    }

    #[tokio::test]
    async fn entries_form_an_intact_chain() {
        let store = MemoryStore::new();
        AuditPersistence::persist(&store, &transition(1, "submitted")).await.unwrap();
        AuditPersistence::persist(&store, &transition(1, "in_review")).await.unwrap();

        let chain = store.audit_chain().await.unwrap();
        assert_eq!(chain.len(), 2);
        let data: Vec<String> = chain.iter().map(AuditLog::canonical_data).collect();
        let broken = first_broken_link(
            data.iter()
                .zip(chain.iter())
                .map(|(d, e)| (d.as_str(), e.integrity_hash.as_str())),
        );
        assert_eq!(broken, None);
    }

    #[tokio::test]
    async fn entry_is_mapped_and_redacted() {
        let store = MemoryStore::new();
        let row = AuditPersistence::persist(&store, &transition(9, "submitted"))
            .await
            .unwrap();

        assert_eq!(row.action_type, action_types::EVENT_TRANSITION);
        assert_eq!(row.entity_type.as_deref(), Some("event"));
        assert_eq!(row.entity_id, Some(9));
        assert_eq!(row.user_id, Some(3));
        assert_eq!(row.details_json["data"]["phone"], "[REDACTED]");
        assert_eq!(row.details_json["data"]["to"], "submitted");
    }

    #[tokio::test]
    async fn run_stops_on_cancel_after_draining() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(AuditPersistence::run(
            store.clone(),
            bus.subscribe(),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        bus.publish(transition(4, "submitted"));
        for _ in 0..50 {
            if !store.audit_chain().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(store.audit_chain().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn hung_append_is_skipped_and_the_loop_continues() {
        let store = Arc::new(MemoryStore::new());
        let bus = EventBus::default();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(AuditPersistence::run(
            store.clone(),
            bus.subscribe(),
            Duration::from_millis(30),
            cancel.clone(),
        ));

        store.set_latency(Duration::from_millis(300));
        bus.publish(transition(1, "submitted"));
        tokio::time::sleep(Duration::from_millis(150)).await;
        store.set_latency(Duration::ZERO);

        bus.publish(transition(2, "submitted"));
        for _ in 0..50 {
            if !store.audit_chain().await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        handle.await.unwrap();

        let chain = store.audit_chain().await.unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].entity_id, Some(2));
    }
}
