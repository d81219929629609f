//! Time-based completion of published events.
//!
//! Every published event whose `end_at` has passed is moved to `completed`
//! by the system actor, through the same [`TransitionEngine`] as user
//! requests.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use htw_core::actor::Actor;
use htw_core::error::CoreError;
use htw_core::event_workflow::EventStatus;
use htw_core::types::Timestamp;
use tokio_util::sync::CancellationToken;

use crate::engine::{TransitionEngine, TransitionRequest};

/// Complete every event due at `now`. Returns how many were completed.
///
/// Per-event failures are logged and skipped; an event another actor moved
/// in the meantime surfaces as a concurrent modification and is left alone.
/// Only a failure to list candidates aborts the sweep.
pub async fn sweep_once(engine: &TransitionEngine, now: Timestamp) -> Result<usize, CoreError> {
    let due = engine
        .call(engine.store().events_due_for_completion(now))
        .await?;

    let mut completed = 0;
    for event in due {
        let request = TransitionRequest::to(EventStatus::Completed)
            .with_note("Event ended")
            .expecting(EventStatus::Published);
        match engine
            .transition_event(event.id, request, &Actor::System)
            .await
        {
            Ok(outcome) if outcome.is_applied() => completed += 1,
            Ok(_) => {}
            Err(CoreError::ConcurrentModification { .. }) => {
                tracing::debug!(event_id = event.id, "Completion sweep: event already moved");
            }
            Err(e) => {
                tracing::error!(event_id = event.id, error = %e, "Completion sweep: transition failed");
            }
        }
    }
    Ok(completed)
}

/// Run the completion sweep every `interval` until `cancel` is triggered.
pub async fn run(engine: Arc<TransitionEngine>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Completion sweep started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Completion sweep stopping");
                break;
            }
            _ = ticker.tick() => {
                match sweep_once(&engine, Utc::now()).await {
                    Ok(0) => tracing::debug!("Completion sweep: nothing due"),
                    Ok(completed) => tracing::info!(completed, "Completion sweep: events completed"),
                    Err(e) => tracing::error!(error = %e, "Completion sweep failed"),
                }
            }
        }
    }
}
