//! Host notifications on review outcomes.
//!
//! [`HostNotifier`] watches the bus for `event.status_changed` and e-mails
//! the owning host when their event lands in a status they need to hear
//! about. Without a configured sender every notice is logged and skipped.

use std::sync::Arc;
use std::time::Duration;

use htw_core::event_workflow::EventStatus;
use htw_core::types::DbId;
use htw_db::{with_timeout, StoreError, WorkflowStore};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{event_names, PlatformEvent, StatusChangedPayload};
use crate::delivery::email::EmailError;
use crate::delivery::{Notice, NoticeSender};

/// Statuses that trigger a host e-mail.
pub const NOTIFY_ON: &[EventStatus] = &[
    EventStatus::ChangesRequested,
    EventStatus::Approved,
    EventStatus::Declined,
    EventStatus::Scheduled,
    EventStatus::Published,
];

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to look up host: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Email(#[from] EmailError),
}

/// Subject and body for a host notice, or `None` when `to` is not notified.
pub fn compose(title: Option<&str>, to: EventStatus, note: Option<&str>) -> Option<(String, String)> {
    if !NOTIFY_ON.contains(&to) {
        return None;
    }
    let title = title.filter(|t| !t.trim().is_empty()).unwrap_or("Untitled event");

    let (subject, lead) = match to {
        EventStatus::ChangesRequested => (
            format!("[HTW] Changes requested for \"{title}\""),
            "A reviewer asked for changes before your event can be approved. \
             Update it and resubmit when ready.",
        ),
        EventStatus::Approved => (
            format!("[HTW] \"{title}\" was approved"),
            "Your event passed review. Staff will follow up to schedule it.",
        ),
        EventStatus::Declined => (
            format!("[HTW] \"{title}\" was declined"),
            "Your event was not accepted for this festival.",
        ),
        EventStatus::Scheduled => (
            format!("[HTW] \"{title}\" is scheduled"),
            "Your event has a confirmed slot.",
        ),
        _ => (
            format!("[HTW] \"{title}\" is live"),
            "Your event is now published on the festival calendar.",
        ),
    };

    let mut body = format!("{lead}\n\nEvent: {title}\nStatus: {to}\n");
    if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
        body.push_str(&format!("\nReviewer note:\n{note}\n"));
    }
    Some((subject, body))
}

/// Bound on the host lookup unless overridden.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HostNotifier {
    store: Arc<dyn WorkflowStore>,
    sender: Option<Arc<dyn NoticeSender>>,
    store_timeout: Duration,
}

impl HostNotifier {
    pub fn new(store: Arc<dyn WorkflowStore>, sender: Option<Arc<dyn NoticeSender>>) -> Self {
        Self {
            store,
            sender,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    /// Run until the channel closes or `cancel` fires.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>, cancel: CancellationToken) {
        if self.sender.is_none() {
            tracing::info!("SMTP not configured, host notifications will be logged only");
        }

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Host notifier cancelled");
                    break;
                }
                received = receiver.recv() => received,
            };

            match received {
                Ok(event) => {
                    if let Err(e) = self.handle(&event).await {
                        tracing::error!(
                            error = %e,
                            event_id = ?event.source_entity_id,
                            "Failed to notify host"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Host notifier lagged, notices were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    /// Handle one bus event. Returns the notice that was sent, if any.
    pub async fn handle(&self, event: &PlatformEvent) -> Result<Option<Notice>, NotifyError> {
        if event.event_type != event_names::EVENT_STATUS_CHANGED {
            return Ok(None);
        }
        let Some(StatusChangedPayload { to, note, host_user_id, title, .. }) = event.status_change()
        else {
            return Ok(None);
        };
        let Ok(to) = to.parse::<EventStatus>() else {
            return Ok(None);
        };
        let (Some(host_user_id), Some((subject, body))) =
            (host_user_id, compose(title.as_deref(), to, note.as_deref()))
        else {
            return Ok(None);
        };

        let Some(sender) = &self.sender else {
            tracing::info!(host_user_id, status = %to, "Skipping host notice, SMTP not configured");
            return Ok(None);
        };

        let Some(email) = self.host_email(host_user_id).await? else {
            tracing::warn!(host_user_id, "Host has no user row, notice dropped");
            return Ok(None);
        };

        let notice = Notice { to: email, subject, body };
        sender.send(&notice).await?;
        Ok(Some(notice))
    }

    async fn host_email(&self, host_user_id: DbId) -> Result<Option<String>, StoreError> {
        let user = with_timeout(self.store_timeout, self.store.find_user(host_user_id)).await?;
        Ok(user.map(|u| u.email))
    }
}
