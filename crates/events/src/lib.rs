//! Notification and audit sink for the portal.
//!
//! - [`EventBus`] is the in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; [`PlatformEvent`] is its envelope.
//! - [`AuditPersistence`] appends every event to the hash-chained audit log.
//! - [`HostNotifier`] e-mails hosts when their event changes status.
//! - [`delivery`] holds the outbound channels (SMTP).
//!
//! Sink failures are logged and never reach the code that published the event.

pub mod bus;
pub mod delivery;
pub mod notifier;
pub mod persistence;

pub use bus::{event_names, EventBus, PlatformEvent, StatusChangedPayload};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::{Notice, NoticeSender};
pub use notifier::HostNotifier;
pub use persistence::AuditPersistence;
