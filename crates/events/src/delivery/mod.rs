//! Outbound delivery channels.
//!
//! [`NoticeSender`] is the seam the notifier talks to; [`email::EmailDelivery`]
//! is the SMTP implementation.

pub mod email;

use async_trait::async_trait;

use self::email::EmailError;

/// A rendered plain-text message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Something that can deliver a [`Notice`].
#[async_trait]
pub trait NoticeSender: Send + Sync {
    async fn send(&self, notice: &Notice) -> Result<(), EmailError>;
}
