//! Outbound notifications (welcome mails, reset codes, appointments).
//!
//! From the identity service's point of view delivery is fire-and-forget: a
//! failed send is logged and never turns a successful operation into a failure.

mod smtp;
mod templates;

pub use smtp::SmtpNotificationSender;
pub use templates::Templates;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::config::NotificationConfig;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Failed to send notification: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    #[must_use]
    pub fn to(recipient: &str, subject: String, body: String) -> Self {
        Self {
            recipients: vec![recipient.to_string()],
            subject,
            body,
        }
    }
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Sender used when delivery is disabled. Only metadata is logged; bodies may
/// carry one-time codes.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSender;

#[async_trait]
impl NotificationSender for LogNotificationSender {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        tracing::info!(
            recipients = ?notification.recipients,
            subject = %notification.subject,
            "Notification delivery disabled, message dropped"
        );
        Ok(())
    }
}

/// Keeps every message in memory. Can be switched to fail each send.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotificationSender {
    sent: Arc<Mutex<Vec<Notification>>>,
    fail: bool,
}

impl MemoryNotificationSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every delivery fails (after recording the attempt).
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last_to(&self, recipient: &str) -> Option<Notification> {
        self.sent()
            .into_iter()
            .rev()
            .find(|n| n.recipients.iter().any(|r| r == recipient))
    }
}

#[async_trait]
impl NotificationSender for MemoryNotificationSender {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);

        if self.fail {
            return Err(NotificationError::SendFailed(
                "simulated delivery failure".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builds the sender selected by configuration.
pub fn create_sender(
    config: &NotificationConfig,
) -> Result<Arc<dyn NotificationSender>, NotificationError> {
    if !config.enabled {
        return Ok(Arc::new(LogNotificationSender));
    }

    let sender = SmtpNotificationSender::new(config)?;
    Ok(Arc::new(sender))
}
