//! Outbound notification seam.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while pushing a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to send notification: {0}")]
    Send(String),
}

/// Pushes text to the single configured notification destination.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` (Telegram HTML).
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}
