use crate::domain::ports::{Notification, Notifier};
use crate::error::NotifyError;
use async_trait::async_trait;

/// Writes each notification to the log instead of sending email.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::info!(
            event = notification.event_type(),
            ?notification,
            "notification dispatched"
        );
        Ok(())
    }
}
