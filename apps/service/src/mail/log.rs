use anyhow::Result;
use tracing::warn;

use crate::monitoring::types::Notifier;

/// Writes alerts to the log instead of delivering them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        warn!(recipients = ?recipients, subject = %subject, "{}", body);
        Ok(())
    }
}
