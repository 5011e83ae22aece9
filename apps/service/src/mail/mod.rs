/// Alert delivery
///
/// Mailgun is used when credentials are configured; otherwise alerts are
/// only written to the log.

pub mod log;
pub mod mailgun;

pub use log::LogNotifier;
pub use mailgun::{MAILGUN_API_BASE_EU, MailgunNotifier};

use std::sync::Arc;

use crate::config::MailgunSettings;
use crate::monitoring::types::Notifier;

/// Pick the notifier matching the configured credentials
pub fn notifier_from_settings(settings: &MailgunSettings) -> anyhow::Result<Arc<dyn Notifier>> {
    if settings.is_configured() {
        Ok(Arc::new(MailgunNotifier::from_settings(settings)?))
    } else {
        tracing::warn!("Mailgun is not configured, down alerts will only be logged");
        Ok(Arc::new(LogNotifier))
    }
}
