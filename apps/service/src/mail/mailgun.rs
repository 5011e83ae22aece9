use anyhow::{Result, anyhow};
use std::time::Duration;

use crate::config::MailgunSettings;
use crate::monitoring::types::Notifier;

/// Mailgun's EU region API base
pub const MAILGUN_API_BASE_EU: &str = "https://api.eu.mailgun.net/v3";

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends alerts through the Mailgun messages API
pub struct MailgunNotifier {
    client: reqwest::Client,
    api_base: String,
    domain: String,
    api_key: String,
    sender: String,
}

impl MailgunNotifier {
    pub fn new(api_base: &str, domain: &str, api_key: &str, sender: &str) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            domain: domain.to_string(),
            api_key: api_key.to_string(),
            sender: sender.to_string(),
        })
    }

    pub fn from_settings(settings: &MailgunSettings) -> Result<Self> {
        Self::new(&settings.api_base, &settings.domain, &settings.api_key, &settings.sender)
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.domain)
    }
}

#[async_trait::async_trait]
impl Notifier for MailgunNotifier {
    async fn send(&self, recipients: &[String], subject: &str, body: &str) -> Result<()> {
        let mut form: Vec<(&str, &str)> = vec![("from", self.sender.as_str()), ("subject", subject), ("text", body)];
        form.extend(recipients.iter().map(|recipient| ("to", recipient.as_str())));

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| anyhow!("Mailgun request failed: {}", e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(recipients = recipients.len(), "Mailgun accepted alert");
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(anyhow!("Mailgun rejected message with status {}: {}", status, text))
        }
    }
}
