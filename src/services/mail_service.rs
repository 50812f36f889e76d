use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::json;
use std::future::Future;

/// Outbound email seam. The queue worker only sees this trait; failures are
/// reported back as `Error::Delivery` and handled by the retry machinery.
pub trait MailTransport {
    fn send(&self, to: &str, subject: &str, body: &str)
        -> impl Future<Output = Result<()>> + Send;
}

/// Delivers through the company mail gateway: one JSON POST per message,
/// authenticated with a shared-secret header.
#[derive(Clone)]
pub struct WebhookMailer {
    client: Client,
    gateway_url: String,
    secret: String,
    from: String,
}

impl WebhookMailer {
    pub fn new(gateway_url: String, secret: String, from: String) -> Self {
        Self {
            client: Client::new(),
            gateway_url,
            secret,
            from,
        }
    }
}

impl MailTransport for WebhookMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.gateway_url)
            .header("X-Mail-Secret", self.secret.clone())
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "body": body,
            }))
            .send()
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(Error::Delivery(format!(
                "mail gateway returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}
