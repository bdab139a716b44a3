use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{info, warn};

use crate::{
    clients::SERVICE_API_KEY_HEADER,
    config::Config,
    models::status::{DeliveryStatus, StatusUpdate},
};

/// Best-effort reporter of per-notification outcomes. By the time a
/// status is reported the ack/retry/dead-letter decision is already
/// final, so reporting failures are logged and ignored.
pub struct StatusReporter {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl StatusReporter {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        Ok(Self {
            http_client,
            base_url: config.user_service_url.clone(),
            api_key: config.service_api_key.clone(),
        })
    }

    pub async fn report(
        &self,
        notification_id: &str,
        status: DeliveryStatus,
        error: Option<String>,
    ) {
        let update = StatusUpdate::new(notification_id, status, error);
        let url = format!("{}/api/v1/push/status/", self.base_url);

        match self
            .http_client
            .post(&url)
            .header(SERVICE_API_KEY_HEADER, &self.api_key)
            .json(&update)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(notification_id, status = %status, "Notification status updated");
            }
            Ok(response) => {
                warn!(
                    notification_id,
                    status = %response.status(),
                    "Failed to update notification status"
                );
            }
            Err(e) => {
                warn!(notification_id, error = %e, "Error updating notification status");
            }
        }
    }
}
