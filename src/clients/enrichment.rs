use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::{
    clients::SERVICE_API_KEY_HEADER,
    config::Config,
    models::{template::TemplateRecord, user::UserProfile},
};

#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

/// Read-only HTTP client for the user and template collaborators.
///
/// Every failure mode on a fetch (non-2xx, timeout, transport error,
/// undecodable body) collapses to `None`. The orchestrator cannot tell
/// "not found" from "service down" through this client; retries, where
/// they exist at all, are expressed by the queue topology upstream.
pub struct EnrichmentClient {
    http_client: Client,
    user_base_url: String,
    template_base_url: String,
    api_key: String,
}

impl EnrichmentClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        Ok(Self {
            http_client,
            user_base_url: config.user_service_url.clone(),
            template_base_url: config.template_service_url.clone(),
            api_key: config.service_api_key.clone(),
        })
    }

    pub async fn fetch_user(&self, user_id: &str) -> Option<UserProfile> {
        let url = format!("{}/api/v1/users/{}", self.user_base_url, user_id);
        debug!(user_id, "Fetching user data");
        self.fetch(&url, "user").await
    }

    pub async fn fetch_template(&self, template_code: &str) -> Option<TemplateRecord> {
        let url = format!("{}/api/v1/templates/{}", self.template_base_url, template_code);
        debug!(template_code, "Fetching template data");
        self.fetch(&url, "template").await
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str, resource: &str) -> Option<T> {
        let response = match self
            .http_client
            .get(url)
            .header(SERVICE_API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, url, "Failed to fetch {} data", resource);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url, "Failed to fetch {} data", resource);
            return None;
        }

        match response.json::<Envelope<T>>().await {
            Ok(envelope) => envelope.data,
            Err(e) => {
                error!(error = %e, url, "Failed to parse {} response", resource);
                None
            }
        }
    }
}
