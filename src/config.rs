use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

use crate::models::retry::RetryPolicy;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub rabbitmq_url: String,

    #[serde(default = "default_push_queue_name")]
    pub push_queue_name: String,

    #[serde(default = "default_failed_queue_name")]
    pub failed_queue_name: String,

    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,

    pub user_service_url: String,
    pub template_service_url: String,
    pub service_api_key: String,

    #[serde(default = "default_max_retry_count")]
    pub max_retry_count: u32,

    /// Delay tiers in seconds, indexed by the failing attempt's retry count.
    /// Retry counts beyond the table reuse the last tier.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: Vec<u64>,

    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,

    pub fcm_project_id: Option<String>,

    #[serde(default = "default_firebase_credentials_path")]
    pub firebase_credentials_path: String,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// An empty tier table would schedule zero-second retries (a hot
    /// requeue loop until the attempts run out), so it is rejected up
    /// front.
    pub fn validate(&self) -> Result<(), Error> {
        if self.retry_delay_secs.is_empty() {
            return Err(anyhow!("RETRY_DELAY_SECS must list at least one delay tier"));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retry_count,
            delay_tiers: self.retry_delay_secs.clone(),
        }
    }
}

fn default_push_queue_name() -> String {
    "push.queue".to_string()
}

fn default_failed_queue_name() -> String {
    "failed.queue".to_string()
}

fn default_prefetch_count() -> u16 {
    1
}

fn default_max_retry_count() -> u32 {
    3
}

fn default_retry_delay_secs() -> Vec<u64> {
    vec![60, 300, 900]
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn default_firebase_credentials_path() -> String {
    "firebase-credentials.json".to_string()
}
