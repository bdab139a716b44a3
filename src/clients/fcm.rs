use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    models::fcm::{FcmMessage, FcmNotification, FcmRequest},
};

const FCM_SCOPES: &[&str] = &["https://www.googleapis.com/auth/firebase.messaging"];

/// One push send: device credential plus the rendered content.
#[derive(Debug, Clone)]
pub struct PushNote<'a> {
    pub token: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub data: HashMap<String, String>,
    pub image_url: Option<&'a str>,
}

/// Machine-readable failure category. `Unregistered` and
/// `SenderMismatch` matter for operational visibility only; the
/// orchestrator retries all variants the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    Unregistered,
    SenderMismatch,
    Other(String),
}

impl Display for SendFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SendFailure::Unregistered => write!(f, "device token is invalid or unregistered"),
            SendFailure::SenderMismatch => write!(f, "sender id mismatch for token"),
            SendFailure::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Capability interface for push delivery, injected into the consumer at
/// process start.
pub trait PushGateway {
    fn send(&self, note: PushNote<'_>) -> impl Future<Output = Result<(), SendFailure>> + Send;
}

#[derive(Clone)]
enum GatewayMode {
    Fcm {
        http_client: Client,
        project_id: String,
        token_provider: Arc<dyn TokenProvider>,
    },
    Simulated,
}

/// FCM HTTP v1 adapter. Falls back to a simulation mode that logs every
/// send and reports success whenever credentials are not configured, so
/// the worker stays runnable in environments without Firebase access.
#[derive(Clone)]
pub struct FcmGateway {
    mode: GatewayMode,
}

impl FcmGateway {
    pub fn init(config: &Config) -> Self {
        let Some(project_id) = config.fcm_project_id.clone() else {
            warn!("FCM_PROJECT_ID not set; push notifications will be simulated (logged only)");
            return Self {
                mode: GatewayMode::Simulated,
            };
        };

        if !Path::new(&config.firebase_credentials_path).exists() {
            warn!(
                path = %config.firebase_credentials_path,
                "Firebase credentials not found; push notifications will be simulated (logged only)"
            );
            return Self {
                mode: GatewayMode::Simulated,
            };
        }

        match CustomServiceAccount::from_file(&config.firebase_credentials_path) {
            Ok(account) => {
                info!(project_id = %project_id, "FCM gateway initialized");
                Self {
                    mode: GatewayMode::Fcm {
                        http_client: Client::new(),
                        project_id,
                        token_provider: Arc::new(account),
                    },
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to load Firebase credentials");
                warn!("Push notifications will be simulated (logged only)");
                Self {
                    mode: GatewayMode::Simulated,
                }
            }
        }
    }

    async fn send_fcm(
        http_client: &Client,
        project_id: &str,
        token_provider: &Arc<dyn TokenProvider>,
        note: PushNote<'_>,
    ) -> Result<(), SendFailure> {
        let bearer = token_provider
            .token(FCM_SCOPES)
            .await
            .map_err(|e| SendFailure::Other(format!("Failed to obtain FCM token: {}", e)))?;

        let request = FcmRequest {
            message: FcmMessage {
                token: note.token.to_string(),
                notification: FcmNotification {
                    title: note.title.to_string(),
                    body: note.body.to_string(),
                    image: note.image_url.map(str::to_string),
                },
                data: Some(note.data),
            },
        };

        let url = format!(
            "https://fcm.googleapis.com/v1/projects/{}/messages:send",
            project_id
        );

        let response = http_client
            .post(&url)
            .bearer_auth(bearer.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| SendFailure::Other(format!("FCM request error: {}", e)))?;

        if response.status().is_success() {
            info!("Push notification sent successfully");
            return Ok(());
        }

        let error_text = response.text().await.unwrap_or_default();
        if error_text.contains("UNREGISTERED") {
            Err(SendFailure::Unregistered)
        } else if error_text.contains("SENDER_ID_MISMATCH") {
            Err(SendFailure::SenderMismatch)
        } else {
            Err(SendFailure::Other(format!(
                "FCM request failed: {}",
                error_text
            )))
        }
    }
}

impl PushGateway for FcmGateway {
    async fn send(&self, note: PushNote<'_>) -> Result<(), SendFailure> {
        match &self.mode {
            GatewayMode::Simulated => {
                let token_preview: String = note.token.chars().take(20).collect();
                info!(
                    token = %token_preview,
                    title = note.title,
                    body = note.body,
                    image = ?note.image_url,
                    data = ?note.data,
                    "[SIMULATED] Push notification sent"
                );
                Ok(())
            }
            GatewayMode::Fcm {
                http_client,
                project_id,
                token_provider,
            } => {
                debug!(title = note.title, "Sending FCM push notification");
                Self::send_fcm(http_client, project_id, token_provider, note).await
            }
        }
    }
}
