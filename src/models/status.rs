use std::fmt::{Display, Formatter, Result};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Terminal or intermediate outcome of one processing pass, as reported
/// to the status collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered,
    Skipped,
    Pending,
    Failed,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Skipped => write!(f, "skipped"),
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub notification_id: String,
    pub status: DeliveryStatus,
    pub timestamp: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusUpdate {
    pub fn new(notification_id: &str, status: DeliveryStatus, error: Option<String>) -> Self {
        Self {
            notification_id: notification_id.to_string(),
            status,
            timestamp: utc_timestamp(),
            error,
        }
    }
}

/// RFC 3339 UTC with millisecond precision and trailing `Z`.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
