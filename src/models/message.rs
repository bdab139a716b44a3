use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::status::utc_timestamp;

/// A single notification delivery request as read from the push queue.
///
/// `notification_id` is the only field whose absence makes a payload
/// malformed; everything else falls back to a default so that bad input
/// flows through the normal failure handling instead of being discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub notification_id: String,

    #[serde(default)]
    pub user_id: String,

    #[serde(default)]
    pub template_code: String,

    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,

    #[serde(default)]
    pub retry_count: u32,
}

/// Dead-letter envelope: the original item's fields flattened, plus the
/// failure context. Consumers of the failed queue see exactly the
/// original payload with `failure_reason` and `failed_at` added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DlqMessage {
    #[serde(flatten)]
    pub item: WorkItem,

    pub failure_reason: String,
    pub failed_at: String,
}

impl DlqMessage {
    pub fn new(item: WorkItem, failure_reason: impl Into<String>) -> Self {
        Self {
            item,
            failure_reason: failure_reason.into(),
            failed_at: utc_timestamp(),
        }
    }
}
