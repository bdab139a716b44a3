use std::collections::HashMap;

use push_worker::models::{
    message::{DlqMessage, WorkItem},
    status::{DeliveryStatus, StatusUpdate, utc_timestamp},
};
use serde_json::json;

fn sample_item() -> WorkItem {
    let mut variables = HashMap::new();
    variables.insert("name".to_string(), json!("Ada"));
    variables.insert("link".to_string(), json!("https://example.com"));

    WorkItem {
        notification_id: format!("notif_{}", uuid::Uuid::new_v4()),
        user_id: "user_1".to_string(),
        template_code: "WELCOME".to_string(),
        variables,
        retry_count: 0,
    }
}

/// Test: A payload missing notification_id is malformed
#[test]
fn test_missing_notification_id_is_malformed() {
    let payload = json!({
        "user_id": "user_1",
        "template_code": "WELCOME"
    })
    .to_string();

    assert!(serde_json::from_str::<WorkItem>(&payload).is_err());
}

/// Test: Non-JSON bodies fail to parse
#[test]
fn test_non_json_body_is_malformed() {
    assert!(serde_json::from_str::<WorkItem>("{ invalid json }").is_err());
    assert!(serde_json::from_slice::<WorkItem>(b"\xff\xfe").is_err());
}

/// Test: Optional fields default when absent
#[test]
fn test_optional_fields_default() {
    let payload = json!({"notification_id": "notif_1"}).to_string();

    let item: WorkItem = serde_json::from_str(&payload).unwrap();

    assert_eq!(item.notification_id, "notif_1");
    assert_eq!(item.user_id, "");
    assert_eq!(item.template_code, "");
    assert!(item.variables.is_empty());
    assert_eq!(item.retry_count, 0);
}

/// Test: Unknown fields in the queue payload are tolerated
#[test]
fn test_unknown_fields_tolerated() {
    let payload = json!({
        "notification_id": "notif_1",
        "user_id": "user_1",
        "priority": 9
    })
    .to_string();

    assert!(serde_json::from_str::<WorkItem>(&payload).is_ok());
}

/// Test: DLQ payload is the original fields plus exactly failure_reason
/// and failed_at
#[test]
fn test_dlq_payload_round_trip() {
    let item = sample_item();
    let original = serde_json::to_value(&item).unwrap();

    let dlq = DlqMessage::new(item, "Max retries exceeded");
    let augmented = serde_json::to_value(&dlq).unwrap();

    let original_keys: Vec<&String> = original.as_object().unwrap().keys().collect();
    let augmented_map = augmented.as_object().unwrap();

    for key in &original_keys {
        assert!(augmented_map.contains_key(*key), "lost original field {}", key);
        assert_eq!(augmented_map.get(*key), original.as_object().unwrap().get(*key));
    }
    assert_eq!(augmented_map.len(), original_keys.len() + 2);
    assert_eq!(
        augmented_map.get("failure_reason").unwrap(),
        "Max retries exceeded"
    );
    assert!(augmented_map.contains_key("failed_at"));

    let parsed: DlqMessage = serde_json::from_value(augmented).unwrap();
    assert_eq!(parsed.failure_reason, "Max retries exceeded");
}

/// Test: failed_at is ISO-8601 UTC with a trailing Z
#[test]
fn test_failed_at_timestamp_format() {
    let dlq = DlqMessage::new(sample_item(), "User not found");

    assert!(dlq.failed_at.ends_with('Z'));
    assert!(chrono::DateTime::parse_from_rfc3339(&dlq.failed_at).is_ok());

    let stamp = utc_timestamp();
    assert!(stamp.ends_with('Z'));
}

/// Test: Status updates serialize with lowercase status and omit a
/// missing error
#[test]
fn test_status_update_serialization() {
    let update = StatusUpdate::new("notif_1", DeliveryStatus::Skipped, None);
    let value = serde_json::to_value(&update).unwrap();

    assert_eq!(value.get("status").unwrap(), "skipped");
    assert!(value.get("error").is_none());
    assert!(value.get("timestamp").unwrap().as_str().unwrap().ends_with('Z'));

    let failed = StatusUpdate::new(
        "notif_1",
        DeliveryStatus::Failed,
        Some("User not found".to_string()),
    );
    let value = serde_json::to_value(&failed).unwrap();

    assert_eq!(value.get("status").unwrap(), "failed");
    assert_eq!(value.get("error").unwrap(), "User not found");
}

/// Test: Status variants display as their wire names
#[test]
fn test_status_display() {
    assert_eq!(DeliveryStatus::Delivered.to_string(), "delivered");
    assert_eq!(DeliveryStatus::Skipped.to_string(), "skipped");
    assert_eq!(DeliveryStatus::Pending.to_string(), "pending");
    assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
}
