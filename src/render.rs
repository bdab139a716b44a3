use std::collections::HashMap;

use serde_json::Value;

/// Replaces every `{{key}}` occurrence in `template` with the string
/// form of the matching variable. Unknown placeholders are left verbatim
/// rather than treated as errors; callers that need stricter behavior
/// must validate upstream.
pub fn render(template: &str, variables: &HashMap<String, Value>) -> String {
    if template.is_empty() {
        return String::new();
    }

    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, &stringify(value));
    }

    result
}

/// String form used for substitutions and the delivery data payload:
/// strings verbatim, null as empty, everything else via its JSON form.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Builds the opaque key/value data map attached to a push send.
///
/// Always carries `notification_id` and a stringified `link` (empty when
/// absent). Keys from `variables.meta` are merged in last and may
/// overwrite both; that ordering is load-bearing for existing consumers.
pub fn build_data_payload(
    notification_id: &str,
    variables: &HashMap<String, Value>,
) -> HashMap<String, String> {
    let mut payload = HashMap::new();

    payload.insert("notification_id".to_string(), notification_id.to_string());
    payload.insert(
        "link".to_string(),
        variables.get("link").map(stringify).unwrap_or_default(),
    );

    if let Some(Value::Object(meta)) = variables.get("meta") {
        for (key, value) in meta {
            payload.insert(key.clone(), stringify(value));
        }
    }

    payload
}
