use serde::{Deserialize, Serialize};

/// Read-only view of a user returned by the user service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub push_token: Option<String>,

    #[serde(default)]
    pub preferences: PushPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushPreferences {
    /// Opt-out flag. Absent means the user has not opted out.
    #[serde(default = "default_push_enabled")]
    pub push: bool,
}

impl Default for PushPreferences {
    fn default() -> Self {
        Self {
            push: default_push_enabled(),
        }
    }
}

fn default_push_enabled() -> bool {
    true
}
