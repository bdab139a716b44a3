use serde::{Deserialize, Serialize};

/// Read-only view of a template returned by the template service.
/// `title` and `body` are placeholder strings for the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}
