//! Dashboard entities owned by a workspace.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A dashboard as returned by `GET groups/{id}/dashboards`.
/// Identity is the dashboard `id` alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Dashboard ID — the identity key.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether the dashboard is read-only for the caller.
    #[serde(default)]
    pub is_read_only: Option<bool>,
    /// Portal URL.
    #[serde(default)]
    pub web_url: Option<String>,
    /// Embed URL.
    #[serde(default)]
    pub embed_url: Option<String>,
    /// Owning workspace id; set when the workspace attaches the dashboard.
    #[serde(skip)]
    pub workspace_id: Option<String>,
}

impl Dashboard {
    pub(crate) fn owned_by(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_string());
        self
    }
}

impl PartialEq for Dashboard {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Dashboard {}

impl Hash for Dashboard {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})",
            self.display_name.as_deref().unwrap_or(""),
            self.id
        )
    }
}
