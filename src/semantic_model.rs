//! Semantic model (dataset) entities owned by a workspace.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A semantic model as returned by `GET groups/{id}/datasets`.
/// Identity is the model `id` alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticModel {
    /// Model ID — the identity key.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Who configured the model.
    #[serde(default)]
    pub configured_by: Option<String>,
    /// Whether scheduled refresh is available.
    #[serde(default)]
    pub is_refreshable: Option<bool>,
    /// ISO 8601 creation timestamp.
    #[serde(default)]
    pub created_date: Option<String>,
    /// `Import`, `DirectQuery`, or composite storage mode.
    #[serde(rename = "targetStorageMode", default)]
    pub storage_mode: Option<String>,
    /// Owning workspace id; set when the workspace attaches the model.
    #[serde(skip)]
    pub workspace_id: Option<String>,
}

impl SemanticModel {
    pub(crate) fn owned_by(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_string());
        self
    }
}

impl PartialEq for SemanticModel {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SemanticModel {}

impl Hash for SemanticModel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for SemanticModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name.as_deref().unwrap_or(""), self.id)
    }
}
