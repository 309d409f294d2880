//! Report entities owned by a workspace.
//!
//! A [`Report`] is an immutable-by-convention snapshot of one element of
//! the `GET groups/{id}/reports` response. Its identity is the
//! `(datasetId, id)` pair: two snapshots with the same pair are the same
//! report even when every other field drifted between fetches. Reports
//! are never patched in place — a re-fetch replaces the whole set.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A report as returned by the reports endpoint.
///
/// Field names use camelCase on the wire. Every non-key field is optional
/// with default-null semantics: an absent JSON key deserializes to `None`
/// rather than failing the fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report ID — half of the identity key.
    pub id: String,
    /// Backing semantic model ID — the other half of the identity key.
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// App ID, present when the report is distributed through an app.
    #[serde(default)]
    pub app_id: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Embed URL for hosting the report in an iframe.
    #[serde(default)]
    pub embed_url: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// For app-distributed copies, the workspace report they came from.
    #[serde(default)]
    pub original_report_id: Option<String>,
    /// `PowerBIReport` or `PaginatedReport`.
    #[serde(default)]
    pub report_type: Option<String>,
    /// Portal URL.
    #[serde(default)]
    pub web_url: Option<String>,
    /// Who last modified the report.
    #[serde(default)]
    pub modified_by: Option<String>,
    /// Who created the report.
    #[serde(default)]
    pub created_by: Option<String>,
    /// Owning workspace id. Not part of the wire payload; set when the
    /// workspace attaches the report after a fetch.
    #[serde(skip)]
    pub workspace_id: Option<String>,
}

impl Report {
    /// Tags the report with its owning workspace.
    pub(crate) fn owned_by(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_string());
        self
    }
}

impl PartialEq for Report {
    fn eq(&self, other: &Self) -> bool {
        self.dataset_id == other.dataset_id && self.id == other.id
    }
}

impl Eq for Report {}

impl Hash for Report {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dataset_id.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name.as_deref().unwrap_or(""), self.id)
    }
}
