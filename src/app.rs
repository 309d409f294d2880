//! Organization-level app entities.
//!
//! Apps are listed at the organization level (`GET apps`), not inside a
//! workspace, so their parent is the owning [`Service`](crate::service)
//! itself — the service's `apps` set is the whole relationship.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An installed app as returned by `GET apps`.
/// Identity is the app `id` alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    /// App ID — the identity key.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Who published the app.
    #[serde(default)]
    pub published_by: Option<String>,
    /// ISO 8601 timestamp of the last publish.
    #[serde(default)]
    pub last_update: Option<String>,
}

impl PartialEq for App {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for App {}

impl Hash for App {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name.as_deref().unwrap_or(""), self.id)
    }
}
