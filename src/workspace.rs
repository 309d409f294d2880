//! Workspace container entities and their child-collection fetch protocol.
//!
//! A [`Workspace`] owns four child collections (reports, semantic models,
//! dashboards, users), each an unordered duplicate-free set that stays
//! empty until its `fetch_*` operation runs. Every fetch follows one
//! pattern: build the id-scoped endpoint path, GET it through the shared
//! client, unwrap the `{"value": [...]}` envelope, construct one child per
//! element tagged with this workspace's id, and replace the collection
//! wholesale. On any error the prior collection value is preserved.
//!
//! Each workspace holds a clone of the process-wide `Arc<PbiClient>`
//! handed to it at construction, so a re-authentication performed through
//! any holder is visible to all of them.

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::client::PbiClient;
use crate::dashboard::Dashboard;
use crate::error::Result;
use crate::odata::{self, ODataQuery};
use crate::report::Report;
use crate::semantic_model::SemanticModel;
use crate::user::User;

/// Wire snapshot of a workspace from `GET groups` / `GET groups/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRecord {
    /// Workspace ID — the identity key.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the workspace is read-only for the caller.
    #[serde(default)]
    pub is_read_only: Option<bool>,
    /// Present (and true) only for workspaces on dedicated capacity.
    #[serde(default)]
    pub is_on_dedicated_capacity: Option<bool>,
    /// Capacity ID, for workspaces on dedicated capacity.
    #[serde(default)]
    pub capacity_id: Option<String>,
}

/// A Power BI workspace: the top-level container of the entity graph.
///
/// Identity is the workspace `id` alone — two snapshots with the same id
/// are the same workspace regardless of name or capacity changes, and
/// regardless of how much of their child graph has been fetched.
#[derive(Debug, Clone)]
pub struct Workspace {
    client: Arc<PbiClient>,
    /// Workspace ID — the identity key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Whether the workspace is read-only for the caller.
    pub is_read_only: Option<bool>,
    /// Present (and true) only for workspaces on dedicated capacity.
    pub is_on_dedicated_capacity: Option<bool>,
    /// Capacity ID, for workspaces on dedicated capacity.
    pub capacity_id: Option<String>,
    /// Reports; empty until [`fetch_reports`](Workspace::fetch_reports).
    pub reports: HashSet<Report>,
    /// Semantic models; empty until
    /// [`fetch_semantic_models`](Workspace::fetch_semantic_models).
    pub semantic_models: HashSet<SemanticModel>,
    /// Dashboards; empty until
    /// [`fetch_dashboards`](Workspace::fetch_dashboards).
    pub dashboards: HashSet<Dashboard>,
    /// Access-list users; empty until
    /// [`fetch_users`](Workspace::fetch_users).
    pub users: HashSet<User>,
}

impl Workspace {
    /// Builds a workspace from its wire snapshot and the shared client.
    pub fn new(record: WorkspaceRecord, client: Arc<PbiClient>) -> Self {
        Workspace {
            client,
            id: record.id,
            name: record.name,
            is_read_only: record.is_read_only,
            is_on_dedicated_capacity: record.is_on_dedicated_capacity,
            capacity_id: record.capacity_id,
            reports: HashSet::new(),
            semantic_models: HashSet::new(),
            dashboards: HashSet::new(),
            users: HashSet::new(),
        }
    }

    /// Fetches the workspace's reports, replacing the `reports` set.
    pub async fn fetch_reports(&mut self) -> Result<()> {
        let path = format!("groups/{}/reports", self.id);
        let body = self.client.get_json(&path).await?;
        let reports: Vec<Report> = odata::parse_collection(&path, body)?;
        self.reports = reports
            .into_iter()
            .map(|report| report.owned_by(&self.id))
            .collect();
        Ok(())
    }

    /// Fetches the workspace's semantic models, replacing the
    /// `semantic_models` set. The wire resource is still named `datasets`.
    pub async fn fetch_semantic_models(&mut self) -> Result<()> {
        let path = format!("groups/{}/datasets", self.id);
        let body = self.client.get_json(&path).await?;
        let models: Vec<SemanticModel> = odata::parse_collection(&path, body)?;
        self.semantic_models = models
            .into_iter()
            .map(|model| model.owned_by(&self.id))
            .collect();
        Ok(())
    }

    /// Fetches one page of the workspace's access list, replacing the
    /// `users` set. Pagination is caller-driven: pass an advanced `skip`
    /// to get the next page (which then replaces this one).
    pub async fn fetch_users(&mut self, top: Option<u32>, skip: Option<u32>) -> Result<()> {
        let query = ODataQuery {
            filter: None,
            top,
            skip,
        };
        let path = format!("groups/{}/users?{}", self.id, query.to_query_string());
        let body = self.client.get_json(&path).await?;
        let users: Vec<User> = odata::parse_collection(&path, body)?;
        self.users = users
            .into_iter()
            .map(|user| user.owned_by(&self.id))
            .collect();
        Ok(())
    }

    /// Fetches the workspace's dashboards, replacing the `dashboards` set.
    pub async fn fetch_dashboards(&mut self) -> Result<()> {
        let path = format!("groups/{}/dashboards", self.id);
        let body = self.client.get_json(&path).await?;
        let dashboards: Vec<Dashboard> = odata::parse_collection(&path, body)?;
        self.dashboards = dashboards
            .into_iter()
            .map(|dashboard| dashboard.owned_by(&self.id))
            .collect();
        Ok(())
    }
}

impl PartialEq for Workspace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Workspace {}

impl Hash for Workspace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name.as_deref().unwrap_or(""), self.id)
    }
}
