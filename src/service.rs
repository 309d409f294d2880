//! Top-level entry point into the Power BI entity graph.
//!
//! `Service` owns the single `PbiClient` for the process and the two
//! organization-level collections: workspaces and apps. Listing
//! operations follow the same replace-wholesale protocol as workspace
//! children — each successful fetch swaps the entire set; failures leave
//! it untouched.

use std::collections::HashSet;
use std::sync::Arc;

use crate::app::App;
use crate::client::{ClientConfig, PbiClient};
use crate::error::Result;
use crate::odata::{self, ODataQuery};
use crate::workspace::{Workspace, WorkspaceRecord};

/// Entry point: authenticates once and hands the shared client to every
/// workspace it materializes.
pub struct Service {
    client: Arc<PbiClient>,
    /// Workspaces the signed-in user can access; empty until
    /// [`get_workspaces`](Service::get_workspaces).
    pub workspaces: HashSet<Workspace>,
    /// Installed organization apps; empty until
    /// [`get_apps`](Service::get_apps).
    pub apps: HashSet<App>,
}

impl Service {
    /// Connects to the platform, constructing the one `PbiClient` this
    /// process will use.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let client = Arc::new(PbiClient::connect(config).await?);
        Ok(Service::new(client))
    }

    /// Builds a service around an existing shared client. Tests use this
    /// with a client pointed at a mock server.
    pub fn new(client: Arc<PbiClient>) -> Self {
        Service {
            client,
            workspaces: HashSet::new(),
            apps: HashSet::new(),
        }
    }

    /// A clone of the shared client, for callers that issue raw requests.
    pub fn client(&self) -> Arc<PbiClient> {
        Arc::clone(&self.client)
    }

    /// Fetches one page of the workspaces the user can access, replacing
    /// the `workspaces` set. `query` drives server-side filtering and
    /// paging; pass the default for an unfiltered first page.
    pub async fn get_workspaces(&mut self, query: ODataQuery) -> Result<()> {
        let path = format!("groups?{}", query.to_query_string());
        let body = self.client.get_json(&path).await?;
        let records: Vec<WorkspaceRecord> = odata::parse_collection(&path, body)?;
        self.workspaces = records
            .into_iter()
            .map(|record| Workspace::new(record, Arc::clone(&self.client)))
            .collect();
        Ok(())
    }

    /// Fetches a single workspace by ID. Returns a fresh entity; the
    /// `workspaces` set is not touched.
    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace> {
        let path = format!("groups/{workspace_id}");
        let body = self.client.get_json(&path).await?;
        let record: WorkspaceRecord = odata::parse_object(&path, body)?;
        Ok(Workspace::new(record, Arc::clone(&self.client)))
    }

    /// Fetches the organization's installed apps, replacing the `apps` set.
    pub async fn get_apps(&mut self) -> Result<()> {
        let path = "apps";
        let body = self.client.get_json(path).await?;
        let apps: Vec<App> = odata::parse_collection(path, body)?;
        self.apps = apps.into_iter().collect();
        Ok(())
    }
}
