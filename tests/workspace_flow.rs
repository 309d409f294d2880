//! Integration tests for the workspace child-collection fetch protocol
//! using wiremock.
//!
//! Each fetch builds its id-scoped endpoint, unwraps the object envelope,
//! tags children with the owning workspace id, and replaces the target
//! set wholesale — these tests pin all four collections to that contract.

use std::sync::Arc;

use pbi_beacon::auth::TokenProvider;
use pbi_beacon::client::PbiClient;
use pbi_beacon::error::PbiError;
use pbi_beacon::report::Report;
use pbi_beacon::workspace::{Workspace, WorkspaceRecord};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: a workspace `w1` backed by a client pointed at the mock server.
async fn mock_workspace(server: &MockServer) -> Workspace {
    let provider = TokenProvider::with_token("mock-token");
    let client = PbiClient::with_base_url(provider, &format!("{}/", server.uri())).await;
    let record: WorkspaceRecord =
        serde_json::from_value(serde_json::json!({ "id": "w1", "name": "Sales" })).unwrap();
    Workspace::new(record, Arc::new(client))
}

// ── fetch_reports ──────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_reports_populates_and_tags_the_set() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "r1", "datasetId": "d1", "name": "Quarterly" },
                { "id": "r2", "datasetId": "d1", "name": "Monthly" }
            ]
        })))
        .mount(&server)
        .await;

    workspace.fetch_reports().await.unwrap();

    assert_eq!(workspace.reports.len(), 2);
    assert!(
        workspace
            .reports
            .iter()
            .all(|report| report.workspace_id.as_deref() == Some("w1")),
        "every report must carry the owning workspace id"
    );
}

#[tokio::test]
async fn fetch_reports_replaces_not_merges() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "r1", "datasetId": "d1", "name": "Quarterly" },
                { "id": "r2", "datasetId": "d1", "name": "Monthly" }
            ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // The second response no longer contains r1.
    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [ { "id": "r2", "datasetId": "d1", "name": "Monthly" } ]
        })))
        .mount(&server)
        .await;

    workspace.fetch_reports().await.unwrap();
    assert_eq!(workspace.reports.len(), 2);

    workspace.fetch_reports().await.unwrap();
    assert_eq!(workspace.reports.len(), 1);

    // Identity is (datasetId, id), so a probe with just those fields can
    // test membership.
    let gone: Report =
        serde_json::from_value(serde_json::json!({ "id": "r1", "datasetId": "d1" })).unwrap();
    assert!(
        !workspace.reports.contains(&gone),
        "a report omitted by the second fetch must be gone from the set"
    );
}

#[tokio::test]
async fn duplicate_wire_entries_collapse_by_identity() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    // Same (datasetId, id) twice with different names — one report.
    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "r1", "datasetId": "d1", "name": "Quarterly" },
                { "id": "r1", "datasetId": "d1", "name": "Quarterly (stale)" }
            ]
        })))
        .mount(&server)
        .await;

    workspace.fetch_reports().await.unwrap();
    assert_eq!(workspace.reports.len(), 1);
}

#[tokio::test]
async fn malformed_envelope_leaves_children_untouched() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [ { "id": "r1", "datasetId": "d1" } ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "r1" }])),
        )
        .mount(&server)
        .await;

    workspace.fetch_reports().await.unwrap();
    assert_eq!(workspace.reports.len(), 1);

    let err = workspace.fetch_reports().await.unwrap_err();
    assert!(matches!(err, PbiError::UnexpectedShape { .. }));
    assert_eq!(
        workspace.reports.len(),
        1,
        "the failed fetch must not clear the prior reports"
    );
}

#[tokio::test]
async fn classified_failure_propagates_from_a_fetch() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/reports"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not visible"))
        .mount(&server)
        .await;

    let err = workspace.fetch_reports().await.unwrap_err();
    assert!(matches!(err, PbiError::EntityNotFound { .. }));
    assert!(workspace.reports.is_empty());
}

// ── fetch_semantic_models ──────────────────────────────────────────────

#[tokio::test]
async fn fetch_semantic_models_hits_the_datasets_resource() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/datasets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "m1", "name": "SalesModel", "isRefreshable": true }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    workspace.fetch_semantic_models().await.unwrap();
    assert_eq!(workspace.semantic_models.len(), 1);
    let model = workspace.semantic_models.iter().next().unwrap();
    assert_eq!(model.name.as_deref(), Some("SalesModel"));
    assert_eq!(model.workspace_id.as_deref(), Some("w1"));
}

// ── fetch_users ────────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_users_passes_paging_parameters() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/users"))
        .and(query_param("$top", "2"))
        .and(query_param("$skip", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "emailAddress": "a@x.com", "groupUserAccessRight": "Admin" },
                { "emailAddress": "b@x.com", "groupUserAccessRight": "Viewer" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    workspace.fetch_users(Some(2), Some(4)).await.unwrap();
    assert_eq!(workspace.users.len(), 2);
}

#[tokio::test]
async fn fetch_users_without_paging_replaces_the_page() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [ { "emailAddress": "a@x.com" } ]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("groups/w1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [ { "emailAddress": "b@x.com" } ]
        })))
        .mount(&server)
        .await;

    workspace.fetch_users(None, None).await.unwrap();
    assert_eq!(workspace.users.iter().next().unwrap().email.as_deref(), Some("a@x.com"));

    // The next page fully replaces the previous one.
    workspace.fetch_users(None, None).await.unwrap();
    assert_eq!(workspace.users.len(), 1);
    assert_eq!(workspace.users.iter().next().unwrap().email.as_deref(), Some("b@x.com"));
}

// ── fetch_dashboards ───────────────────────────────────────────────────

#[tokio::test]
async fn fetch_dashboards_populates_the_set() {
    let server = MockServer::start().await;
    let mut workspace = mock_workspace(&server).await;

    Mock::given(method("GET"))
        .and(path("groups/w1/dashboards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "value": [
                { "id": "d1", "displayName": "KPIs", "isReadOnly": false },
                { "id": "d2", "displayName": "Exec view" }
            ]
        })))
        .mount(&server)
        .await;

    workspace.fetch_dashboards().await.unwrap();
    assert_eq!(workspace.dashboards.len(), 2);
    assert!(workspace
        .dashboards
        .iter()
        .all(|dashboard| dashboard.workspace_id.as_deref() == Some("w1")));
}
