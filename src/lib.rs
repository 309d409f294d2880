//! Rust client library for the Power BI REST API workspace graph.
//!
//! Provides OAuth2 device-code authentication, an authenticated HTTP
//! client with timeout retry/backoff and status classification, and a
//! lazily materialized entity graph: workspaces containing reports,
//! semantic models, users and dashboards, plus organization-level apps.
//!
//! # Modules
//!
//! - [`auth`] — Device-code token provider with expiry tracking and
//!   unverified claim decoding.
//! - [`client`] — Retrying, classifying HTTP wrapper (`PbiClient`).
//! - [`error`] — Closed error taxonomy (`PbiError`).
//! - [`odata`] — `$filter/$top/$skip` query assembly and the
//!   `{"value": [...]}` collection envelope.
//! - [`service`] — Graph root: workspace and app listing.
//! - [`workspace`], [`report`], [`semantic_model`], [`user`],
//!   [`dashboard`], [`app`] — Entity kinds with identity-key equality.
//! - [`logging`] — Rolling file sink and log read-back.
//!
//! # Quick Start
//!
//! ```ignore
//! use pbi_beacon::client::ClientConfig;
//! use pbi_beacon::odata::ODataQuery;
//! use pbi_beacon::service::Service;
//!
//! let config = ClientConfig { client_id: "app-id".into(), ..Default::default() };
//! let mut service = Service::connect(config).await?;
//! service.get_workspaces(ODataQuery::default()).await?;
//! for workspace in &service.workspaces {
//!     println!("{workspace}");
//! }
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod auth;
pub mod client;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod odata;
pub mod report;
pub mod semantic_model;
pub mod service;
pub mod user;
pub mod workspace;
