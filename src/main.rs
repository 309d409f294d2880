//! CLI entry point for pbi-beacon — lists the signed-in user's workspaces
//! and optionally drills into one, printing its reports, semantic models,
//! users and dashboards.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, retry exhaustion, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use clap::Parser;

use pbi_beacon::client::ClientConfig;
use pbi_beacon::error::Result;
use pbi_beacon::logging;
use pbi_beacon::odata::ODataQuery;
use pbi_beacon::service::Service;
use pbi_beacon::workspace::Workspace;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Azure AD tenant to authenticate against. The default lets any
    /// work account sign in; pass a tenant ID to restrict it.
    #[arg(long, env = "PBI_TENANT_ID", default_value = "organizations")]
    tenant_id: String,

    /// Azure AD application (client) ID used for the device-code sign-in.
    #[arg(long, env = "PBI_CLIENT_ID")]
    client_id: String,

    /// Reuse a still-valid bearer token instead of signing in
    /// interactively. Prefer setting via PBI_SAVED_TOKEN to keep the
    /// token out of shell history.
    #[arg(long, env = "PBI_SAVED_TOKEN")]
    token: Option<String>,

    /// Proxy URL for all API calls.
    #[arg(long)]
    proxy: Option<String>,

    /// Workspace to drill into: fetches and prints its reports, semantic
    /// models, users and dashboards.
    #[arg(long)]
    workspace_id: Option<String>,

    /// OData $filter for the workspace listing.
    #[arg(long)]
    filter: Option<String>,

    /// Page size ($top) for the workspace listing.
    #[arg(long)]
    top: Option<u32>,

    /// Page offset ($skip) for the workspace listing.
    #[arg(long)]
    skip: Option<u32>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print the current log file and exit.
    #[arg(long)]
    show_log: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    if args.show_log {
        println!("{}", logging::read_log_file());
        return ExitCode::SUCCESS;
    }

    // A broken log setup shouldn't block the actual work; warn and go on.
    let _guard = logging::init(args.verbose)
        .map_err(|e| eprintln!("Warning: could not initialize logging: {e}"))
        .ok();

    let config = ClientConfig {
        authority: Some(format!(
            "https://login.microsoftonline.com/{}",
            args.tenant_id
        )),
        client_id: args.client_id,
        proxy_url: args.proxy,
        saved_token: args.token,
        policy: Default::default(),
    };

    let mut service = match Service::connect(config).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let query = ODataQuery {
        filter: args.filter,
        top: args.top,
        skip: args.skip,
    };
    if let Err(e) = service.get_workspaces(query).await {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    for workspace in &service.workspaces {
        println!("{workspace}");
    }

    if let Some(id) = &args.workspace_id {
        let Some(mut workspace) = service
            .workspaces
            .iter()
            .find(|workspace| &workspace.id == id)
            .cloned()
        else {
            eprintln!("Error: workspace {id} is not in the listing");
            return ExitCode::FAILURE;
        };

        if let Err(e) = drill_into(&mut workspace).await {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Fetches and prints every child collection of the selected workspace.
async fn drill_into(workspace: &mut Workspace) -> Result<()> {
    workspace.fetch_reports().await?;
    for report in &workspace.reports {
        println!("{report}");
    }

    workspace.fetch_semantic_models().await?;
    for model in &workspace.semantic_models {
        println!("{model}");
    }

    workspace.fetch_users(None, None).await?;
    for user in &workspace.users {
        println!("{user}");
    }

    workspace.fetch_dashboards().await?;
    for dashboard in &workspace.dashboards {
        println!("{dashboard}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Base arguments that satisfy all mandatory fields.
    fn base_args() -> Vec<&'static str> {
        vec!["pbi-beacon", "--client-id", "cid-123"]
    }

    #[test]
    fn defaults_target_the_multi_tenant_authority() {
        let cli = Cli::try_parse_from(base_args()).expect("base args should parse");
        assert_eq!(cli.tenant_id, "organizations");
        assert!(cli.token.is_none());
        assert!(cli.proxy.is_none());
        assert!(cli.workspace_id.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn listing_query_flags_parse() {
        let mut args = base_args();
        args.extend_from_slice(&[
            "--filter",
            "name eq 'Sales'",
            "--top",
            "5",
            "--skip",
            "10",
        ]);
        let cli = Cli::try_parse_from(args).expect("query flags should parse");
        assert_eq!(cli.filter.as_deref(), Some("name eq 'Sales'"));
        assert_eq!(cli.top, Some(5));
        assert_eq!(cli.skip, Some(10));
    }

    #[test]
    fn verbosity_accumulates() {
        let mut args = base_args();
        args.extend_from_slice(&["-v", "-v"]);
        let cli = Cli::try_parse_from(args).expect("repeated -v should parse");
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn drill_target_parses() {
        let mut args = base_args();
        args.extend_from_slice(&["--workspace-id", "296b51c5-fe7c-4dee-8cd5-584adc6c5f3a"]);
        let cli = Cli::try_parse_from(args).expect("workspace id should parse");
        assert_eq!(
            cli.workspace_id.as_deref(),
            Some("296b51c5-fe7c-4dee-8cd5-584adc6c5f3a")
        );
    }

    #[test]
    fn show_log_flag_parses() {
        let mut args = base_args();
        args.push("--show-log");
        let cli = Cli::try_parse_from(args).expect("--show-log should parse");
        assert!(cli.show_log);
    }
}
