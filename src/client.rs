//! Authenticated, retrying HTTP client for the Power BI REST API.
//!
//! `PbiClient` wraps a `reqwest::Client` and a `TokenProvider` behind a
//! `Mutex`, providing GET/POST/DELETE helpers that share one request
//! contract: attach the bearer header, bound the attempt with a timeout,
//! retry timeouts with exponential backoff, and classify every non-success
//! status through the fixed table in [`PbiError::from_status`].
//!
//! Token lifecycle:
//! - Construction (`connect`) obtains a token — a saved one when supplied,
//!   otherwise via the interactive device-code flow — and decodes its
//!   claims to learn which user the calls run as. If the claims cannot be
//!   decoded for any reason, the token is discarded and the client
//!   re-authenticates exactly once before giving up.
//! - Expiry-aware: `TokenProvider::token()` returns `None` once the cached
//!   token goes stale, which triggers a fresh acquisition before the next
//!   request.
//! - A 403 (`TokenExpired`) does NOT re-authenticate automatically; it
//!   propagates to the caller like every other classified failure. Only
//!   the claim-decode path re-authenticates on its own.
//!
//! Exactly one `PbiClient` exists per process: `Service` constructs it and
//! every workspace holds a clone of the same `Arc`, so a re-authentication
//! performed through one holder is visible to all of them.

use reqwest::Method;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::auth::{self, TokenProvider, DEFAULT_AUTHORITY, POWER_BI_SCOPE};
use crate::error::{PbiError, Result};

/// Base URL for the Power BI REST API.
pub const BASE_URL: &str = "https://api.powerbi.com/v1.0/myorg/";

/// Connect timeout for the API HTTP client.
/// Covers TCP + TLS handshake only.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Retry/backoff policy applied to every request.
///
/// Timeouts are the only transient failure: each one sleeps
/// `backoff_unit * 2^attempt` and retries, up to `max_retries` attempts
/// total. Classified HTTP failures and other transport errors are never
/// retried. `backoff_unit` exists so tests can shrink the exponential
/// schedule without changing its 1,2,4,... shape.
#[derive(Debug, Clone)]
pub struct RequestPolicy {
    /// Per-attempt timeout for the full request round-trip.
    pub timeout: Duration,
    /// Maximum number of attempts before `RetriesExhausted`.
    pub max_retries: u32,
    /// The backoff time-unit; attempt `n` sleeps `backoff_unit * 2^n`.
    pub backoff_unit: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        RequestPolicy {
            timeout: Duration::from_secs(10),
            max_retries: 5,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RequestPolicy {
    /// Backoff delay for the given zero-based attempt: `unit * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_unit * 2u32.saturating_pow(attempt)
    }
}

/// Everything needed to construct a connected client.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Identity authority (tenant-scoped). Defaults to the
    /// `organizations` authority when `None`.
    pub authority: Option<String>,
    /// Azure AD application (client) ID used for the device-code sign-in.
    pub client_id: String,
    /// Proxy URL applied to all API calls, when set.
    pub proxy_url: Option<String>,
    /// A still-valid bearer token to reuse instead of signing in
    /// interactively. Discarded (and replaced interactively) if its
    /// claims cannot be decoded.
    pub saved_token: Option<String>,
    /// Retry/backoff policy.
    pub policy: RequestPolicy,
}

/// Authenticated HTTP client for the Power BI REST API.
///
/// `auth` is behind a `Mutex` because token acquisition needs `&mut self`
/// while request methods only need `&self`. The lock is held only for the
/// brief token check/refresh, never across an HTTP round-trip.
/// `base_url` is a `String` rather than a `&'static str` so tests can
/// point it at a wiremock server.
#[derive(Debug)]
pub struct PbiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Mutex<TokenProvider>,
    user: Option<String>,
    policy: RequestPolicy,
}

impl PbiClient {
    /// Constructs a client connected as a signed-in user.
    ///
    /// Obtains a token (the saved one when supplied, otherwise via the
    /// interactive device-code flow), then decodes its claims to extract
    /// the `upn`. A claim-decode failure of any kind discards the token
    /// and re-authenticates exactly once; a second failure propagates.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.proxy_url.as_deref())?;
        let authority = config
            .authority
            .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string());

        let mut provider = TokenProvider::new(&authority, &config.client_id, POWER_BI_SCOPE);
        match &config.saved_token {
            Some(token) => provider.restore_token(token),
            None => provider.authenticate().await?,
        }

        let user = resolve_user(&mut provider).await?;
        info!("connected to Power BI as {user}");

        Ok(PbiClient {
            http,
            base_url: BASE_URL.to_string(),
            auth: Mutex::new(provider),
            user: Some(user),
            policy: config.policy,
        })
    }

    /// Constructor that accepts a custom base URL, used by tests to point
    /// at a local mock server instead of the real API. Skips claim
    /// resolution — the provider is taken as-is.
    pub async fn with_base_url(provider: TokenProvider, base_url: &str) -> Self {
        PbiClient {
            http: build_http_client(None).expect("failed to build HTTP client"),
            base_url: base_url.to_string(),
            auth: Mutex::new(provider),
            user: None,
            policy: RequestPolicy::default(),
        }
    }

    /// Replaces the retry/backoff policy.
    pub fn with_policy(mut self, policy: RequestPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The user principal name the client authenticated as, when known.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The API base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a valid bearer token, acquiring a fresh one if none is
    /// cached or the cached one has expired.
    ///
    /// The mutex is held only for the token check and optional
    /// acquisition. If acquisition itself fails, the error propagates.
    async fn bearer_token(&self) -> Result<String> {
        let mut auth = self.auth.lock().await;
        if auth.token().is_none() {
            auth.authenticate().await?;
        }

        auth.token().map(str::to_owned).ok_or_else(|| PbiError::Auth {
            message: "token missing after acquisition".to_string(),
            source: None,
        })
    }

    /// Sends an authenticated GET request.
    ///
    /// Returns the raw 200/201/202 response for the caller to parse, or
    /// the classified error for anything else.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.send::<()>(Method::GET, path, None).await
    }

    /// Sends an authenticated GET request and decodes the body as JSON.
    ///
    /// Fetch operations go through this: the returned `Value` is handed to
    /// the envelope check before any entity construction happens.
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response = self.get(path).await?;
        let text = response.text().await.map_err(PbiError::Transport)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Sends an authenticated POST request with an optional JSON payload.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: Option<&B>,
    ) -> Result<reqwest::Response> {
        self.send(Method::POST, path, payload).await
    }

    /// Sends an authenticated DELETE request.
    ///
    /// Deletion is a remote operation only — it never touches the local
    /// entity graph; collections change solely through fetches.
    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    /// Core request method: all verb helpers delegate here.
    ///
    /// `path` is relative to `base_url` (no leading slash). One bearer
    /// token is resolved up front — a request is only ever attempted with
    /// a non-empty token. The attempt loop:
    /// - timeout → log, sleep `backoff_unit * 2^attempt`, retry;
    /// - any other transport failure (redirect loop, DNS, TLS) → fail
    ///   immediately wrapping the cause;
    /// - a response → classify and return, never retry.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.bearer_token().await?;

        for attempt in 0..self.policy.max_retries {
            let request = self.build_request(method.clone(), &url, &token, body);
            match request.send().await {
                Ok(response) => {
                    info!("API {method}: response from {url}: {}", response.status());
                    return self.classify(response, &url).await;
                }
                Err(e) if e.is_timeout() => {
                    error!(
                        "request timed out for {url}, retry {} of {}: {e}",
                        attempt + 1,
                        self.policy.max_retries
                    );
                    tokio::time::sleep(self.policy.backoff_delay(attempt)).await;
                }
                Err(e) => {
                    error!("request error for {url}: {e}");
                    return Err(PbiError::Transport(e));
                }
            }
        }

        Err(PbiError::RetriesExhausted {
            url,
            attempts: self.policy.max_retries,
        })
    }

    /// Constructs an authenticated request builder with the per-attempt
    /// timeout and optional JSON body. Factored out so every retry builds
    /// an identical request.
    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        token: &str,
        body: Option<&B>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .timeout(self.policy.timeout);
        if let Some(payload) = body {
            request = request.json(payload);
        }
        request
    }

    /// Success statuses (200/201/202) pass the raw response through;
    /// everything else reads the body and maps through the fixed status
    /// table. The body may be empty if it could not be read.
    async fn classify(&self, response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if matches!(status.as_u16(), 200 | 201 | 202) {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("API error {status} for {url}: {body}");
        Err(PbiError::from_status(status, url, body))
    }
}

/// Builds the reqwest client, routing through the proxy when configured.
fn build_http_client(proxy_url: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(PbiError::Transport)?);
    }
    builder.build().map_err(PbiError::Transport)
}

/// Extracts the signed-in user's `upn` from the current token, discarding
/// the token and re-authenticating exactly once if its claims cannot be
/// decoded. Absorbing that first failure is the only place the client
/// swallows an error.
async fn resolve_user(provider: &mut TokenProvider) -> Result<String> {
    let token = current_token(provider)?;
    match auth::decode_claims(&token) {
        Ok(claims) => Ok(claims.upn),
        Err(e) => {
            warn!("access token is unusable ({e}); re-authenticating");
            provider.invalidate();
            provider.authenticate().await?;
            let token = current_token(provider)?;
            Ok(auth::decode_claims(&token)?.upn)
        }
    }
}

fn current_token(provider: &TokenProvider) -> Result<String> {
    provider
        .token()
        .map(str::to_owned)
        .ok_or_else(|| PbiError::Auth {
            message: "no access token after authentication".to_string(),
            source: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_the_request_contract() {
        let policy = RequestPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        // The first three retries wait 1, 2 and 4 time-units.
        let policy = RequestPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn backoff_scales_with_the_configured_unit() {
        let policy = RequestPolicy {
            backoff_unit: Duration::from_millis(10),
            ..RequestPolicy::default()
        };
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn with_base_url_keeps_the_given_url() {
        let provider = TokenProvider::with_token("mock-token");
        let client = PbiClient::with_base_url(provider, "http://127.0.0.1:9/").await;
        assert_eq!(client.base_url(), "http://127.0.0.1:9/");
        assert!(client.user().is_none());
    }
}
