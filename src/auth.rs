//! OAuth2 device-code authentication for the Microsoft identity platform.
//!
//! Acquires bearer tokens for the Power BI API scope by POSTing to the
//! authority's `/oauth2/v2.0/devicecode` endpoint, surfacing the sign-in
//! instructions to the operator, and polling `/oauth2/v2.0/token` with the
//! device-code grant until the sign-in completes. The token is cached in
//! `TokenProvider` with expiry tracking; consumers (e.g. `PbiClient`) read
//! the cached token via `token()` and call `authenticate()` when it is
//! absent or stale.
//!
//! This module also decodes access-token claims. The signature is NOT
//! verified — the Power BI gateway is trusted to do that — so decoding is
//! a plain base64url + JSON parse of the payload segment, used only to
//! extract the `upn` (user principal name) claim.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::error::{PbiError, Result};

/// Default authority for interactive sign-in. The `organizations` tenant
/// lets any work account authenticate; pass a tenant-specific authority to
/// restrict it.
pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com/organizations";

/// Resource scope requested for every token.
pub const POWER_BI_SCOPE: &str = "https://analysis.windows.net/powerbi/api/.default";

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Safety buffer subtracted from `expires_in` to trigger refresh before
/// the token actually expires. Prevents requests from racing the expiry
/// boundary.
const EXPIRY_BUFFER_SECS: u64 = 60;

/// Form body for the device-code request.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
struct DeviceCodeRequest<'a> {
    client_id: &'a str,
    scope: &'a str,
}

/// Subset of the device-code response we act on. The endpoint also returns
/// `verification_uri_complete` on some tenants; unknown fields are ignored.
#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: u64,
    interval: u64,
    #[serde(default)]
    message: Option<String>,
}

/// Form body for each token poll.
#[derive(Serialize)]
struct DeviceTokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    device_code: &'a str,
}

/// Subset of the token response that we need.
/// Extra fields (e.g. `ext_expires_in`, `refresh_token`) are silently
/// ignored because the struct is not marked `deny_unknown_fields`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// The opaque bearer token sent on every API request.
    pub access_token: String,
    /// Always `"Bearer"` for this grant.
    pub token_type: String,
    /// Validity window in seconds, from acquisition.
    pub expires_in: u64,
}

/// OAuth error body returned while the sign-in is pending or has failed.
#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Claims extracted from the access token payload.
///
/// Only the claims the client consumes are modeled; the token carries many
/// more. `upn` is mandatory — a token without it is unusable for
/// attributing requests to a user and is treated as a decode failure.
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    /// User principal name — the identity the platform attributes calls to.
    pub upn: String,
    /// Expiry as a Unix timestamp, when present.
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Manages device-code token acquisition and caching.
///
/// Invariants:
/// - `response` is `None` until the first successful `authenticate()` call
///   (or until seeded via `with_token`/`restore_token`).
/// - After a successful acquisition, `token()` returns `Some` until the
///   token expires (with a 60-second safety buffer), the provider is
///   invalidated, or the token is replaced by a subsequent acquisition.
/// - `acquired_at` is always `Some` when `response` is `Some`.
#[derive(Debug)]
pub struct TokenProvider {
    http: reqwest::Client,
    authority: String,
    client_id: String,
    scope: String,
    response: Option<TokenResponse>,
    acquired_at: Option<Instant>,
}

impl TokenProvider {
    /// Creates a provider with no cached token. The first `authenticate()`
    /// call runs the interactive device-code flow.
    pub fn new(authority: &str, client_id: &str, scope: &str) -> Self {
        TokenProvider {
            http: reqwest::Client::new(),
            authority: authority.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            scope: scope.to_string(),
            response: None,
            acquired_at: None,
        }
    }

    /// Creates a `TokenProvider` seeded with a pre-set token, bypassing the
    /// identity platform entirely. Used by tests to avoid real sign-in.
    /// The token is treated as freshly acquired (expires_in = 3600s).
    pub fn with_token(token: &str) -> Self {
        let mut provider = TokenProvider::new(DEFAULT_AUTHORITY, "", POWER_BI_SCOPE);
        provider.restore_token(token);
        provider
    }

    /// Seeds a previously saved token into the cache, keeping the
    /// authority/client configuration so that a later `authenticate()` can
    /// still run the interactive flow if the saved token proves unusable.
    ///
    /// The real remaining lifetime of a saved token is unknown; it is
    /// treated as freshly acquired and the platform's own rejection (or a
    /// claim-decode failure) is what retires it early.
    pub fn restore_token(&mut self, token: &str) {
        self.response = Some(TokenResponse {
            access_token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
        });
        self.acquired_at = Some(Instant::now());
    }

    /// Runs the interactive device-code flow and caches the resulting token.
    ///
    /// Prints the sign-in instructions (verification URL + user code) to
    /// stderr, then polls the token endpoint at the server-provided
    /// interval. `authorization_pending` continues the loop; `slow_down`
    /// stretches the interval by five seconds as the protocol requires; any
    /// other OAuth error, or the device code expiring, fails the flow.
    pub async fn authenticate(&mut self) -> Result<()> {
        let url = format!("{}/oauth2/v2.0/devicecode", self.authority);
        let request = DeviceCodeRequest {
            client_id: &self.client_id,
            scope: &self.scope,
        };

        let response = self
            .http
            .post(&url)
            .form(&request)
            .send()
            .await
            .map_err(|e| auth_err("device code request failed", e))?;

        // Read the body before checking status so AADSTS diagnostics are
        // preserved in the error on failure.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| auth_err("device code response unreadable", e))?;
        if !status.is_success() {
            return Err(PbiError::Auth {
                message: format!("device code request failed ({status}): {body}"),
                source: None,
            });
        }

        let device_code: DeviceCodeResponse = serde_json::from_str(&body)
            .map_err(|e| auth_err("malformed device code response", e))?;

        // Surface the sign-in instructions. Stderr, not stdout — the driver
        // reserves stdout for entity output.
        match &device_code.message {
            Some(message) => eprintln!("{message}"),
            None => eprintln!(
                "To sign in, open {} and enter the code {}",
                device_code.verification_uri, device_code.user_code
            ),
        }

        self.poll_for_token(&device_code).await
    }

    /// Polls the token endpoint until the user completes the sign-in,
    /// bounded by the device code's own expiry window.
    async fn poll_for_token(&mut self, device_code: &DeviceCodeResponse) -> Result<()> {
        let url = format!("{}/oauth2/v2.0/token", self.authority);
        let deadline = Instant::now() + Duration::from_secs(device_code.expires_in);
        let mut interval = Duration::from_secs(device_code.interval.max(1));

        loop {
            tokio::time::sleep(interval).await;
            if Instant::now() > deadline {
                return Err(PbiError::Auth {
                    message: "device code expired before sign-in completed".to_string(),
                    source: None,
                });
            }

            let request = DeviceTokenRequest {
                grant_type: DEVICE_CODE_GRANT,
                client_id: &self.client_id,
                device_code: &device_code.device_code,
            };
            let response = self
                .http
                .post(&url)
                .form(&request)
                .send()
                .await
                .map_err(|e| auth_err("token request failed", e))?;

            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| auth_err("token response unreadable", e))?;

            if status.is_success() {
                let token: TokenResponse = serde_json::from_str(&body)
                    .map_err(|e| auth_err("malformed token response", e))?;
                self.acquired_at = Some(Instant::now());
                self.response = Some(token);
                info!("acquired access token via device code flow");
                return Ok(());
            }

            let error: TokenErrorResponse = serde_json::from_str(&body)
                .map_err(|e| auth_err("malformed token error response", e))?;
            match error.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => {
                    interval += Duration::from_secs(5);
                    continue;
                }
                other => {
                    return Err(PbiError::Auth {
                        message: format!(
                            "device code sign-in failed ({other}): {}",
                            error.error_description.unwrap_or_default()
                        ),
                        source: None,
                    });
                }
            }
        }
    }

    /// Returns `true` if a token exists but has exceeded its lifetime
    /// (minus the safety buffer). Returns `false` if no token is cached.
    fn is_expired(&self) -> bool {
        match (&self.response, self.acquired_at) {
            (Some(response), Some(acquired)) => {
                let lifetime = response.expires_in.saturating_sub(EXPIRY_BUFFER_SECS);
                acquired.elapsed().as_secs() >= lifetime
            }
            _ => false,
        }
    }

    /// Returns the cached access token, or `None` if no token exists
    /// or the token has expired (with a 60-second safety buffer).
    pub fn token(&self) -> Option<&str> {
        if self.is_expired() {
            return None;
        }
        self.response
            .as_ref()
            .map(|response| response.access_token.as_str())
    }

    /// Discards the cached token. The next `token()` returns `None`,
    /// forcing a fresh acquisition.
    pub fn invalidate(&mut self) {
        self.response = None;
        self.acquired_at = None;
    }
}

/// Wraps an underlying error into `PbiError::Auth`, keeping it as source.
fn auth_err(
    context: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> PbiError {
    PbiError::Auth {
        message: format!("{context}: {source}"),
        source: Some(Box::new(source)),
    }
}

/// Decodes the claims of an access token WITHOUT verifying its signature.
///
/// The token must have the standard three-segment JWT shape; the payload
/// segment is base64url-decoded and parsed as JSON. A token that is
/// malformed, missing the `upn` claim, or carrying an `exp` in the past is
/// rejected — callers treat any of these as "this token is unusable" and
/// re-authenticate.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(PbiError::Auth {
            message: "malformed access token: expected 3 segments".to_string(),
            source: None,
        });
    }

    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let payload = engine
        .decode(segments[1])
        .map_err(|e| auth_err("access token payload is not base64url", e))?;
    let claims: TokenClaims = serde_json::from_slice(&payload)
        .map_err(|e| auth_err("access token claims did not parse", e))?;

    if let Some(exp) = claims.exp {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        if exp < now {
            return Err(PbiError::Auth {
                message: "access token is already expired".to_string(),
                source: None,
            });
        }
    }

    Ok(claims)
}
