//! Typed error hierarchy for the pbi-beacon crate.
//!
//! `PbiError` is a closed taxonomy covering every failure the client can
//! surface. Variants map to real system boundaries, not implementation
//! details:
//!
//! - `Auth` covers the Microsoft identity platform (token acquisition and
//!   claim decoding).
//! - The classified variants (`Unauthorized`, `TokenExpired`,
//!   `EntityNotFound`, `TooManyRequests`, `InternalServer`, `Api`) are the
//!   fixed mapping from Power BI HTTP status codes; `Api` is the
//!   unclassified catch-all. None of these is ever retried by the
//!   transport loop.
//! - `Transport` wraps `reqwest::Error` for failures that never produced a
//!   classifiable status (redirect loops, DNS, TCP, TLS).
//! - `RetriesExhausted` is the terminal outcome of the timeout/backoff
//!   loop.
//! - `Json` and `UnexpectedShape` cover response bodies that are,
//!   respectively, not JSON at all and JSON of the wrong shape (a
//!   collection endpoint returning something other than an object
//!   envelope).
//!
//! Each classified variant preserves the request URL and the raw response
//! body — Power BI error responses carry diagnostic detail that
//! `error_for_status()`-style handling would discard.

use reqwest::StatusCode;

/// Unified error type for all pbi-beacon library operations.
///
/// The `#[source]`/`#[from]` attributes on inner errors enable
/// `Error::source()` chaining so callers and logging frameworks can
/// traverse the full cause chain.
#[derive(Debug, thiserror::Error)]
pub enum PbiError {
    /// Token acquisition or access-token claim decoding failed.
    ///
    /// Covers non-2xx responses from the identity platform (the `message`
    /// includes the AADSTS diagnostic body when available), transport
    /// failures reaching the token endpoint, and tokens whose claims could
    /// not be extracted.
    #[error("authentication failed: {message}")]
    Auth {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying transport or parse error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 401 — the caller lacks access to the target resource.
    #[error("unauthorized 401 for {url}: {body}")]
    Unauthorized {
        /// The request URL that was rejected.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// 403 — the bearer token was rejected; the caller should
    /// re-authenticate before issuing further requests.
    #[error("token expired 403 for {url}: {body}")]
    TokenExpired {
        /// The request URL that was rejected.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// 404 — the target object is absent, or the caller lacks visibility
    /// into it (Power BI does not distinguish the two).
    #[error("entity not found 404 for {url}: {body}")]
    EntityNotFound {
        /// The request URL.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// 429 — rate limited.
    #[error("too many requests 429 for {url}: {body}")]
    TooManyRequests {
        /// The request URL.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// 500 — server-side failure.
    #[error("internal server error 500 for {url}: {body}")]
    InternalServer {
        /// The request URL.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// Any other non-success status the fixed table does not classify.
    #[error("API error {status} for {url}: {body}")]
    Api {
        /// The HTTP status code returned by the API.
        status: StatusCode,
        /// The request URL.
        url: String,
        /// The raw response body.
        body: String,
    },

    /// A transport-level failure (redirect loop, DNS resolution, TCP
    /// connection, TLS handshake). No status code is available because
    /// the request did not complete; surfaced immediately, never retried.
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The timeout/backoff loop ran out of attempts.
    #[error("request to {url} failed after {attempts} attempts")]
    RetriesExhausted {
        /// The request URL.
        url: String,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// A response body could not be decoded as JSON.
    #[error("failed to decode response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A response body parsed as JSON but was not the shape the endpoint
    /// contract requires (e.g. a collection endpoint returning an array
    /// instead of the `{"value": [...]}` object envelope). Fatal to the
    /// calling fetch; the target collection is left unmodified.
    #[error("unexpected response shape from {url}: expected {expected}")]
    UnexpectedShape {
        /// The request URL.
        url: String,
        /// Description of the shape the contract requires.
        expected: &'static str,
    },
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PbiError>;

impl PbiError {
    /// Maps a non-success HTTP status to its classified variant.
    ///
    /// The table is fixed: 401, 403, 404, 429 and 500 each have a named
    /// variant; everything else becomes the generic `Api` error. 200/201/202
    /// are the success statuses and are handled before classification.
    pub fn from_status(status: StatusCode, url: &str, body: String) -> Self {
        let url = url.to_string();
        match status.as_u16() {
            401 => PbiError::Unauthorized { url, body },
            403 => PbiError::TokenExpired { url, body },
            404 => PbiError::EntityNotFound { url, body },
            429 => PbiError::TooManyRequests { url, body },
            500 => PbiError::InternalServer { url, body },
            _ => PbiError::Api { status, url, body },
        }
    }
}
