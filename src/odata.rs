//! OData query assembly and the collection envelope shared by every list
//! endpoint.
//!
//! Power BI wraps collections in `{ "value": [...] }`. The contract for
//! collection endpoints is strict: the body MUST be a JSON object — an
//! array (or anything else) at the top level is a contract violation that
//! fails the fetch and leaves the caller's collection untouched.
//!
//! Pagination is caller-driven: `$top`/`$skip` select one page and it is
//! the caller's job to advance `$skip` for the next call.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{PbiError, Result};

/// Optional `$filter`/`$top`/`$skip` parameters for a collection request.
///
/// Absent parameters are omitted from the query string entirely; present
/// ones are joined with `&`. The default value renders as the empty
/// string, so `groups?{}` keeps its trailing `?` — the URL shape the
/// platform accepts for an unfiltered listing.
#[derive(Debug, Clone, Default)]
pub struct ODataQuery {
    /// Server-side filter expression (OData V4 syntax).
    pub filter: Option<String>,
    /// Page size.
    pub top: Option<u32>,
    /// Page offset.
    pub skip: Option<u32>,
}

impl ODataQuery {
    /// Renders `$filter=..&$top=..&$skip=..`, skipping absent parameters.
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(filter) = &self.filter {
            params.push(format!("$filter={filter}"));
        }
        if let Some(top) = self.top {
            params.push(format!("$top={top}"));
        }
        if let Some(skip) = self.skip {
            params.push(format!("$skip={skip}"));
        }
        params.join("&")
    }
}

/// The `{ "value": [...] }` wrapper returned by collection endpoints.
#[derive(Debug, Deserialize)]
pub struct Collection<T> {
    /// The array of result items.
    pub value: Vec<T>,
}

/// Unwraps a collection envelope into one `T` per array element.
///
/// - Body not a JSON object → `UnexpectedShape` (fatal contract
///   violation).
/// - Missing or ill-typed `value`, or an element that doesn't match `T`
///   → `Json`.
pub fn parse_collection<T: DeserializeOwned>(url: &str, body: serde_json::Value) -> Result<Vec<T>> {
    if !body.is_object() {
        return Err(PbiError::UnexpectedShape {
            url: url.to_string(),
            expected: "a JSON object with a \"value\" array",
        });
    }
    let collection: Collection<T> = serde_json::from_value(body)?;
    Ok(collection.value)
}

/// Parses a single-object endpoint body, enforcing the same mapping-shape
/// contract as collections (minus the envelope).
pub fn parse_object<T: DeserializeOwned>(url: &str, body: serde_json::Value) -> Result<T> {
    if !body.is_object() {
        return Err(PbiError::UnexpectedShape {
            url: url.to_string(),
            expected: "a JSON object",
        });
    }
    Ok(serde_json::from_value(body)?)
}
