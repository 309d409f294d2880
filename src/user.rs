//! Workspace access-list users.

use serde::Deserialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One entry of a workspace's access list, from
/// `GET groups/{id}/users?{$top,$skip}`. Identity is the email address.
///
/// Principals that are not people (service principals, groups) may have
/// no email; such entries all compare equal to each other, which matches
/// the platform's own de-duplication of the access list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Email address — the identity key.
    #[serde(rename = "emailAddress", default)]
    pub email: Option<String>,
    /// `Admin`, `Member`, `Contributor` or `Viewer`.
    #[serde(rename = "groupUserAccessRight", default)]
    pub access_right: Option<String>,
    /// `User`, `Group` or `App`.
    #[serde(default)]
    pub principal_type: Option<String>,
    /// Display name.
    #[serde(rename = "displayName", default)]
    pub name: Option<String>,
    /// Owning workspace id; set when the workspace attaches the user.
    #[serde(skip)]
    pub workspace_id: Option<String>,
}

impl User {
    pub(crate) fn owned_by(mut self, workspace_id: &str) -> Self {
        self.workspace_id = Some(workspace_id.to_string());
        self
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.email.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn user_deserializes_access_list_entry() {
        let json = r#"{
            "emailAddress": "a@x.com",
            "groupUserAccessRight": "Admin",
            "principalType": "User",
            "displayName": "A"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
        assert_eq!(user.access_right.as_deref(), Some("Admin"));
        assert_eq!(user.principal_type.as_deref(), Some("User"));
        assert_eq!(user.name.as_deref(), Some("A"));
    }

    #[test]
    fn user_deserializes_sparse_entry() {
        // Service principals have no email address.
        let user: User = serde_json::from_str(r#"{"principalType": "App"}"#).unwrap();
        assert!(user.email.is_none());
        assert_eq!(user.principal_type.as_deref(), Some("App"));
    }

    #[test]
    fn identity_is_the_email_alone() {
        let a: User = serde_json::from_str(
            r#"{"emailAddress": "a@x.com", "groupUserAccessRight": "Viewer"}"#,
        )
        .unwrap();
        let b: User = serde_json::from_str(
            r#"{"emailAddress": "a@x.com", "groupUserAccessRight": "Admin", "displayName": "A"}"#,
        )
        .unwrap();
        assert_eq!(a, b, "access-right changes don't change who the user is");

        let set: HashSet<User> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_shows_the_email() {
        let user: User = serde_json::from_str(r#"{"emailAddress": "a@x.com"}"#).unwrap();
        assert_eq!(user.to_string(), "a@x.com");
    }
}
