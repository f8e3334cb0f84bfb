use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A platform user, as read by the notifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    pub role: String,
}

impl User {
    /// The email address to notify, if one is present and not blank.
    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}
