//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopmate_core::{Email, Role, UserId};

/// A marketplace user (domain type).
///
/// The password hash lives only in the `users` table and in the auth service;
/// it is deliberately absent here so it can never leak into a response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Capability role; `None` until the user chooses one post-signup.
    pub role: Option<Role>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Minimal identity of an order party (buyer or seller) embedded in order
/// responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_without_password_field() {
        let user = User {
            id: UserId::generate(),
            email: Email::parse("a@b.com").expect("valid"),
            name: "Ada".to_owned(),
            role: Some(Role::Buyer),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("password"));
        assert!(json.contains("\"role\":\"BUYER\""));
    }
}
