//! User roles.

use serde::{Deserialize, Serialize};

/// The capability role a user picks after signup.
///
/// Buyers place orders; sellers own businesses, manage products, and fulfill
/// orders. A freshly signed-up user has no role yet (stored as NULL), which
/// grants neither capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Permitted to create orders and browse the catalog.
    Buyer,
    /// Permitted to own businesses, manage products, and fulfill orders.
    Seller,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buyer => write!(f, "BUYER"),
            Self::Seller => write!(f, "SELLER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUYER" => Ok(Self::Buyer),
            "SELLER" => Ok(Self::Seller),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        assert_eq!(Role::Buyer.to_string(), "BUYER");
        assert_eq!("SELLER".parse::<Role>(), Ok(Role::Seller));
        assert!("ADMIN".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Seller).expect("serialize"),
            "\"SELLER\""
        );
        let role: Role = serde_json::from_str("\"BUYER\"").expect("deserialize");
        assert_eq!(role, Role::Buyer);
    }
}
