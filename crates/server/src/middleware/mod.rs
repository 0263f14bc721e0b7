//! Request middleware and extractors.

pub mod auth;

pub use auth::{ACCESS_COOKIE, REFRESH_COOKIE, RequireAuth, RequireBuyer, RequireSeller};
