//! Authentication middleware and extractors.
//!
//! Handlers declare their auth requirement by taking one of these extractors
//! as an argument. `RequireAuth` resolves the access-token cookie to a live
//! user row; `RequireBuyer`/`RequireSeller` additionally gate on the user's
//! marketplace role. Ownership checks stay inline in the handlers.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use shopmate_core::Role;

use crate::db::users::UserRepository;
use crate::error::set_sentry_user;
use crate::models::User;
use crate::state::AppState;

/// Name of the access-token cookie.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Name of the refresh-token cookie.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Extractor that requires a valid access-token cookie.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Extractor that requires an authenticated user with the seller role.
pub struct RequireSeller(pub User);

/// Extractor that requires an authenticated user with the buyer role.
pub struct RequireBuyer(pub User);

/// Rejection for the auth extractors.
pub enum AuthRejection {
    /// Missing, invalid, or expired token.
    Unauthenticated,
    /// The token's user no longer exists.
    UserGone,
    /// Authenticated, but the role doesn't permit this route.
    WrongRole(Role),
    /// Database failure while resolving the user.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            Self::UserGone => (
                StatusCode::NOT_FOUND,
                "The user belonging to this token no longer exists".to_string(),
            ),
            Self::WrongRole(role) => (
                StatusCode::FORBIDDEN,
                format!("This action requires the {role} role"),
            ),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({"success": false, "message": message}))).into_response()
    }
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(AuthRejection::Unauthenticated)?;

        let user_id = state
            .tokens()
            .verify_access(&token)
            .map_err(|_| AuthRejection::Unauthenticated)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to resolve authenticated user");
                AuthRejection::Internal
            })?
            .ok_or(AuthRejection::UserGone)?;

        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if user.role != Some(Role::Seller) {
            return Err(AuthRejection::WrongRole(Role::Seller));
        }
        Ok(Self(user))
    }
}

impl FromRequestParts<AppState> for RequireBuyer {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if user.role != Some(Role::Buyer) {
            return Err(AuthRejection::WrongRole(Role::Buyer));
        }
        Ok(Self(user))
    }
}
