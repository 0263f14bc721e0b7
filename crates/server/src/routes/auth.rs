//! Authentication route handlers: signup, login, token refresh, logout,
//! role selection, and the current-user read.

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::instrument;

use shopmate_core::Role;

use crate::error::{AppError, Result};
use crate::middleware::{ACCESS_COOKIE, REFRESH_COOKIE, RequireAuth};
use crate::models::User;
use crate::response::{ApiResponse, Created};
use crate::services::AuthService;
use crate::state::AppState;

/// Matches the access-token lifetime in the token issuer.
const ACCESS_COOKIE_MAX_AGE: time::Duration = time::Duration::minutes(15);
/// Matches the refresh-token lifetime in the token issuer.
const REFRESH_COOKIE_MAX_AGE: time::Duration = time::Duration::days(7);

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Role selection request body.
#[derive(Debug, Deserialize)]
pub struct ChooseRoleBody {
    pub role: Role,
}

/// Register a new account. The user is logged in immediately; role selection
/// happens as a separate step.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .signup(&body.email, &body.password, &body.name)
        .await?;

    let jar = issue_cookies(jar, &state, &user)?;
    Ok((jar, Created(ApiResponse::with_message("account created", user))))
}

/// Log in with email and password. Sets both auth cookies on success.
#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    let jar = issue_cookies(jar, &state, &user)?;
    Ok((jar, ApiResponse::data(user)))
}

/// Mint a fresh access cookie from the refresh cookie.
#[instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Result<impl IntoResponse> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_owned())
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token".to_owned()))?;

    let user_id = state
        .tokens()
        .verify_refresh(&token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".to_owned()))?;

    let access = state
        .tokens()
        .issue_access(user_id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let jar = jar.add(auth_cookie(
        ACCESS_COOKIE,
        access,
        ACCESS_COOKIE_MAX_AGE,
        state.config().cookie_secure,
    ));

    Ok((jar, ApiResponse::message("token refreshed")))
}

/// Log out by clearing both cookies. Always succeeds; tokens themselves are
/// not revocable.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let secure = state.config().cookie_secure;
    let jar = jar
        .add(expired_cookie(ACCESS_COOKIE, secure))
        .add(expired_cookie(REFRESH_COOKIE, secure));

    (jar, ApiResponse::message("logged out"))
}

/// Pick (or change) the caller's marketplace role.
#[instrument(skip(state, user), fields(user_id = %user.id, role = %body.role))]
pub async fn choose_role(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ChooseRoleBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .choose_role(user.id, body.role)
        .await?;

    Ok(ApiResponse::data(user))
}

/// The authenticated user's own record.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn me(RequireAuth(user): RequireAuth) -> ApiResponse<User> {
    ApiResponse::data(user)
}

/// Issue both auth cookies for a user.
fn issue_cookies(jar: CookieJar, state: &AppState, user: &User) -> Result<CookieJar> {
    let access = state
        .tokens()
        .issue_access(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let refresh = state
        .tokens()
        .issue_refresh(user.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let secure = state.config().cookie_secure;
    Ok(jar
        .add(auth_cookie(ACCESS_COOKIE, access, ACCESS_COOKIE_MAX_AGE, secure))
        .add(auth_cookie(
            REFRESH_COOKIE,
            refresh,
            REFRESH_COOKIE_MAX_AGE,
            secure,
        )))
}

/// Build an http-only auth cookie.
fn auth_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Build a cookie that immediately expires its namesake.
fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookies_are_http_only_and_lax() {
        let cookie = auth_cookie(ACCESS_COOKIE, "tok".to_owned(), ACCESS_COOKIE_MAX_AGE, true);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(ACCESS_COOKIE_MAX_AGE));
    }

    #[test]
    fn expired_cookie_clears_value() {
        let cookie = expired_cookie(REFRESH_COOKIE, false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
