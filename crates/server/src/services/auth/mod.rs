//! Authentication service.
//!
//! Password signup/login plus role selection. Token issuing lives in
//! [`tokens`]; cookie handling lives in the route layer.

mod error;
pub mod tokens;

pub use error::AuthError;
pub use tokens::{TokenError, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use shopmate_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;
/// Minimum display-name length after trimming.
const MIN_NAME_LENGTH: usize = 2;

/// Authentication service.
///
/// Handles user registration, login, and role selection.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email, password, and display name.
    ///
    /// The new user has no role yet; they pick buyer or seller afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` or `AuthError::InvalidName` if those
    /// fields fail validation.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let name = validate_name(name)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(&email, &password_hash, name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Set or change a user's marketplace role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository(RepositoryError::NotFound)` if the user
    /// no longer exists.
    pub async fn choose_role(&self, user_id: UserId, role: Role) -> Result<User, AuthError> {
        let user = self.users.set_role(user_id, role).await?;
        Ok(user)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<&str, AuthError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return Err(AuthError::InvalidName(format!(
            "Name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed)
}

/// Hash a password with Argon2 and a fresh random salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hash).is_ok());
        assert!(verify_password("hunter3!", &hash).is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn short_password_rejected() {
        assert!(matches!(
            validate_password("12345"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn name_is_trimmed_and_length_checked() {
        assert_eq!(validate_name("  Ada  ").unwrap(), "Ada");
        assert!(matches!(
            validate_name("   a   "),
            Err(AuthError::InvalidName(_))
        ));
    }
}
