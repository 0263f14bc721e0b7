//! JWT issuing and verification.
//!
//! Access and refresh tokens are signed with separate secrets so a leaked
//! access token can never be replayed against the refresh endpoint. Each
//! token carries a `token_type` claim that is checked on verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopmate_core::UserId;

/// Access tokens are short-lived; the cookie is refreshed via the refresh
/// token when it expires.
const ACCESS_LIFETIME: Duration = Duration::minutes(15);
const REFRESH_LIFETIME: Duration = Duration::days(7);

/// Which of the two token families a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: UserId,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Token family tag, checked on verification.
    pub token_type: TokenType,
}

/// Token errors. Deliberately coarse: callers only need to know the token
/// is unusable, not why.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("invalid or expired token")]
    Invalid,
}

/// Signs and verifies access/refresh token pairs.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenIssuer {
    /// Build an issuer from the two raw secrets.
    #[must_use]
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
        }
    }

    /// Issue a short-lived access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_access(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue(user_id, TokenType::Access, ACCESS_LIFETIME, &self.access_encoding)
    }

    /// Issue a long-lived refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_refresh(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue(
            user_id,
            TokenType::Refresh,
            REFRESH_LIFETIME,
            &self.refresh_encoding,
        )
    }

    /// Verify an access token and return the user it identifies.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token is malformed, expired,
    /// signed with the wrong key, or is not an access token.
    pub fn verify_access(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify(token, TokenType::Access, &self.access_decoding)
    }

    /// Verify a refresh token and return the user it identifies.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` under the same conditions as
    /// [`Self::verify_access`].
    pub fn verify_refresh(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify(token, TokenType::Refresh, &self.refresh_decoding)
    }

    fn issue(
        &self,
        user_id: UserId,
        token_type: TokenType,
        lifetime: Duration,
        key: &EncodingKey,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            token_type,
        };

        encode(&Header::default(), &claims, key).map_err(TokenError::Signing)
    }

    fn verify(
        &self,
        token: &str,
        expected: TokenType,
        key: &DecodingKey,
    ) -> Result<UserId, TokenError> {
        let data = decode::<Claims>(token, key, &Validation::default())
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.token_type != expected {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"access-secret-for-tests", b"refresh-secret-for-tests")
    }

    #[test]
    fn access_token_round_trips() {
        let issuer = issuer();
        let user_id = UserId::generate();

        let token = issuer.issue_access(user_id).unwrap();
        let verified = issuer.verify_access(&token).unwrap();

        assert_eq!(verified, user_id);
    }

    #[test]
    fn refresh_token_rejected_as_access() {
        let issuer = issuer();
        let token = issuer.issue_refresh(UserId::generate()).unwrap();

        assert!(issuer.verify_access(&token).is_err());
    }

    #[test]
    fn access_token_rejected_as_refresh() {
        let issuer = issuer();
        let token = issuer.issue_access(UserId::generate()).unwrap();

        assert!(issuer.verify_refresh(&token).is_err());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        let issuer = issuer();
        let other = TokenIssuer::new(b"some-other-access-secret", b"some-other-refresh-secret");

        let token = other.issue_access(UserId::generate()).unwrap();
        assert!(issuer.verify_access(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = issuer();
        let user_id = UserId::generate();

        // Hand-roll a token that expired an hour ago.
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            token_type: TokenType::Access,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"access-secret-for-tests"),
        )
        .unwrap();

        assert!(issuer.verify_access(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(issuer().verify_access("not.a.jwt").is_err());
    }
}
