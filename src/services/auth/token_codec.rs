use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::services::auth::role::Role;

/// Scheme every issued credential is prefixed with.
pub const BEARER_SCHEME: &str = "Bearer";

// Errors returned by token issuance and verification.
//
// The gate collapses all of these into a single 401; the distinction is kept
// for logs and tests only.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed bearer token")]
    Malformed,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("invalid claims: {0}")]
    InvalidClaims(&'static str),
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessTokenClaims {
    sub: String,
    email: String,
    #[serde(rename = "userRole")]
    role: Role,
    iat: i64,
    exp: i64,
}

/// Claims recovered from a token whose signature and expiry were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// HS256 signer/verifier for bearer credentials.
///
/// The secret is loaded once at startup and only ever read afterwards, so a
/// single instance is shared (behind `Arc`) by every request.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against the caller's clock, after the signature.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn issue(&self, user_id: i64, email: &str, role: Role) -> Result<String, TokenError> {
        self.issue_at(user_id, email, role, Utc::now())
    }

    /// Issue a `"Bearer <jwt>"` credential as if the clock read `now`.
    ///
    /// Output is a pure function of the secret, the arguments and `now`.
    pub fn issue_at(
        &self,
        user_id: i64,
        email: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if user_id < 1 {
            return Err(TokenError::InvalidClaims("user id must be >= 1"));
        }

        let iat = now.timestamp();
        let claims = AccessTokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            iat,
            exp: iat + self.ttl_seconds as i64,
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        let jwt = jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Signing(e)
        })?;

        Ok(format!("{BEARER_SCHEME} {jwt}"))
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a `"Bearer <jwt>"` credential against the clock reading `now`.
    ///
    /// Checks run in a fixed order: shape, signature, claim shape, expiry.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        self.verify_jwt_at(strip_scheme(token)?, now)
    }

    /// Verify a bare JWT, i.e. a payload already returned by `strip_scheme`.
    pub fn verify_jwt(&self, jwt: &str) -> Result<VerifiedToken, TokenError> {
        self.verify_jwt_at(jwt, Utc::now())
    }

    pub fn verify_jwt_at(&self, jwt: &str, now: DateTime<Utc>) -> Result<VerifiedToken, TokenError> {
        let claims = jsonwebtoken::decode::<AccessTokenClaims>(jwt, &self.decoding_key, &self.validation)
            .map_err(classify)?
            .claims;

        let user_id = claims
            .sub
            .parse::<i64>()
            .ok()
            .filter(|id| *id >= 1)
            .ok_or(TokenError::Malformed)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            user_id,
            email: claims.email,
            role: claims.role,
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }
}

/// Split `"Bearer <payload>"` and return the payload.
///
/// Anything other than exactly the scheme, one space and a non-empty,
/// whitespace-free payload is `Malformed`.
pub fn strip_scheme(header: &str) -> Result<&str, TokenError> {
    let payload = header
        .strip_prefix(BEARER_SCHEME)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or(TokenError::Malformed)?;

    if payload.is_empty() || payload.contains(char::is_whitespace) {
        return Err(TokenError::Malformed);
    }

    Ok(payload)
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
