//! Caller identity from bearer tokens.
//!
//! The identity provider issues JWTs; a gateway in front of this service
//! verifies their signatures. [`ClaimsTokenValidator`] decodes the claims
//! with `jsonwebtoken` and enforces what the gateway does not: a subject
//! is present, the token is unexpired and (optionally) it comes from the
//! expected issuer.

use async_trait::async_trait;
use bookshop_core::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

/// Upper bound on tolerated clock skew.
const MAX_LEEWAY_SECS: u64 = 3600;

/// Who is calling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject claim
    pub user_id: UserId,
    /// Realm roles granted by the identity provider
    pub roles: Vec<String>,
    /// Token expiry
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    /// Whether the caller holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|granted| granted == role)
    }
}

/// Why a token was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Not a decodable JWT
    #[error("malformed token: {0}")]
    Malformed(String),

    /// No `sub` claim
    #[error("token has no subject")]
    MissingSubject,

    /// `exp` is in the past
    #[error("token expired")]
    Expired,

    /// `iss` does not match the configured issuer
    #[error("unexpected token issuer")]
    WrongIssuer,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidIssuer => Self::WrongIssuer,
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => Self::MissingSubject,
            ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => Self::WrongIssuer,
            _ => Self::Malformed(error.to_string()),
        }
    }
}

/// Turns a bearer token into an [`Identity`].
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Validate `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the token must not be trusted.
    async fn validate(&self, token: &str) -> Result<Identity, AuthError>;
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    exp: i64,
    #[serde(default)]
    realm_access: RealmAccess,
}

#[derive(Debug, Default, Deserialize)]
struct RealmAccess {
    #[serde(default)]
    roles: Vec<String>,
}

/// Claims-checking validator for gateway-verified JWTs.
#[derive(Clone)]
pub struct ClaimsTokenValidator {
    validation: Validation,
    key: DecodingKey,
}

impl ClaimsTokenValidator {
    /// Create a validator tolerating `leeway_secs` (at most an hour) of clock skew on `exp`.
    #[must_use]
    pub fn new(issuer: Option<&str>, leeway_secs: u64) -> Self {
        let mut validation = Validation::default();
        // Signatures are checked upstream.
        validation.insecure_disable_signature_validation();
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation.validate_aud = false;
        validation.leeway = leeway_secs.min(MAX_LEEWAY_SECS);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            validation,
            key: DecodingKey::from_secret(&[]),
        }
    }
}

#[async_trait]
impl TokenValidator for ClaimsTokenValidator {
    async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?.claims;

        if claims.sub.trim().is_empty() {
            return Err(AuthError::MissingSubject);
        }
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::Malformed("exp out of range".to_string()))?;

        Ok(Identity {
            user_id: UserId::new(claims.sub),
            roles: claims.realm_access.roles,
            expires_at,
        })
    }
}
