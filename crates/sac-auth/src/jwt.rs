//! Session token (JWT) handling

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token issuer
pub const ISSUER: &str = "sac-platform";

/// Token audience
pub const AUDIENCE: &str = "sac-web";

/// Claims carried by a session token
///
/// `sub` is the account username. Scope claims (`club_id` for leads,
/// `assigned_clubs` for faculty) are stamped at login; a promotion or
/// reassignment takes effect at the next login, bounded by the token TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject (account username)
    pub sub: String,
    /// Account role at issue time (student, lead, faculty, admin)
    pub role: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Club run by this lead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub club_id: Option<String>,
    /// Clubs assigned to this faculty member
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_clubs: Option<Vec<String>>,
    /// Set on tokens issued through a lead's proxy session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<bool>,
    /// Lead that delegated this proxy token; links it back to the principal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delegator: Option<String>,
}

impl SessionClaims {
    pub fn new(username: String, role: String, validity: Duration) -> Self {
        let now = Utc::now();
        let exp = now + validity;

        Self {
            sub: username,
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: ISSUER.to_string(),
            aud: AUDIENCE.to_string(),
            club_id: None,
            assigned_clubs: None,
            proxy: None,
            delegator: None,
        }
    }

    pub fn with_club_id(mut self, club_id: String) -> Self {
        self.club_id = Some(club_id);
        self
    }

    pub fn with_assigned_clubs(mut self, clubs: Vec<String>) -> Self {
        self.assigned_clubs = if clubs.is_empty() { None } else { Some(clubs) };
        self
    }

    /// Build the proxy token a lead uses to act as their own student identity.
    ///
    /// The proxy token is scoped down to the student role and carries the
    /// delegating lead in `delegator`; exiting proxy mode re-issues a plain
    /// lead token and is the only path back.
    pub fn proxy_for(delegator: &SessionClaims, validity: Duration) -> Self {
        let mut claims = Self::new(delegator.sub.clone(), "student".to_string(), validity);
        claims.proxy = Some(true);
        claims.delegator = Some(delegator.sub.clone());
        claims
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy.unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// Session token errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Token encoding error: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,
}

/// Session token validator (HMAC-SHA256)
///
/// Validates the signature, expiration, issuer, and audience. Expired tokens
/// are rejected outright; there is no partial trust past expiry.
pub struct SessionValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionValidator {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_issuer(&[ISSUER]);
        validation.set_audience(&[AUDIENCE]);

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                    _ => SessionError::InvalidToken,
                }
            })?;

        if token_data.claims.is_expired() {
            return Err(SessionError::TokenExpired);
        }

        Ok(token_data.claims)
    }

    /// Encode claims with the shared HMAC secret
    pub fn encode(secret: &[u8], claims: &SessionClaims) -> Result<String, SessionError> {
        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(secret);

        Ok(encode(&header, claims, &encoding_key)?)
    }
}
