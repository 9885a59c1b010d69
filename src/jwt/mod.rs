//! JWT token handling
//!
//! Tokens are issued by the account service; this crate only verifies
//! them and turns the claims into an [`Actor`]. Issuance exists for
//! tests and operational tooling.

use crate::config::JwtConfig;
use crate::domain::{Actor, Role};
use crate::error::{AppError, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (customer or admin account id)
    pub sub: String,
    pub email: String,
    /// "customer" or "admin"
    pub role: String,
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

/// JWT token manager
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Validation with a strict leeway (5 seconds) instead of the default
    /// 60 seconds. Tokens expire promptly while tolerating minor clock skew.
    fn strict_validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 5;
        v.set_issuer(&[&self.config.issuer]);
        v
    }

    /// Create an access token for the given actor
    pub fn create_access_token(&self, actor: &Actor, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: actor.id.to_string(),
            email: actor.email.clone(),
            role: actor.role.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(e.into()))
    }

    /// Verify an access token and extract the calling actor
    pub fn verify_access_token(&self, token: &str) -> Result<Actor> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.strict_validation())
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        let claims = data.claims;
        let id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid subject claim".to_string()))?;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid role claim".to_string()))?;

        Ok(Actor {
            id,
            email: claims.email,
            role,
        })
    }
}
