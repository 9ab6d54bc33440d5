// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 PassOwl

//! Bearer token issuance and verification.
//!
//! PassOwl issues its own HS256-signed JWTs at login and verifies them on
//! every request with the same secret. The validity window is fixed at
//! issuance (default 30 minutes); expiry forces a fresh login.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::config;

use super::claims::TokenClaims;
use super::error::AuthError;
use super::roles::Role;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Signs and verifies PassOwl bearer tokens.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenSigner {
    /// Create a signer from an explicit secret and TTL.
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Create a signer from `TOKEN_SECRET` / `TOKEN_TTL_MINUTES`.
    ///
    /// Falls back to the development secret when unset, with a loud warning.
    pub fn from_env() -> Self {
        let secret = match std::env::var(config::TOKEN_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!(
                    "{} is not set; using the development signing secret",
                    config::TOKEN_SECRET_ENV
                );
                config::DEV_TOKEN_SECRET.to_string()
            }
        };
        let ttl_minutes = std::env::var(config::TOKEN_TTL_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(config::DEFAULT_TOKEN_TTL_MINUTES);

        Self::new(&secret, ttl_minutes)
    }

    /// Token validity window in minutes.
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    /// Issue a token for `username` carrying the given role set.
    pub fn issue(&self, username: &str, roles: &[Role]) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: username.to_string(),
            roles: roles.to_vec(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.ttl_minutes)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    /// Verify a token's signature and validity window and return its claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        Ok(token_data.claims)
    }
}
