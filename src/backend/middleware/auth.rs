/**
 * Identity Extraction
 *
 * Identity is issued elsewhere; this server only verifies it. A request
 * identifies its caller with, in order of preference:
 *
 * 1. `Authorization: Bearer <jwt>` - HS256, signed with `jwt_secret`,
 *    `sub` is the user id
 * 2. `?access_token=<jwt>` - same token, for browser WebSocket upgrades
 *    which cannot set headers
 * 3. `X-User-Id: <user id>` - only when `dev_auth_bypass` is enabled
 *
 * Anything else is rejected with 401.
 */

use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::room::validate_user_id;
use crate::shared::AppConfig;

/// Header accepted in place of a token when `dev_auth_bypass` is on
pub const DEV_USER_HEADER: &str = "x-user-id";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

/// The verified caller of a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity(pub String);

impl Identity {
    pub fn user_id(&self) -> &str {
        &self.0
    }
}

/// Sign a token for `user_id`. Issuance belongs to the identity provider;
/// this exists for local tooling and tests.
pub fn issue_token(secret: &str, user_id: &str, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verify and decode a JWT token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

/// Resolve the caller from request headers and query
pub fn identify(parts: &Parts, config: &AppConfig) -> Result<Identity, BackendError> {
    if let Some(token) = bearer_token(parts).or_else(|| query_token(parts)) {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| BackendError::unauthorized("token verification is not configured"))?;
        let claims = verify_token(secret, &token).map_err(|e| {
            tracing::warn!("[Auth] Rejected token: {}", e);
            BackendError::unauthorized("invalid or expired token")
        })?;
        validate_user_id("sub", &claims.sub).map_err(|_| BackendError::unauthorized("token subject is not a valid user id"))?;
        return Ok(Identity(claims.sub));
    }

    if config.dev_auth_bypass {
        if let Some(user_id) = parts.headers.get(DEV_USER_HEADER).and_then(|h| h.to_str().ok()) {
            validate_user_id(DEV_USER_HEADER, user_id)
                .map_err(|_| BackendError::unauthorized("X-User-Id is not a valid user id"))?;
            return Ok(Identity(user_id.to_string()));
        }
    }

    Err(BackendError::unauthorized("missing credentials"))
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn query_token(parts: &Parts) -> Option<String> {
    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut params)| params.remove("access_token"))
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        identify(parts, &state.config)
    }
}
