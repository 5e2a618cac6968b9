/*!
 * # Authentication and Authorization Module
 *
 * Bearer tokens are HS256 JWTs carrying the user id and a single role.
 * Sessions are issued elsewhere; this service only validates them, plus an
 * `issue_token` helper for operators and tests.
 *
 * Authorization is category based, see [`permissions`].
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::{config::AppConfig, errors::ServiceError};

pub mod permissions;

pub use permissions::PermissionTable;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (user ID)
    pub role: String, // Single role looked up in the permission table
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller extracted from the bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub role: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| {
                ServiceError::Unauthorized(permissions::UNAUTHENTICATED_MESSAGE.to_string())
            })
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl: Duration,
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_issuer: cfg.jwt_issuer.clone(),
            jwt_audience: cfg.jwt_audience.clone(),
            token_ttl: Duration::from_secs(cfg.jwt_expiration_secs),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed authorization header")]
    MalformedHeader,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenCreation(msg) => ServiceError::InternalError(msg),
            _ => ServiceError::Unauthorized(
                "โทเค็นไม่ถูกต้องหรือหมดอายุ กรุณาเข้าสู่ระบบใหม่".to_string(),
            ),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

/// Validates and issues bearer tokens
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    pub fn issue_token(&self, user_id: &str, role: &str) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
            iat: now,
            exp: now + self.config.token_ttl.as_secs() as i64,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }

    /// `Ok(None)` when no Authorization header is present.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AuthUser>, AuthError> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;
        let claims = self.validate_token(token)?;
        Ok(Some(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        }))
    }
}

/// Attaches the [`AuthUser`] to the request when a valid bearer token is sent.
///
/// Anonymous requests pass through and are rejected later by the category
/// check; a bad token is rejected here.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth_service.authenticate(request.headers()) {
        Ok(Some(user)) => {
            debug!(user_id = %user.user_id, role = %user.role, "Authenticated request");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// State for [`category_middleware`]
#[derive(Clone)]
pub struct CategoryGate {
    pub table: Arc<PermissionTable>,
    pub required: &'static [&'static str],
}

/// Rejects the request unless the caller's role grants one of the required tags.
pub async fn category_middleware(
    State(gate): State<CategoryGate>,
    request: Request,
    next: Next,
) -> Response {
    let role = request.extensions().get::<AuthUser>().map(|u| u.role.clone());
    match gate.table.check_categories(role.as_deref(), gate.required) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self, auth_service: Arc<AuthService>) -> Self;
    fn with_categories(self, table: Arc<PermissionTable>, required: &'static [&'static str]) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self, auth_service: Arc<AuthService>) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            auth_service,
            auth_middleware,
        ))
    }

    fn with_categories(self, table: Arc<PermissionTable>, required: &'static [&'static str]) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            CategoryGate { table, required },
            category_middleware,
        ))
    }
}
