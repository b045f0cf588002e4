use std::fmt;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::utils::jwt;

/// Who is making a request. Passed explicitly into every coordinator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
        }
    }
}

/// The raw bearer credential the identity was derived from.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Verifies the caller of a request.
#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// Returns the caller's identity, or `TokenMissing`/`TokenInvalid`.
    async fn authenticate(&self, headers: &HeaderMap) -> Result<(Identity, Credential), AppError>;
}

/// Accepts `Authorization: Bearer <jwt>` signed with the configured HS256 secret.
pub struct JwtIdentityGate {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityGate {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityGate for JwtIdentityGate {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<(Identity, Credential), AppError> {
        let token = bearer_token(headers)?;

        let claims = jwt::verify(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {e}");
            AppError::TokenInvalid
        })?;
        if claims.sub.trim().is_empty() {
            return Err(AppError::TokenInvalid);
        }

        Ok((Identity::new(claims.sub), Credential(token.to_owned())))
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::TokenInvalid)
}
