use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller, resolved through the configured identity gate.
///
/// Add this as a handler parameter to require authentication. Ownership is
/// checked by the coordinator against the target project. The raw bearer
/// credential is dropped here; handlers only see the identity.
pub struct AuthUser {
    pub identity: Identity,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let (identity, _credential) = state.identity.authenticate(&parts.headers).await?;
        Ok(AuthUser { identity })
    }
}
