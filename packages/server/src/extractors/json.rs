use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Input checks run before any store is touched.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// A JSON body that deserialized and passed [`Validate`].
///
/// Both malformed JSON and failed checks become `AppError::Validation`, so
/// clients always receive a structured error body.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(AppJson(value))
    }
}
