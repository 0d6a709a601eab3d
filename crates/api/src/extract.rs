//! Body and query extractors that report malformed input in the API's
//! JSON error shape.
//!
//! Axum's own `Json` and `Query` reject with plain-text bodies. These
//! wrappers turn every rejection into a `VALIDATION_ERROR`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use procura_core::error::CoreError;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| invalid("request body", rejection.body_text()))?;
        Ok(AppJson(value))
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| {
                invalid("query string", rejection.body_text())
            })?;
        Ok(AppQuery(value))
    }
}

fn invalid(source: &str, detail: String) -> AppError {
    tracing::debug!(source, detail = %detail, "Rejected malformed input");
    AppError::Core(CoreError::Validation(format!("Invalid {source}: {detail}")))
}
