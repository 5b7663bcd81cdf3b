use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// Query string extractor that reports unreadable parameters as a 400 in
/// the service error shape.
pub struct QueryParams<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Problems parsing query: {}",
                    rejection.body_text()
                ))
            })?;
        Ok(QueryParams(value))
    }
}
