//! HTTP handlers for kakou-service.

pub mod health;
pub mod index;
pub mod kakou;
pub mod metrics;
pub mod scope;
pub mod token;
pub mod user;

use service_core::error::AppError;

/// Parse an integer path segment; anything else addresses no resource.
pub(crate) fn parse_id<T: std::str::FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(anyhow::anyhow!("Not Found")))
}

/// Fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not Found"))
}

/// Fallback for a routed path reached with a method it does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
