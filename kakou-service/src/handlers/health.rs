use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{dtos::HealthResponse, AppState};

/// Liveness plus reachability of both databases and the verification cache
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if let Err(e) = state.accounts.health_check().await {
        tracing::error!(error = %e, "Account database health check failed");
        return Err(AppError::ServiceUnavailable);
    }
    if let Err(e) = state.kakou_store.health_check().await {
        tracing::error!(error = %e, "Kakou database health check failed");
        return Err(AppError::ServiceUnavailable);
    }
    if let Err(e) = state.cache.health_check().await {
        tracing::error!(error = %e, "Verification cache health check failed");
        return Err(AppError::ServiceUnavailable);
    }

    Ok((
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".to_string(),
            service: state.config.service_name.clone(),
            version: state.config.service_version.clone(),
        }),
    ))
}
