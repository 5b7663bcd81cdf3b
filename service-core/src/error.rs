use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable description of a single invalid request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub resource: String,
    pub field: String,
    pub code: String,
}

impl FieldError {
    pub fn new(resource: &str, field: &str, code: &str) -> Self {
        Self {
            resource: resource.to_string(),
            field: field.to_string(),
            code: code.to_string(),
        }
    }

    pub fn missing(resource: &str, field: &str) -> Self {
        Self::new(resource, field, "missing_field")
    }

    pub fn invalid(resource: &str, field: &str) -> Self {
        Self::new(resource, field, "invalid")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.resource, self.field, self.code)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldError),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Unsupported media type")]
    UnsupportedMediaType,

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(anyhow::Error),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Client address denied: {0}")]
    AddressDenied(String),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

/// JSON error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ErrorBody {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
            status: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut retry_after = None;
        let mut challenge = false;

        let (status, body) = match self {
            AppError::Validation(field) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    message: "Validation Failed".to_string(),
                    errors: Some(field),
                    status: None,
                },
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, ErrorBody::message(err.to_string())),
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                ErrorBody::message("Problems parsing JSON"),
            ),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, ErrorBody::message(err.to_string())),
            AppError::Unauthorized(err) => {
                challenge = true;
                (StatusCode::UNAUTHORIZED, ErrorBody::message(err.to_string()))
            }
            AppError::InvalidToken(err) => {
                tracing::debug!(error = %err, "Rejected bearer token");
                challenge = true;
                (StatusCode::UNAUTHORIZED, ErrorBody::message("Invalid token"))
            }
            AppError::PermissionDenied(err) => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody::message(err.to_string()),
            ),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorBody::message("Method Not Allowed"),
            ),
            AppError::AddressDenied(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    message: msg,
                    errors: None,
                    status: Some("403.6".to_string()),
                },
            ),
            AppError::Conflict(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody::message(err.to_string()),
            ),
            AppError::TooManyRequests(msg, retry) => {
                retry_after = retry;
                (StatusCode::TOO_MANY_REQUESTS, ErrorBody::message(msg))
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Internal server error"),
                )
            }
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::message("Service unavailable"),
            ),
            AppError::DatabaseError(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Database error"),
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = %err, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("Configuration error"),
                )
            }
        };

        let mut res = (status, Json(body)).into_response();

        if let Some(retry) = retry_after {
            res.headers_mut().insert(header::RETRY_AFTER, retry.into());
        }
        if challenge {
            res.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"Authentication Required\""),
            );
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_carries_field_details() {
        let res = AppError::Validation(FieldError::missing("user", "username")).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(res).await;
        assert_eq!(body["message"], "Validation Failed");
        assert_eq!(body["errors"]["resource"], "user");
        assert_eq!(body["errors"]["field"], "username");
        assert_eq!(body["errors"]["code"], "missing_field");
    }

    #[tokio::test]
    async fn unrouted_method_has_its_own_message() {
        let res = AppError::MethodNotAllowed.into_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

        let body = body_json(res).await;
        assert_eq!(body["message"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn permission_denied_maps_to_method_not_allowed() {
        let res = AppError::PermissionDenied(anyhow::anyhow!("scope required")).into_response();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_json(res).await["message"].is_string());
    }

    #[tokio::test]
    async fn unauthorized_sets_basic_challenge() {
        let res = AppError::Unauthorized(anyhow::anyhow!("nope")).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn address_denied_reports_sub_status() {
        let res = AppError::AddressDenied("denied".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(res).await["status"], "403.6");
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let res = AppError::DatabaseError(anyhow::anyhow!("connection refused")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(res).await["message"], "Database error");
    }

    #[tokio::test]
    async fn too_many_requests_sets_retry_after() {
        let res = AppError::TooManyRequests("slow down".to_string(), Some(12)).into_response();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "12");
    }
}
