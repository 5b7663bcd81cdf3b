use service_core::error::{AppError, FieldError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Record not found")]
    CrossingNotFound,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Validation failed: {0}")]
    Validation(FieldError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::MissingCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Authentication required"))
            }
            ServiceError::UsernameTaken => {
                AppError::Conflict(anyhow::anyhow!("Username already exists"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("Not Found")),
            ServiceError::CrossingNotFound => AppError::NotFound(anyhow::anyhow!("Not Found")),
            ServiceError::InvalidFilter(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Validation(field) => AppError::Validation(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_failures_are_unauthorized() {
        assert!(matches!(
            AppError::from(ServiceError::InvalidCredentials),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            AppError::from(ServiceError::MissingCredentials),
            AppError::Unauthorized(_)
        ));
    }

    #[test]
    fn duplicate_username_is_conflict() {
        assert!(matches!(
            AppError::from(ServiceError::UsernameTaken),
            AppError::Conflict(_)
        ));
    }
}
