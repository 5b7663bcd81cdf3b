use service_core::{
    axum::{
        extract::{Request, State},
        middleware::Next,
        response::Response,
    },
    error::AppError,
};

use crate::middleware::AuthenticatedUser;
use crate::services::policy::authorize;

/// Require `scope` (or `all`) on the caller; runs after [`super::auth_middleware`].
pub async fn require_scope(
    State(scope): State<&'static str>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.extensions().get::<AuthenticatedUser>().ok_or_else(|| {
        AppError::InternalError(anyhow::anyhow!(
            "Authenticated user missing from request extensions"
        ))
    })?;

    if !authorize(&user.scopes, scope) {
        tracing::warn!(
            user_id = user.id,
            required_scope = %scope,
            granted_scopes = %user.scopes,
            "Insufficient scope"
        );
        return Err(AppError::PermissionDenied(anyhow::anyhow!(
            "Insufficient scope. Required: {}",
            scope
        )));
    }

    Ok(next.run(req).await)
}
