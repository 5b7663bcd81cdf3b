use service_core::{
    axum::{
        extract::{FromRequestParts, Request, State},
        http::{header, request::Parts},
        middleware::Next,
        response::Response,
    },
    error::AppError,
};

use crate::{models::ScopeSet, AppState};

/// The caller resolved by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub scopes: ScopeSet,
}

/// Require Basic or Bearer credentials belonging to a non-banned user.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = state.authenticator.authenticate(header).await?;

    tracing::debug!(user_id = user.id, "Request authenticated");
    req.extensions_mut().insert(AuthenticatedUser {
        id: user.id,
        scopes: user.scopes(),
        username: user.username,
    });

    Ok(next.run(req).await)
}

/// Extractor for the authenticated caller in handlers.
pub struct AuthUser(pub AuthenticatedUser);

#[service_core::axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthenticatedUser>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Authenticated user missing from request extensions"
            ))
        })?;

        Ok(AuthUser(user.clone()))
    }
}
