use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{dtos::TokenResponse, middleware::AuthUser, AppState};

/// Exchange Basic credentials (or a live token) for a bearer token
#[utoipa::path(
    post,
    path = "/token",
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn issue_token(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = user.0;
    let jwt = state.authenticator.jwt();
    let token = jwt.generate_access_token(user.id, &user.username)?;

    tracing::info!(user_id = user.id, "Access token issued");
    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: jwt.expiry_seconds(),
        }),
    ))
}
