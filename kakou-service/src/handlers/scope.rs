use service_core::{
    axum::{extract::State, response::IntoResponse, Json},
    error::AppError,
};

use crate::{dtos::Listing, AppState};

/// Every registered scope
#[utoipa::path(
    get,
    path = "/scope",
    responses(
        (status = 200, description = "All scopes", body = ScopeListing),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 405, description = "Scope admin required", body = ErrorResponse)
    ),
    tag = "Scope",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_scopes(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let scopes = state.users.list_scopes().await?;
    Ok(Json(Listing::all(scopes.iter().map(|s| s.view()).collect())))
}
