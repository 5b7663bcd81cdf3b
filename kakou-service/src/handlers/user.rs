use serde::Deserialize;
use serde_json::Value;
use service_core::{
    axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use utoipa::IntoParams;

use crate::{
    dtos::Listing,
    handlers::parse_id,
    models::UserFilter,
    services::UserService,
    utils::{JsonBody, PageRequest, QueryParams},
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UserListParams {
    /// 1-based page number (default 1).
    pub page: Option<String>,
    /// Page size (default 20).
    pub per_page: Option<String>,
    /// Substring of the username.
    pub q: Option<String>,
}

/// Get a user by id; banned users are not found
#[utoipa::path(
    get,
    path = "/user/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserView),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 405, description = "Scope admin required", body = ErrorResponse)
    ),
    tag = "User",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.get(parse_id(&id)?).await?;
    Ok(Json(user.view()))
}

/// List users, optionally filtered by username substring
#[utoipa::path(
    get,
    path = "/user",
    params(UserListParams),
    responses(
        (status = 200, description = "Page of users", body = UserListing),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 405, description = "Scope admin required", body = ErrorResponse)
    ),
    tag = "User",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageRequest::from_query(params.page.as_deref(), params.per_page.as_deref())?
        .within(state.config.max_per_page)?;
    let filter = UserFilter {
        username_contains: params.q,
    };

    let users = state.users.list(filter, page).await?;
    Ok(Json(Listing::from(users.map(|u| u.view()))))
}

/// Register a user; requested scopes are narrowed to the registered ones
#[utoipa::path(
    post,
    path = "/user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 405, description = "Scope admin required", body = ErrorResponse),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 422, description = "Missing field or duplicate username", body = ErrorResponse)
    ),
    tag = "User",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let req = UserService::create_request(body)?;
    let user = state.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

/// Update scope, password or banned flag
#[utoipa::path(
    put,
    path = "/user/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "Updated"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse),
        (status = 405, description = "Scope admin required", body = ErrorResponse),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 422, description = "Invalid field", body = ErrorResponse)
    ),
    tag = "User",
    security(("basic_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let req = UserService::update_request(body)?;
    state.users.update(id, req).await?;
    Ok(StatusCode::NO_CONTENT)
}
