use serde::Deserialize;
use service_core::{
    axum::{
        extract::{Path, State},
        response::IntoResponse,
        Json,
    },
    error::AppError,
};
use utoipa::IntoParams;

use crate::{
    dtos::{Listing, MaxIdResponse},
    handlers::parse_id,
    services::CrossingQuery,
    utils::QueryParams,
    AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CrossingListParams {
    /// JSON object with optional `page`, `per_page`, `startid` and `endid`.
    #[param(example = r#"{"startid": 100, "endid": 200, "page": 1, "per_page": 20}"#)]
    pub q: Option<String>,
}

/// All checkpoints
#[utoipa::path(
    get,
    path = "/kkdd",
    responses(
        (status = 200, description = "Checkpoints", body = CheckpointListing),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse)
    ),
    tag = "Kakou"
)]
pub async fn list_checkpoints(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let checkpoints = state.kakou.checkpoints().await?;
    Ok(Json(Listing::all(
        checkpoints.iter().map(|c| c.view()).collect(),
    )))
}

/// One enriched crossing record
#[utoipa::path(
    get,
    path = "/kakou/{id}",
    params(("id" = i64, Path, description = "Crossing record id")),
    responses(
        (status = 200, description = "Crossing record", body = CrossingView),
        (status = 404, description = "No such record", body = ErrorResponse)
    ),
    tag = "Kakou"
)]
pub async fn get_crossing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.kakou.crossing(parse_id(&id)?).await?;
    Ok(Json(record))
}

/// Page of enriched crossing records within an id range
#[utoipa::path(
    get,
    path = "/kakou",
    params(CrossingListParams),
    responses(
        (status = 200, description = "Page of crossing records", body = CrossingListing),
        (status = 400, description = "Missing or malformed q", body = ErrorResponse)
    ),
    tag = "Kakou"
)]
pub async fn list_crossings(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<CrossingListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = CrossingQuery::parse(params.q.as_deref(), state.config.max_per_page)?;
    let page = state.kakou.crossings(query).await?;
    Ok(Json(Listing::from(page)))
}

/// Highest crossing record id
#[utoipa::path(
    get,
    path = "/kakou/maxid",
    responses((status = 200, description = "Highest id, null when empty", body = MaxIdResponse)),
    tag = "Kakou"
)]
pub async fn max_crossing_id(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let maxid = state.kakou.max_id().await?;
    Ok(Json(MaxIdResponse { maxid }))
}
