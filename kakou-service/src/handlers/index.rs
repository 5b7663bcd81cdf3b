use service_core::axum::{
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    Json,
};

use crate::dtos::IndexResponse;

const INDEX_CACHE_CONTROL: &str = "public, max-age=60, s-maxage=60";

fn url_root(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{}://{}/", scheme, host)
}

/// URL templates for the API's resources
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Resource index", body = IndexResponse)),
    tag = "Index"
)]
pub async fn index(headers: HeaderMap) -> impl IntoResponse {
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static(INDEX_CACHE_CONTROL),
        )],
        Json(IndexResponse::new(&url_root(&headers))),
    )
}
