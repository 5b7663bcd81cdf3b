use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CheckpointView, CrossingView, ScopeView, UserView};
use crate::utils::Page;

/// Error body as rendered by `AppError`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Validation Failed")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrorDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "403.6")]
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldErrorDoc {
    #[schema(example = "user")]
    pub resource: String,
    #[schema(example = "username")]
    pub field: String,
    #[schema(example = "missing_field")]
    pub code: String,
}

/// Paged collection: `total_count` counts every matching row, not just `items`.
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    UserListing = Listing<UserView>,
    ScopeListing = Listing<ScopeView>,
    CheckpointListing = Listing<CheckpointView>,
    CrossingListing = Listing<CrossingView>
)]
pub struct Listing<T> {
    pub total_count: i64,
    pub items: Vec<T>,
}

impl<T> Listing<T> {
    pub fn all(items: Vec<T>) -> Self {
        Self {
            total_count: items.len() as i64,
            items,
        }
    }
}

impl<T> From<Page<T>> for Listing<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            total_count: page.total,
            items: page.items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaxIdResponse {
    #[schema(example = 123456)]
    pub maxid: Option<i64>,
}

/// Entry points advertised at `/`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    pub user_url: String,
    pub scope_url: String,
    pub token_url: String,
    pub kkdd_url: String,
    pub kakou_url: String,
    pub kakou_list_url: String,
    pub maxid_url: String,
}

impl IndexResponse {
    pub fn new(root: &str) -> Self {
        Self {
            user_url: format!("{}user{{/user_id}}", root),
            scope_url: format!("{}scope", root),
            token_url: format!("{}token", root),
            kkdd_url: format!("{}kkdd", root),
            kakou_url: format!("{}kakou{{/id}}", root),
            kakou_list_url: format!("{}kakou?q={{}}", root),
            maxid_url: format!("{}kakou/maxid", root),
        }
    }
}
