//! User model - API accounts with comma-delimited scopes and a ban flag.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::ScopeSet;
use crate::utils::time::format_timestamp;

/// User row. Accounts are never deleted; `banned = 1` takes their place.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub scope: String,
    pub date_created: NaiveDateTime,
    pub date_modified: NaiveDateTime,
    pub banned: i32,
}

impl User {
    pub fn is_banned(&self) -> bool {
        self.banned != 0
    }

    pub fn scopes(&self) -> ScopeSet {
        ScopeSet::parse(&self.scope)
    }

    /// Public representation, without the credential digest.
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            scope: self.scope.clone(),
            date_created: format_timestamp(&self.date_created),
            date_modified: format_timestamp(&self.date_modified),
            banned: self.banned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "admin,read")]
    pub scope: String,
    #[schema(example = "2017-03-09 07:05:01")]
    pub date_created: String,
    #[schema(example = "2017-03-09 07:05:01")]
    pub date_modified: String,
    pub banned: i32,
}

/// Values for a user insert; the scope has already been narrowed to known names.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub scope: ScopeSet,
    pub created: NaiveDateTime,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone)]
pub struct UserChanges {
    pub scope: Option<ScopeSet>,
    pub password_hash: Option<String>,
    pub banned: Option<i32>,
    pub modified: NaiveDateTime,
}

/// Listing filter over users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Literal substring of the username.
    pub username_contains: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(required, length(min = 1))]
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[validate(required, length(min = 1))]
    pub password: Option<String>,
    #[validate(required, length(min = 1))]
    #[schema(example = "read,admin")]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "read")]
    pub scope: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
    #[validate(range(min = 0, max = 1))]
    pub banned: Option<i32>,
}
