//! Persistence seams. PostgreSQL implements these in production; tests swap in
//! an in-memory store.
//!
//! Listing operations return a [`Page`] whose `total` counts every row matching
//! the filter, independent of the requested window.

use async_trait::async_trait;
use service_core::error::AppError;

use crate::models::{
    Checkpoint, CrossingRecord, IdRange, NewUser, Scope, User, UserChanges, UserFilter,
};
use crate::utils::{Page, PageRequest};

/// Users and scopes (the service's own database).
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError>;

    /// Exact, case-sensitive name match. The active holder of the name wins;
    /// otherwise the most recent banned account is returned.
    async fn find_user_by_name(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, AppError>;

    /// Insert a user; a name held by an active user fails with [`AppError::Conflict`].
    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError>;

    /// Apply a partial update; returns `false` when no such user exists.
    /// Unbanning while another active user holds the name is a [`AppError::Conflict`].
    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<bool, AppError>;

    async fn list_scopes(&self) -> Result<Vec<Scope>, AppError>;
}

/// Checkpoints and crossing records (the kakou database, read-only).
#[async_trait]
pub trait KakouStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    async fn list_checkpoints(&self) -> Result<Vec<Checkpoint>, AppError>;

    async fn find_crossing(&self, id: i64) -> Result<Option<CrossingRecord>, AppError>;

    async fn list_crossings(&self, range: IdRange, page: PageRequest) -> Result<Page<CrossingRecord>, AppError>;

    async fn max_crossing_id(&self) -> Result<Option<i64>, AppError>;
}
