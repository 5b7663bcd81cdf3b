//! User administration: registration, partial updates, lookups and listings.

use serde_json::Value;
use service_core::error::{AppError, FieldError};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::{
    CreateUserRequest, NewUser, Scope, ScopeSet, UpdateUserRequest, User, UserChanges, UserFilter,
};
use crate::services::error::ServiceError;
use crate::services::policy::assign_scopes;
use crate::services::store::AccountStore;
use crate::utils::time::LocalClock;
use crate::utils::{decode_fields, validate_fields, CredentialHasher, Page, PageRequest, Password};

const RESOURCE: &str = "user";
const CREATE_FIELDS: [&str; 3] = ["username", "password", "scope"];
const UPDATE_FIELDS: [&str; 3] = ["scope", "password", "banned"];

#[derive(Clone)]
pub struct UserService {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    clock: LocalClock,
}

impl UserService {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: CredentialHasher, clock: LocalClock) -> Self {
        Self {
            accounts,
            hasher,
            clock,
        }
    }

    /// Read a registration body; a wrongly typed field is reported like an invalid one.
    pub fn create_request(body: Value) -> Result<CreateUserRequest, AppError> {
        decode_fields(body, RESOURCE, &CREATE_FIELDS)
    }

    pub fn update_request(body: Value) -> Result<UpdateUserRequest, AppError> {
        decode_fields(body, RESOURCE, &UPDATE_FIELDS)
    }

    /// Register a user. Requested scopes outside the registered set are dropped.
    #[instrument(skip(self, req))]
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, AppError> {
        validate_fields(&req, RESOURCE, &CREATE_FIELDS)?;

        let (Some(username), Some(password), Some(scope)) = (req.username, req.password, req.scope)
        else {
            return Err(ServiceError::Validation(FieldError::invalid(RESOURCE, "body")).into());
        };

        // A banned account releases its name.
        if let Some(holder) = self.accounts.find_user_by_name(&username).await? {
            if !holder.is_banned() {
                return Err(ServiceError::UsernameTaken.into());
            }
        }

        let scope = assign_scopes(&ScopeSet::parse(&scope), &self.known_scopes().await?);
        let password_hash = self.hash(Password::new(password)).await?;

        let user = self
            .accounts
            .insert_user(&NewUser {
                username,
                password_hash,
                scope,
                created: self.clock.now(),
            })
            .await?;

        info!(user_id = user.id, scope = %user.scope, "User registered");
        Ok(user)
    }

    /// Apply a partial update. Banned users can still be updated (and unbanned).
    #[instrument(skip(self, req))]
    pub async fn update(&self, id: i32, req: UpdateUserRequest) -> Result<(), AppError> {
        validate_fields(&req, RESOURCE, &UPDATE_FIELDS)?;

        let scope = match req.scope.as_deref() {
            Some(raw) => Some(assign_scopes(&ScopeSet::parse(raw), &self.known_scopes().await?)),
            None => None,
        };
        let password_hash = match req.password {
            Some(password) => Some(self.hash(Password::new(password)).await?),
            None => None,
        };

        let changes = UserChanges {
            scope,
            password_hash,
            banned: req.banned,
            modified: self.clock.now(),
        };

        if !self.accounts.update_user(id, &changes).await? {
            return Err(ServiceError::UserNotFound.into());
        }

        info!(user_id = id, "User updated");
        Ok(())
    }

    /// Non-banned user by id; banned users read as absent.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<User, AppError> {
        match self.accounts.find_user_by_id(id).await? {
            Some(user) if !user.is_banned() => Ok(user),
            _ => Err(ServiceError::UserNotFound.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: UserFilter, page: PageRequest) -> Result<Page<User>, AppError> {
        self.accounts.list_users(&filter, page).await
    }

    pub async fn list_scopes(&self) -> Result<Vec<Scope>, AppError> {
        self.accounts.list_scopes().await
    }

    async fn known_scopes(&self) -> Result<ScopeSet, AppError> {
        Ok(self
            .accounts
            .list_scopes()
            .await?
            .into_iter()
            .map(|scope| scope.name)
            .collect())
    }

    async fn hash(&self, password: Password) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Hashing task failed: {}", e)))?
            .map_err(AppError::InternalError)
    }
}
