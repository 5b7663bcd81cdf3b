//! Resolves an `Authorization` header to a live, non-banned user.
//!
//! The user row is re-read on every request, so bans and scope changes take
//! effect immediately regardless of cached password checks or issued tokens.

use base64::{engine::general_purpose::STANDARD, Engine};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::models::User;
use crate::services::cache::{cache_key, VerificationCache};
use crate::services::error::ServiceError;
use crate::services::jwt::JwtService;
use crate::services::store::AccountStore;
use crate::utils::{CredentialHasher, Password};

/// Parsed `Authorization` header.
#[derive(Debug, Clone)]
pub enum Credentials {
    Basic { username: String, password: Password },
    Bearer(String),
}

impl Credentials {
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, value) = header.trim().split_once(' ')?;
        let value = value.trim();

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD.decode(value).ok()?;
            let decoded = String::from_utf8(decoded).ok()?;
            let (username, password) = decoded.split_once(':')?;
            Some(Credentials::Basic {
                username: username.to_string(),
                password: Password::new(password),
            })
        } else if scheme.eq_ignore_ascii_case("bearer") && !value.is_empty() {
            Some(Credentials::Bearer(value.to_string()))
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct Authenticator {
    accounts: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    cache: Arc<dyn VerificationCache>,
    cache_ttl: Duration,
    jwt: JwtService,
}

impl Authenticator {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: CredentialHasher,
        cache: Arc<dyn VerificationCache>,
        cache_ttl: Duration,
        jwt: JwtService,
    ) -> Self {
        Self {
            accounts,
            hasher,
            cache,
            cache_ttl,
            jwt,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Authenticate a raw `Authorization` header value.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<User, AppError> {
        let credentials = header
            .and_then(Credentials::parse)
            .ok_or(ServiceError::MissingCredentials)?;

        match credentials {
            Credentials::Basic { username, password } => {
                self.authenticate_password(&username, &password).await
            }
            Credentials::Bearer(token) => self.authenticate_token(&token).await,
        }
    }

    #[instrument(skip(self, password))]
    pub async fn authenticate_password(
        &self,
        username: &str,
        password: &Password,
    ) -> Result<User, AppError> {
        let user = match self.accounts.find_user_by_name(username).await? {
            Some(user) if !user.is_banned() => user,
            _ => {
                debug!("Unknown or banned user");
                return Err(ServiceError::InvalidCredentials.into());
            }
        };

        let key = cache_key(username, password);
        match self.cache.get(&key).await {
            Ok(Some(digest)) if digest == user.password => return Ok(user),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Verification cache lookup failed"),
        }

        if !self.verify(password, &user.password).await? {
            return Err(ServiceError::InvalidCredentials.into());
        }

        if let Err(e) = self.cache.set(&key, &user.password, self.cache_ttl).await {
            warn!(error = %e, "Failed to cache verification result");
        }

        Ok(user)
    }

    #[instrument(skip(self, token))]
    pub async fn authenticate_token(&self, token: &str) -> Result<User, AppError> {
        let claims = self.jwt.validate_access_token(token)?;
        let user_id = claims.user_id().ok_or(ServiceError::InvalidCredentials)?;

        match self.accounts.find_user_by_id(user_id).await? {
            Some(user) if !user.is_banned() => Ok(user),
            _ => Err(ServiceError::InvalidCredentials.into()),
        }
    }

    async fn verify(&self, password: &Password, digest: &str) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        let password = password.clone();
        let digest = digest.to_string();

        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Verification task failed: {}", e)))
    }
}
