//! Memoisation of successful password checks.
//!
//! An entry maps `(username, sha256(password))` to the stored digest the password
//! verified against. Callers compare that digest with the current one, so a
//! password change invalidates the entry without touching the cache.

use async_trait::async_trait;
use dashmap::DashMap;
use redis::{aio::ConnectionManager, Client};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use crate::utils::Password;

const KEY_PREFIX: &str = "verify";

#[async_trait]
pub trait VerificationCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set(&self, key: &str, digest: &str, ttl: Duration) -> Result<(), anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

/// Cache key for a credential pair; the plaintext password never leaves this function.
pub fn cache_key(username: &str, password: &Password) -> String {
    let hash = Sha256::digest(password.as_str().as_bytes());
    format!("{}:{}:{}", KEY_PREFIX, username, hex::encode(hash))
}

#[derive(Clone)]
pub struct RedisCache {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn new(url: &str) -> Result<Self, anyhow::Error> {
        tracing::info!("Connecting to Redis");
        let client = Client::open(url)?;

        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl VerificationCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get cache: {}", e))
    }

    async fn set(&self, key: &str, digest: &str, ttl: Duration) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(digest)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to set cache: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-process cache used when no Redis is configured.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VerificationCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let now = Instant::now();
        let hit = match self.entries.get(key) {
            Some(entry) if entry.1 > now => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };
        if hit {
            self.entries.remove_if(key, |_, (_, expires)| *expires <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, digest: &str, ttl: Duration) -> Result<(), anyhow::Error> {
        self.entries
            .insert(key.to_string(), (digest.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_hides_password() {
        let key = cache_key("alice", &Password::new("hunter2"));
        assert!(key.starts_with("verify:alice:"));
        assert!(!key.contains("hunter2"));
        assert_eq!(key.len(), "verify:alice:".len() + 64);
    }

    #[test]
    fn different_passwords_get_different_keys() {
        assert_ne!(
            cache_key("alice", &Password::new("a")),
            cache_key("alice", &Password::new("b"))
        );
    }

    #[tokio::test]
    async fn memory_cache_returns_fresh_entries() {
        let cache = MemoryCache::new();
        cache.set("k", "$argon2id$x", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("$argon2id$x"));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_cache_drops_expired_entries() {
        let cache = MemoryCache::new();
        cache.set("k", "digest", Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.is_empty());
    }
}
