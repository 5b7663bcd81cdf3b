//! Test helpers for kakou-service integration tests.
//!
//! The router runs against in-memory stores that implement the same store
//! traits as PostgreSQL, so the whole HTTP surface is exercised without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use kakou_service::{
    build_router,
    config::KakouConfig,
    models::{Checkpoint, CrossingRecord, IdRange, NewUser, Scope, User, UserChanges, UserFilter},
    services::{AccountStore, KakouStore, LookupTables, MemoryCache},
    utils::{CredentialHasher, Page, PageRequest, Password},
    AppState,
};
use serde_json::Value;
use service_core::error::AppError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const DEFAULT_PEER: &str = "203.0.113.10";

fn unavailable() -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("store unavailable"))
}

#[derive(Default)]
pub struct MemoryAccounts {
    users: Mutex<Vec<User>>,
    scopes: Mutex<Vec<Scope>>,
    pub failing: AtomicBool,
}

impl MemoryAccounts {
    pub fn add_scope(&self, name: &str) {
        let mut scopes = self.scopes.lock().unwrap();
        let id = scopes.len() as i32 + 1;
        scopes.push(Scope {
            id,
            name: name.to_string(),
        });
    }

    pub fn add_user(&self, username: &str, password: &str, scope: &str, banned: i32) -> User {
        let hash = test_hasher().hash(&Password::new(password)).unwrap();
        let ts = NaiveDate::from_ymd_opt(2017, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        let mut users = self.users.lock().unwrap();
        let user = User {
            id: users.len() as i32 + 1,
            username: username.to_string(),
            password: hash,
            scope: scope.to_string(),
            date_created: ts,
            date_modified: ts,
            banned,
        };
        users.push(user.clone());
        user
    }

    pub fn user(&self, id: i32) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }

    async fn find_user_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self.user(id))
    }

    async fn find_user_by_name(&self, username: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        let mut named: Vec<&User> = users.iter().filter(|u| u.username == username).collect();
        named.sort_by_key(|u| (u.banned, std::cmp::Reverse(u.id)));
        Ok(named.first().map(|u| (*u).clone()))
    }

    async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> Result<Page<User>, AppError> {
        self.check()?;
        let users = self.users.lock().unwrap();
        let matching: Vec<&User> = users
            .iter()
            .filter(|u| {
                filter
                    .username_contains
                    .as_deref()
                    .map_or(true, |needle| u.username.contains(needle))
            })
            .collect();
        Ok(Page {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .cloned()
                .collect(),
        })
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username && !u.is_banned()) {
            return Err(AppError::Conflict(anyhow::anyhow!("Username already exists")));
        }
        let created = User {
            id: users.len() as i32 + 1,
            username: user.username.clone(),
            password: user.password_hash.clone(),
            scope: user.scope.to_string(),
            date_created: user.created,
            date_modified: user.created,
            banned: 0,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i32, changes: &UserChanges) -> Result<bool, AppError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let Some(name) = users.iter().find(|u| u.id == id).map(|u| u.username.clone()) else {
            return Ok(false);
        };
        if changes.banned == Some(0)
            && users
                .iter()
                .any(|u| u.id != id && u.username == name && !u.is_banned())
        {
            return Err(AppError::Conflict(anyhow::anyhow!("Username already exists")));
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(false);
        };
        if let Some(scope) = &changes.scope {
            user.scope = scope.to_string();
        }
        if let Some(hash) = &changes.password_hash {
            user.password = hash.clone();
        }
        if let Some(banned) = changes.banned {
            user.banned = banned;
        }
        user.date_modified = changes.modified;
        Ok(true)
    }

    async fn list_scopes(&self) -> Result<Vec<Scope>, AppError> {
        self.check()?;
        Ok(self.scopes.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct MemoryKakou {
    checkpoints: Mutex<Vec<Checkpoint>>,
    crossings: Mutex<Vec<CrossingRecord>>,
    pub failing: AtomicBool,
}

impl MemoryKakou {
    pub fn add_checkpoint(&self, kkid: i64, kkdm: &str, kkmc: &str) {
        self.checkpoints.lock().unwrap().push(Checkpoint {
            kkid,
            kkdm: Some(kkdm.to_string()),
            kkmc: Some(kkmc.to_string()),
            wd: Some("22.930533".to_string()),
            jd: Some("113.923485".to_string()),
        });
    }

    pub fn add_crossing(&self, record: CrossingRecord) {
        self.crossings.lock().unwrap().push(record);
    }

    /// Records `first..=last` with a known colour and direction.
    pub fn add_crossings(&self, first: i64, last: i64) {
        for id in first..=last {
            self.add_crossing(crossing(id, Some("蓝"), Some(1)));
        }
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }
}

#[async_trait]
impl KakouStore for MemoryKakou {
    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }

    async fn list_checkpoints(&self) -> Result<Vec<Checkpoint>, AppError> {
        self.check()?;
        Ok(self.checkpoints.lock().unwrap().clone())
    }

    async fn find_crossing(&self, id: i64) -> Result<Option<CrossingRecord>, AppError> {
        self.check()?;
        Ok(self
            .crossings
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.clxxbh == id)
            .cloned())
    }

    async fn list_crossings(&self, range: IdRange, page: PageRequest) -> Result<Page<CrossingRecord>, AppError> {
        self.check()?;
        let mut matching: Vec<CrossingRecord> = self
            .crossings
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                range.start.map_or(true, |start| c.clxxbh >= start)
                    && range.end.map_or(true, |end| c.clxxbh <= end)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.clxxbh);
        Ok(Page {
            total: matching.len() as i64,
            items: matching
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit() as usize)
                .collect(),
        })
    }

    async fn max_crossing_id(&self) -> Result<Option<i64>, AppError> {
        self.check()?;
        Ok(self.crossings.lock().unwrap().iter().map(|c| c.clxxbh).max())
    }
}

pub fn crossing(id: i64, hpys: Option<&str>, xsfxdm: Option<i32>) -> CrossingRecord {
    CrossingRecord {
        clxxbh: id,
        kkbh: Some("441302001".to_string()),
        kkmc: Some("江北卡口".to_string()),
        jgsk: NaiveDate::from_ymd_opt(2017, 3, 9).and_then(|d| d.and_hms_opt(7, 5, 1)),
        cdbh: Some(2),
        hphm: Some(format!("粤L{:05}", id)),
        hpys: hpys.map(str::to_string),
        xsfxdm,
        cllx: Some("K33".to_string()),
        csys: Some("A".to_string()),
        hpzl: Some("02".to_string()),
        clsd: Some(45),
        hptp: Some(format!("http://img/{}/plate.jpg", id)),
        qjtp: Some(format!("http://img/{}/full.jpg", id)),
    }
}

pub fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(8, 1, 1).unwrap()
}

pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

pub fn admin_auth() -> String {
    basic_auth(ADMIN_USER, ADMIN_PASSWORD)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub accounts: Arc<MemoryAccounts>,
    pub kakou: Arc<MemoryKakou>,
    pub cache: Arc<MemoryCache>,
}

impl TestApp {
    /// App with scopes `read`, `admin`, `all` and an `admin` user holding scope `admin`.
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        Self::with_tables(overrides, LookupTables::default())
    }

    pub fn with_tables(overrides: &[(&str, &str)], tables: LookupTables) -> Self {
        let mut vars: HashMap<String, String> = [
            ("PASSWORD_MEMORY_KIB", "8"),
            ("PASSWORD_ITERATIONS", "1"),
            ("PASSWORD_PARALLELISM", "1"),
            ("JWT_SECRET", "integration-test-secret"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in overrides {
            vars.insert(k.to_string(), v.to_string());
        }

        let config = KakouConfig::from_lookup(service_core::config::Config::default(), move |key| {
            vars.get(key).cloned()
        })
        .unwrap();

        let accounts = Arc::new(MemoryAccounts::default());
        for scope in ["read", "admin", "all"] {
            accounts.add_scope(scope);
        }
        accounts.add_user(ADMIN_USER, ADMIN_PASSWORD, "admin", 0);

        let kakou = Arc::new(MemoryKakou::default());
        let cache = Arc::new(MemoryCache::new());

        let state = AppState::new(
            config,
            accounts.clone(),
            kakou.clone(),
            cache.clone(),
            tables,
        )
        .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            accounts,
            kakou,
            cache,
        }
    }

    pub async fn get(&self, uri: &str, auth: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, auth, None).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.request_from(DEFAULT_PEER, method, uri, auth, body).await
    }

    pub async fn request_from(
        &self,
        peer: &str,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).unwrap();
        self.send(peer, request).await
    }

    pub async fn send(&self, peer: &str, mut request: Request<Body>) -> TestResponse {
        let addr: SocketAddr = format!("{}:40000", peer).parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
