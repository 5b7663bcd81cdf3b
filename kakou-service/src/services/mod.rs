//! Services layer for kakou-service.
//!
//! Persistence, credential handling, scope policy and record enrichment.

pub mod authenticator;
pub mod cache;
mod database;
pub mod enrichment;
pub mod error;
mod jwt;
pub mod kakou;
pub mod lookup;
pub mod metrics;
pub mod policy;
pub mod store;
mod users;

pub use authenticator::{Authenticator, Credentials};
pub use cache::{MemoryCache, RedisCache, VerificationCache};
pub use database::{connect_pool, escape_like, Database, KakouDatabase};
pub use enrichment::Enricher;
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use kakou::{CrossingQuery, KakouService};
pub use lookup::LookupTables;
pub use store::{AccountStore, KakouStore};
pub use users::UserService;
