pub mod auth;
pub mod metrics;
pub mod scope_auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
pub use metrics::metrics_middleware;
pub use scope_auth::require_scope;
