pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    ip_allowlist::ip_allowlist_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, ClientRateLimit, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::KakouConfig;
use crate::middleware::{auth_middleware, metrics_middleware, require_scope};
use crate::services::policy::{SCOPE_ADMIN, SCOPE_READ};
use crate::services::{
    AccountStore, Authenticator, Enricher, JwtService, KakouService, KakouStore, LookupTables,
    UserService, VerificationCache,
};
use crate::utils::time::LocalClock;
use crate::utils::CredentialHasher;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index::index,
        handlers::health::health_check,
        handlers::metrics::metrics,
        handlers::token::issue_token,
        handlers::user::get_user,
        handlers::user::list_users,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::scope::list_scopes,
        handlers::kakou::list_checkpoints,
        handlers::kakou::get_crossing,
        handlers::kakou::list_crossings,
        handlers::kakou::max_crossing_id,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::FieldErrorDoc,
            dtos::TokenResponse,
            dtos::HealthResponse,
            dtos::MaxIdResponse,
            dtos::IndexResponse,
            dtos::UserListing,
            dtos::ScopeListing,
            dtos::CheckpointListing,
            dtos::CrossingListing,
            models::UserView,
            models::ScopeView,
            models::CheckpointView,
            models::CrossingView,
            models::CreateUserRequest,
            models::UpdateUserRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Index", description = "Resource index"),
        (name = "Authentication", description = "Bearer token issuing"),
        (name = "User", description = "User administration (scope admin)"),
        (name = "Scope", description = "Registered scopes (scope admin)"),
        (name = "Kakou", description = "Checkpoints and vehicle crossing records"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<KakouConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub kakou_store: Arc<dyn KakouStore>,
    pub cache: Arc<dyn VerificationCache>,
    pub authenticator: Authenticator,
    pub users: UserService,
    pub kakou: KakouService,
    pub account_rate_limiter: IpRateLimiter,
    pub kakou_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire services over the given stores and lookup tables.
    pub fn new(
        config: KakouConfig,
        accounts: Arc<dyn AccountStore>,
        kakou_store: Arc<dyn KakouStore>,
        cache: Arc<dyn VerificationCache>,
        tables: LookupTables,
    ) -> Result<Self, AppError> {
        let hasher = CredentialHasher::new(
            config.password.memory_kib,
            config.password.iterations,
            config.password.parallelism,
        )
        .map_err(AppError::ConfigError)?;
        let clock = LocalClock::from_hours(config.local_utc_offset_hours).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid UTC offset: {}",
                config.local_utc_offset_hours
            ))
        })?;
        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.token_expiry_seconds);

        let authenticator = Authenticator::new(
            accounts.clone(),
            hasher.clone(),
            cache.clone(),
            Duration::from_secs(config.auth.verify_cache_ttl_seconds),
            jwt,
        );
        let users = UserService::new(accounts.clone(), hasher, clock);
        let kakou = KakouService::new(kakou_store.clone(), Enricher::new(Arc::new(tables)));

        let account_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.account_limit,
            config.rate_limit.account_window_seconds,
        );
        let kakou_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.kakou_limit,
            config.rate_limit.kakou_window_seconds,
        );

        Ok(Self {
            config: Arc::new(config),
            accounts,
            kakou_store,
            cache,
            authenticator,
            users,
            kakou,
            account_rate_limiter,
            kakou_rate_limiter,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    // User and scope administration
    let admin_routes = Router::new()
        .route(
            "/user",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/user/:id",
            get(handlers::user::get_user)
                .post(handlers::user::update_user)
                .put(handlers::user::update_user),
        )
        .route("/scope", get(handlers::scope::list_scopes))
        .route_layer(from_fn_with_state(SCOPE_ADMIN, require_scope))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let token_route = Router::new()
        .route("/token", post(handlers::token::issue_token))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let account_routes = Router::new()
        .route("/", get(handlers::index::index))
        .merge(admin_routes)
        .merge(token_route)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(from_fn_with_state(
            ClientRateLimit::new(
                state.account_rate_limiter.clone(),
                state.config.security.trusted_proxies.clone(),
            ),
            ip_rate_limit_middleware,
        ));

    let mut kakou_routes = Router::new()
        .route("/kkdd", get(handlers::kakou::list_checkpoints))
        .route("/kakou", get(handlers::kakou::list_crossings))
        .route("/kakou/maxid", get(handlers::kakou::max_crossing_id))
        .route("/kakou/:id", get(handlers::kakou::get_crossing));

    if state.config.auth.kakou_auth_required {
        kakou_routes = kakou_routes
            .route_layer(from_fn_with_state(SCOPE_READ, require_scope))
            .route_layer(from_fn_with_state(state.clone(), auth_middleware));
    }

    // Unrouted methods still pass the group's limiter
    let kakou_routes = kakou_routes
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(from_fn_with_state(
            ClientRateLimit::new(
                state.kakou_rate_limiter.clone(),
                state.config.security.trusted_proxies.clone(),
            ),
            ip_rate_limit_middleware,
        ));

    // Allowlist sits outside the rate limiters
    let api_routes = Router::new()
        .merge(account_routes)
        .merge(kakou_routes)
        .layer(from_fn_with_state(
            state.config.security.allowlist.clone(),
            ip_allowlist_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics));

    if state.config.swagger_enabled {
        app = app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let cors = cors_layer(&state.config.security.allowed_origins);

    app.merge(api_routes)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect::<Vec<HeaderValue>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
