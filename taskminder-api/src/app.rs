/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskminder_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = taskminder_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskminder_shared::auth::identity::IdentityResolver;
use taskminder_shared::auth::jwt::TokenService;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Token issuing/validation, built once from `config.jwt`
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let tokens = TokenService::new(config.token_config());

        Self {
            db,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }

    /// Identity resolver borrowing this state's pool and token service
    pub fn identity(&self) -> IdentityResolver<'_> {
        IdentityResolver::new(&self.db, &self.tokens)
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /auth/
/// │   ├── POST /register
/// │   ├── POST /login
/// │   ├── POST /refresh
/// │   ├── GET  /me                 (authenticated)
/// │   └── PUT  /me/contacts        (authenticated)
/// ├── /tasks                       (authenticated)
/// │   ├── GET    /
/// │   ├── POST   /
/// │   ├── GET    /:id
/// │   ├── PUT    /:id
/// │   ├── PATCH  /:id
/// │   └── DELETE /:id
/// ├── POST /notify/?task_id=       (authenticated)
/// └── GET  /status/:job_id         (authenticated)
/// ```
///
/// Authenticated routes run `auth_layer`, which resolves the current user
/// and stores its `UserProfile` in request extensions.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/refresh", post(routes::auth::refresh));

    let protected_routes = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/me/contacts", put(routes::auth::update_contacts))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/notify", post(routes::notifications::notify))
        .route("/notify/", post(routes::notifications::notify))
        .route("/status/:job_id", get(routes::notifications::job_status))
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth_layer));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Authentication middleware layer
///
/// Resolves the access token (cookie first, then bearer header) to a user
/// and injects the user's `UserProfile` into request extensions.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.identity().resolve(req.headers()).await?;

    tracing::debug!(user_id = %user.id, "Authenticated request");
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
