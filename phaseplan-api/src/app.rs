/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use phaseplan_api::{app::{build_router, AppState}, config::Config};
/// use phaseplan_shared::mailer::LogMailer;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config, Arc::new(LogMailer));
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use phaseplan_shared::{auth::middleware::authenticate_request, mailer::Mailer};
use sqlx::PgPool;
use std::sync::Arc;
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

    pub config: Arc<Config>,

    /// Delivers password reset links
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// Gets JWT secret for session operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                          # public
/// └── /api/
///     ├── POST /register                   # public
///     ├── /auth/
///     │   ├── POST /login                  # public
///     │   ├── POST /forgot-password        # public
///     │   ├── POST /reset-password         # public
///     │   └── GET  /session                # session
///     ├── /projects                        # session + ownership
///     │   ├── GET, POST /
///     │   ├── GET, PATCH, DELETE /:id
///     │   └── POST /:id/phases
///     ├── /phases/:id                      # session + ownership
///     │   ├── PATCH, DELETE
///     │   └── POST /tasks
///     └── /tasks/:id                       # session + ownership
///         └── PATCH, DELETE
/// ```
///
/// # Middleware Stack
///
/// 1. Security headers (outermost)
/// 2. CORS
/// 3. Request tracing
/// 4. Session authentication on protected routes
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    let session_routes = Router::new()
        .route("/session", get(routes::auth::session))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:id",
            get(routes::projects::get_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/phases", post(routes::phases::create_phase));

    let phase_routes = Router::new()
        .route(
            "/:id",
            patch(routes::phases::update_phase).delete(routes::phases::delete_phase),
        )
        .route("/:id/tasks", post(routes::tasks::create_task));

    let task_routes = Router::new().route(
        "/:id",
        patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
    );

    let protected_routes = Router::new()
        .nest("/projects", project_routes)
        .nest("/phases", phase_routes)
        .nest("/tasks", task_routes)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let api_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .nest("/auth", public_auth_routes.merge(session_routes))
        .merge(protected_routes);

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
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Session authentication layer
///
/// Validates the Bearer session token and injects an `AuthContext` into
/// request extensions.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate_request(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, "Session authenticated");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
