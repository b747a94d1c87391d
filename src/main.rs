use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware as axum_middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use hearth_api::config;
use hearth_api::database::manager::DatabaseManager;
use hearth_api::database::store::PgAuthStore;
use hearth_api::handlers;
use hearth_api::middleware::{auth_context_middleware, require_family_admin, require_global_admin};
use hearth_api::state::AppState;

// Hourly revocation sweep
const REVOCATION_SWEEP_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Refuse to start without a signing key rather than fall back to a
    // built-in secret
    let config = match config::init() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting Hearth API in {:?} mode", config.environment);

    let pool = match DatabaseManager::pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("database error: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState::new(Arc::new(PgAuthStore::new(pool)), config);
    let _sweeper = state.revocations.clone().spawn_sweeper(REVOCATION_SWEEP_PERIOD);

    let app = app(state);

    let port = std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(3000);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Hearth API listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes(state.clone()))
        .merge(auth_protected_routes(state.clone()))
        .merge(family_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes(state: AppState) -> Router<AppState> {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/admin", post(auth::admin_login_post))
        .with_state(state)
}

fn auth_protected_routes(state: AppState) -> Router<AppState> {
    use axum::routing::delete;
    use handlers::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/session", delete(auth::session_logout))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_context_middleware,
        ))
        .with_state(state)
}

fn family_routes(state: AppState) -> Router<AppState> {
    use handlers::family;

    // Family administrator surface (fallback caretaker and global admins
    // qualify)
    Router::new()
        .route("/api/family", get(family::family_get))
        .route_layer(axum_middleware::from_fn(require_family_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_context_middleware,
        ))
        .with_state(state)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use handlers::auth;

    // Cross-family surface: context resolution plus the global-admin guard
    Router::new()
        .route("/api/admin/whoami", get(auth::session_whoami))
        .route_layer(axum_middleware::from_fn(require_global_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_context_middleware,
        ))
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Hearth API",
            "version": version,
            "description": "Multi-tenant household activity tracker API",
            "endpoints": {
                "home": "/ (public)",
                "login": "/auth/login, /auth/admin (public - token acquisition)",
                "session": "/api/auth/whoami, /api/auth/session (protected)",
                "admin": "/api/admin/* (restricted, global administrators)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
