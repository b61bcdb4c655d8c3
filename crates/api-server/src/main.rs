use application::UserApp;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use config::Config;
use domain::{ListFilters, ListOptions};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone)]
struct AppState {
    user_app: UserApp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let config = Config::from_env(None)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    info!("🚀 Starting user directory API server");
    info!("🗄️  Store backend: {}", config.store_backend);

    let user_app = UserApp::new(&config)?;
    let app = router(AppState { user_app });

    // Run the server
    let bind_address = config.api_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("🌐 API Server listening on http://{}", bind_address);
    info!("   GET  /users   - List all users");
    info!("   GET  /health  - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Handler functions
async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    match state
        .user_app
        .user_service
        .list(ListFilters::default(), ListOptions::default())
        .await
    {
        Ok(users) => Json(users).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to list users");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to list users: {}", e)).into_response()
        }
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
