mod dashboard;
mod db;
mod error;
mod suggestions;
mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use dashboard::handlers::get_dashboard_handler;
use dashboard::{DashboardRepository, DashboardService};
use suggestions::handlers::{
    engine_metrics_handler, list_suggestions_handler, run_suggestions_handler,
    update_suggestion_status_handler,
};
use suggestions::{EngineConfig, PgDataFacade, SuggestionEngine, SuggestionError};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard::handlers::get_dashboard_handler,
        suggestions::handlers::run_suggestions_handler,
        suggestions::handlers::list_suggestions_handler,
        suggestions::handlers::update_suggestion_status_handler,
        suggestions::handlers::engine_metrics_handler,
    ),
    components(
        schemas(
            dashboard::models::DashboardView,
            dashboard::models::Kpi,
            dashboard::models::KpiValue,
            dashboard::models::PlanEntry,
            dashboard::models::Role,
            dashboard::models::UrgentRef,
            dashboard::models::UrgentTask,
            suggestions::metrics::EvaluatorSummary,
            suggestions::metrics::MetricsSummary,
            suggestions::models::EngineRunReport,
            suggestions::models::RunSuggestionsRequest,
            suggestions::models::SuggestionResponse,
            suggestions::models::UpdateSuggestionStatusRequest,
            suggestions::types::EvaluatorKind,
            suggestions::types::Priority,
            suggestions::types::SubjectRef,
            suggestions::types::SuggestionStatus,
            suggestions::types::SuggestionType,
        )
    ),
    tags(
        (name = "dashboard", description = "Role dashboards: KPIs, urgent tasks and a daily plan"),
        (name = "suggestions", description = "Suggestion engine runs, listing and lifecycle")
    ),
    info(
        title = "Bottega API",
        version = "1.0.0",
        description = "ERP backend for an artisan workshop: a rule-based suggestion engine and role dashboards",
        contact(
            name = "API Support",
            email = "support@bottega-api.dev"
        )
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SuggestionEngine>,
    pub dashboard: DashboardService,
}

/// Creates and configures the application router
/// Wires the suggestion engine and dashboard service and adds middleware
fn create_router(db: PgPool, config: EngineConfig) -> Result<Router, SuggestionError> {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let facade = Arc::new(PgDataFacade::new(db.clone()));
    let engine = Arc::new(SuggestionEngine::new(facade, config)?);
    let dashboard = DashboardService::new(DashboardRepository::new(db), Arc::clone(&engine));

    let state = AppState { engine, dashboard };

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // API routes
        .route("/api/dashboard", get(get_dashboard_handler))
        .route("/api/suggestions", get(list_suggestions_handler))
        .route("/api/suggestions/run", post(run_suggestions_handler))
        .route("/api/suggestions/metrics", get(engine_metrics_handler))
        .route("/api/suggestions/:id", patch(update_suggestion_status_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    // RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bottega_api=debug,tower_http=info".into()),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Bottega API - Starting...");

    // Get configuration from environment variables
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Build the router; engine thresholds come from SUGGEST_* variables
    // and are checked here, before the server accepts traffic
    let app = create_router(db_pool, EngineConfig::from_env())
        .expect("Invalid suggestion engine configuration");

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Bottega API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

#[cfg(test)]
mod tests;
