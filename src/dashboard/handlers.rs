// HTTP handler for the role dashboard

use axum::{
    extract::{Query, State},
    Json,
};

use crate::dashboard::models::{DashboardQuery, DashboardView, Role};
use crate::dashboard::DashboardError;
use crate::error::Envelope;

/// Handler for GET /api/dashboard
/// Builds the role-scoped dashboard: greeting, KPIs, urgent tasks and a
/// short plan for the day
#[utoipa::path(
    get,
    path = "/api/dashboard",
    params(
        ("role" = String, Query, description = "One of titolare, magazziniere, contabile, operatore"),
        ("name" = Option<String>, Query, description = "Display name used in the greeting")
    ),
    responses(
        (status = 200, description = "Assembled dashboard, possibly with warnings for sections that failed to load", body = DashboardView),
        (status = 400, description = "Unknown role", body = String, example = json!({"success": false, "error": "Validation failed: unknown role: barista"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"success": false, "error": "Database error"}))
    ),
    tag = "dashboard"
)]
pub async fn get_dashboard_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Envelope<DashboardView>>, DashboardError> {
    let role: Role = query
        .role
        .parse()
        .map_err(DashboardError::ValidationError)?;

    let view = state.dashboard.build(role, query.name.as_deref()).await;

    Ok(Envelope::ok(view))
}
