// HTTP handlers for suggestion endpoints

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::Envelope;
use crate::suggestions::metrics::MetricsSummary;
use crate::suggestions::models::{
    EngineRunReport, ListSuggestionsQuery, RunSuggestionsRequest, SuggestionResponse,
    UpdateSuggestionStatusRequest,
};
use crate::suggestions::snapshot::RunScope;
use crate::suggestions::types::SuggestionStatus;
use crate::suggestions::SuggestionError;

/// Handler for POST /api/suggestions/run
/// Runs the requested evaluator categories and refreshes the store
#[utoipa::path(
    post,
    path = "/api/suggestions/run",
    request_body = RunSuggestionsRequest,
    responses(
        (status = 200, description = "Run report with ranked pending suggestions", body = EngineRunReport),
        (status = 400, description = "Unknown category or invalid deadline", body = String, example = json!({"success": false, "error": "Validation failed: categories: unknown category: banana"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"success": false, "error": "Database error"}))
    ),
    tag = "suggestions"
)]
pub async fn run_suggestions_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<RunSuggestionsRequest>,
) -> Result<Json<Envelope<EngineRunReport>>, SuggestionError> {
    request.validate()?;
    let categories = request.evaluator_kinds()?;
    let scope = RunScope {
        warehouse_id: request.warehouse_id,
    };
    let deadline = request.deadline_ms.map(Duration::from_millis);

    let report = state.engine.run(scope, categories, deadline).await?;

    Ok(Envelope::ok(report))
}

/// Handler for GET /api/suggestions
/// Lists suggestions, ranked by priority then recency
#[utoipa::path(
    get,
    path = "/api/suggestions",
    params(
        ("status" = Option<String>, Query, description = "Filter by lifecycle status"),
        ("category" = Option<String>, Query, description = "Filter by evaluator category"),
        ("limit" = Option<i64>, Query, description = "Maximum rows, 1 to 200")
    ),
    responses(
        (status = 200, description = "Ranked suggestions", body = Vec<SuggestionResponse>),
        (status = 400, description = "Invalid filter value", body = String, example = json!({"success": false, "error": "Validation failed: Invalid suggestion status: archived"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"success": false, "error": "Database error"}))
    ),
    tag = "suggestions"
)]
pub async fn list_suggestions_handler(
    State(state): State<crate::AppState>,
    Query(query): Query<ListSuggestionsQuery>,
) -> Result<Json<Envelope<Vec<SuggestionResponse>>>, SuggestionError> {
    let filter = query.into_filter()?;
    let suggestions = state.engine.list(&filter).await?;

    Ok(Envelope::ok(
        suggestions.into_iter().map(SuggestionResponse::from).collect(),
    ))
}

/// Handler for PATCH /api/suggestions/{id}
/// Moves a suggestion through its status lifecycle
#[utoipa::path(
    patch,
    path = "/api/suggestions/{id}",
    params(
        ("id" = Uuid, Path, description = "Suggestion ID")
    ),
    request_body = UpdateSuggestionStatusRequest,
    responses(
        (status = 200, description = "Updated suggestion", body = SuggestionResponse),
        (status = 400, description = "Invalid status or transition", body = String, example = json!({"success": false, "error": "Invalid status transition from resolved to acknowledged"})),
        (status = 404, description = "Suggestion not found", body = String, example = json!({"success": false, "error": "Suggestion not found: 3f1aeaa5-4b65-4f89-9a3f-8e2f6d9b4c11"})),
        (status = 500, description = "Internal server error", body = String, example = json!({"success": false, "error": "Database error"}))
    ),
    tag = "suggestions"
)]
pub async fn update_suggestion_status_handler(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSuggestionStatusRequest>,
) -> Result<Json<Envelope<SuggestionResponse>>, SuggestionError> {
    request.validate()?;
    let target = SuggestionStatus::from_str(&request.status)
        .map_err(SuggestionError::ValidationError)?;

    let updated = state.engine.transition(id, target).await?;

    Ok(Envelope::ok(updated.into()))
}

/// Handler for GET /api/suggestions/metrics
/// Engine counters since process start
#[utoipa::path(
    get,
    path = "/api/suggestions/metrics",
    responses(
        (status = 200, description = "Engine metrics snapshot", body = MetricsSummary)
    ),
    tag = "suggestions"
)]
pub async fn engine_metrics_handler(
    State(state): State<crate::AppState>,
) -> Json<Envelope<MetricsSummary>> {
    Envelope::ok(state.engine.metrics().summary())
}
