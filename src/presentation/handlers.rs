// HTTP request handlers
use crate::domain::snapshot::Snapshot;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct DataQuery {
    pub project: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/get_projects", get(get_projects))
        .route("/get_data", get(get_data))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all project folders
pub async fn get_projects(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    match state.survey_service.list_projects().await {
        Ok(projects) => Json(projects),
        Err(e) => {
            tracing::error!("Error listing projects: {:#}", e);
            // Return empty list on error
            Json(Vec::new())
        }
    }
}

/// Snapshot of every survey of one project
pub async fn get_data(
    Query(query): Query<DataQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<Snapshot> {
    Json(state.survey_service.snapshot(query.project.as_deref()).await)
}
