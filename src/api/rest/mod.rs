pub mod drivers;
pub mod extract;
pub mod forms;
pub mod packages;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::engine::relationships;
use crate::error::AppError;
use crate::state::AppState;

/// Builds the full HTTP surface. The JSON API and the form flow live under
/// the configured base path; health and metrics stay at the root.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(drivers::router())
        .merge(packages::router());

    let scoped = Router::new()
        .nest("/api/v1", api)
        .merge(forms::router());

    let app = if state.base_path.is_empty() {
        scoped
    } else {
        Router::new().nest(&state.base_path, scoped)
    };

    app.route("/health", get(health))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    drivers: u64,
    packages: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, AppError> {
    let (drivers, packages) = relationships::counts(&state).await?;

    Ok(Json(HealthResponse {
        status: "ok",
        drivers,
        packages,
    }))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
