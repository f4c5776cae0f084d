use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::extract::{ApiJson, ApiPath, lenient_bool};
use crate::engine::relationships::{self, NewDriver};
use crate::error::AppError;
use crate::models::driver::{DepartmentGroup, DriverView};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers))
        .route("/drivers/add", post(add_driver))
        .route("/drivers/by-department", get(drivers_by_department))
        .route("/drivers/:driver_id", delete(delete_driver))
}

#[derive(Deserialize)]
pub struct AddDriverRequest {
    pub driver_name: Option<String>,
    pub driver_department: Option<String>,
    pub driver_licence: Option<String>,
    #[serde(rename = "driver_isActive", default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,
}

#[derive(Serialize)]
pub struct DriverCreated {
    pub id: Uuid,
    pub driver_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverDeleted {
    pub acknowledged: bool,
    pub deleted_driver_count: u64,
    pub deleted_package_count: u64,
}

async fn add_driver(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AddDriverRequest>,
) -> Result<(StatusCode, Json<DriverCreated>), AppError> {
    let created = relationships::add_driver(
        &state,
        NewDriver {
            name: payload.driver_name,
            department: payload.driver_department,
            licence: payload.driver_licence,
            is_active: payload.is_active,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DriverCreated {
            id: created.id,
            driver_id: created.business_id,
        }),
    ))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DriverView>>, AppError> {
    Ok(Json(relationships::list_drivers(&state).await?))
}

async fn drivers_by_department(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DepartmentGroup>>, AppError> {
    Ok(Json(relationships::drivers_by_department(&state).await?))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    ApiPath(driver_id): ApiPath<String>,
) -> Result<Json<DriverDeleted>, AppError> {
    let deletion = relationships::delete_driver(&state, &driver_id).await?;

    Ok(Json(DriverDeleted {
        acknowledged: true,
        deleted_driver_count: deletion.deleted_driver_count,
        deleted_package_count: deletion.deleted_package_count,
    }))
}
