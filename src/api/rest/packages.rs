use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::rest::extract::{ApiJson, ApiPath, lenient_bool, lenient_f64};
use crate::engine::relationships::{self, NewPackage};
use crate::error::AppError;
use crate::models::ValidationError;
use crate::models::package::Package;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/packages/add", post(add_package))
        .route("/packages/update", put(update_destination))
        .route("/packages/:id", delete(delete_package))
}

#[derive(Deserialize)]
pub struct AddPackageRequest {
    pub package_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub package_weight: Option<f64>,
    pub package_destination: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "isAllocated", default, deserialize_with = "lenient_bool")]
    pub is_allocated: Option<bool>,
    pub driver_id: Option<String>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateDestinationRequest {
    pub package_id: Option<String>,
    pub package_destination: Option<String>,
}

#[derive(Serialize)]
pub struct PackageCreated {
    pub id: Uuid,
    pub package_id: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDeleted {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

async fn add_package(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<AddPackageRequest>,
) -> Result<(StatusCode, Json<PackageCreated>), AppError> {
    let created = relationships::add_package(
        &state,
        NewPackage {
            title: payload.package_title,
            weight: payload.package_weight,
            destination: payload.package_destination,
            description: payload.description,
            is_allocated: payload.is_allocated,
            driver_id: payload.driver_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(PackageCreated {
            id: created.id,
            package_id: created.business_id,
        }),
    ))
}

async fn list_packages(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(relationships::list_packages(&state).await?))
}

async fn update_destination(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<UpdateDestinationRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let (Some(package_id), Some(destination)) = (payload.package_id, payload.package_destination)
    else {
        return Err(ValidationError::MissingFields(
            "All fields are required: package_id, package_destination.".to_string(),
        )
        .into());
    };

    relationships::update_package_destination(&state, &package_id, &destination).await?;

    Ok(Json(StatusResponse {
        status: "updated successfully",
    }))
}

async fn delete_package(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<PackageDeleted>, AppError> {
    let deleted_count = relationships::delete_package(&state, id).await?;

    Ok(Json(PackageDeleted {
        acknowledged: true,
        deleted_count,
    }))
}
