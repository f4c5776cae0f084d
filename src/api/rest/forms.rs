//! Form-driven flow. Submissions redirect to a listing on success and to
//! the generic invalid-data page on any failure; the failure reason only
//! reaches the log.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::engine::relationships::{self, NewDriver, NewPackage};
use crate::error::AppError;
use crate::models::driver::{DepartmentGroup, DriverView};
use crate::models::package::Package;
use crate::state::AppState;

const VIEW_DRIVERS: &str = "/view-drivers";
const VIEW_PACKAGES: &str = "/view-packages";
const INVALID_DATA: &str = "/invalid-data";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route(INVALID_DATA, get(invalid_data))
        .route(VIEW_DRIVERS, get(view_drivers))
        .route(VIEW_PACKAGES, get(view_packages))
        .route("/list-drivers-by-department", get(list_drivers_by_department))
        .route("/add-driver-post", post(add_driver))
        .route("/delete-driver-submit", get(delete_driver))
        .route("/add-package-post", post(add_package))
        .route("/delete-package-post", post(delete_package))
}

#[derive(Deserialize)]
pub struct AddDriverForm {
    pub driver_name: Option<String>,
    pub driver_department: Option<String>,
    pub driver_licence: Option<String>,
    #[serde(rename = "driver_isActive")]
    pub is_active: Option<String>,
}

#[derive(Deserialize)]
pub struct DeleteDriverQuery {
    pub id: Option<String>,
}

#[derive(Deserialize)]
pub struct AddPackageForm {
    pub title: Option<String>,
    pub weight: Option<String>,
    pub destination: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "driverID")]
    pub driver_id: Option<String>,
    #[serde(rename = "isAllocated")]
    pub is_allocated: Option<String>,
}

#[derive(Deserialize)]
pub struct DeletePackageForm {
    #[serde(rename = "packageId")]
    pub package_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub driver_count: u64,
    pub package_count: u64,
}

fn checkbox(value: Option<&str>) -> bool {
    value == Some("on")
}

fn finish<T>(state: &AppState, action: &str, result: Result<T, AppError>, success: &str) -> Redirect {
    match result {
        Ok(_) => Redirect::to(&state.path(success)),
        Err(err) => {
            warn!(error = %err, action, "form submission rejected");
            Redirect::to(&state.path(INVALID_DATA))
        }
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Json<Dashboard> {
    let (driver_count, package_count) = match relationships::counts(&state).await {
        Ok(counts) => counts,
        Err(err) => {
            error!(error = %err, "failed to count records");
            (0, 0)
        }
    };

    Json(Dashboard {
        driver_count,
        package_count,
    })
}

async fn invalid_data() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid data" })),
    )
}

async fn view_drivers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DriverView>>, Redirect> {
    relationships::list_drivers(&state)
        .await
        .map(Json)
        .map_err(|err| {
            error!(error = %err, "failed to list drivers");
            Redirect::to(&state.path(INVALID_DATA))
        })
}

async fn view_packages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Package>>, Redirect> {
    relationships::list_packages(&state)
        .await
        .map(Json)
        .map_err(|err| {
            error!(error = %err, "failed to list packages");
            Redirect::to(&state.path(INVALID_DATA))
        })
}

async fn list_drivers_by_department(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DepartmentGroup>>, Redirect> {
    relationships::drivers_by_department(&state)
        .await
        .map(Json)
        .map_err(|err| {
            error!(error = %err, "failed to group drivers");
            Redirect::to(&state.path(INVALID_DATA))
        })
}

async fn add_driver(State(state): State<Arc<AppState>>, Form(form): Form<AddDriverForm>) -> Redirect {
    let result = relationships::add_driver(
        &state,
        NewDriver {
            name: form.driver_name,
            department: form.driver_department,
            licence: form.driver_licence,
            is_active: Some(checkbox(form.is_active.as_deref())),
        },
    )
    .await;

    finish(&state, "add driver", result, VIEW_DRIVERS)
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteDriverQuery>,
) -> Redirect {
    let result = match query.id.filter(|id| !id.trim().is_empty()) {
        Some(driver_id) => relationships::delete_driver(&state, driver_id.trim()).await,
        None => Err(AppError::BadRequest("driver id is required".to_string())),
    };

    finish(&state, "delete driver", result, VIEW_DRIVERS)
}

async fn add_package(State(state): State<Arc<AppState>>, Form(form): Form<AddPackageForm>) -> Redirect {
    let result = relationships::add_package(
        &state,
        NewPackage {
            title: form.title,
            weight: form.weight.and_then(|raw| raw.trim().parse::<f64>().ok()),
            destination: form.destination,
            description: form.description,
            is_allocated: Some(checkbox(form.is_allocated.as_deref())),
            driver_id: form.driver_id,
            first_name: None,
            last_name: None,
        },
    )
    .await;

    finish(&state, "add package", result, VIEW_PACKAGES)
}

async fn delete_package(
    State(state): State<Arc<AppState>>,
    Form(form): Form<DeletePackageForm>,
) -> Redirect {
    let result = match form.package_id.filter(|id| !id.trim().is_empty()) {
        Some(package_id) => {
            relationships::delete_package_by_business_id(&state, package_id.trim()).await
        }
        None => Err(AppError::BadRequest("package id is required".to_string())),
    };

    finish(&state, "delete package", result, VIEW_PACKAGES)
}
