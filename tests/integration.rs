use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use logistics_hub::api::rest::router;
use logistics_hub::engine::ids::RandomIdGenerator;
use logistics_hub::state::AppState;
use logistics_hub::store::MemoryStore;
use regex::Regex;
use serde_json::{Value, json};
use tower::ServiceExt;

const API: &str = "/logistics/api/v1";

fn setup() -> axum::Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(RandomIdGenerator::seeded(33, 2024)),
        "/logistics",
    );
    router(Arc::new(state))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

async fn add_alice(app: &axum::Router) -> Value {
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{API}/drivers/add"),
            json!({
                "driver_name": "Alice",
                "driver_department": "food",
                "driver_licence": "AB123"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

async fn add_box(app: &axum::Router, driver: &str, title: &str, names: Option<(&str, &str)>) -> Value {
    let mut payload = json!({
        "package_title": title,
        "package_weight": 2.5,
        "package_destination": "Sydney",
        "driver_id": driver
    });
    if let Some((first, last)) = names {
        payload["firstName"] = json!(first);
        payload["lastName"] = json!(last);
    }

    let res = app
        .clone()
        .oneshot(json_request("POST", &format!("{API}/packages/add"), payload))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["drivers"], 0);
    assert_eq!(body["packages"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    add_alice(&app).await;

    let response = app.oneshot(request("GET", "/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("records_created_total"));
}

#[tokio::test]
async fn add_driver_returns_identity_and_driver_id() {
    let app = setup();
    let body = add_alice(&app).await;

    let pattern = Regex::new(r"^D\d{2}-\d{2}-[A-Z]{3}$").unwrap();
    assert!(pattern.is_match(body["driver_id"].as_str().unwrap()));
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn add_driver_missing_fields_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("{API}/drivers/add"),
            json!({ "driver_name": "Alice", "driver_department": "food" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("driver_licence"));
}

#[tokio::test]
async fn add_driver_unknown_department_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("{API}/drivers/add"),
            json!({
                "driver_name": "Alice",
                "driver_department": "toys",
                "driver_licence": "AB123"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn add_package_with_names_uses_initials() {
    let app = setup();
    let driver = add_alice(&app).await;
    let driver_identity = driver["id"].as_str().unwrap();

    let named = add_box(&app, driver_identity, "Box1", Some(("Jane", "Doe"))).await;
    let package_id = named["package_id"].as_str().unwrap();
    assert!(Regex::new(r"^P[A-Z]{2}-JD-\d{3}$").unwrap().is_match(package_id));

    let anonymous = add_box(&app, driver_identity, "Box2", None).await;
    let package_id = anonymous["package_id"].as_str().unwrap();
    assert!(Regex::new(r"^PZA-[A-Z0-9]{8}$").unwrap().is_match(package_id));
}

#[tokio::test]
async fn add_package_for_unknown_driver_returns_404() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            &format!("{API}/packages/add"),
            json!({
                "package_title": "Box1",
                "package_weight": 2.5,
                "package_destination": "Sydney",
                "driver_id": "00000000-0000-0000-0000-000000000000"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_drivers_expands_assigned_packages() {
    let app = setup();
    let driver = add_alice(&app).await;
    let package = add_box(&app, driver["id"].as_str().unwrap(), "Box1", None).await;

    let res = app
        .oneshot(request("GET", &format!("{API}/drivers")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    let drivers = body.as_array().unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0]["driver_isActive"], true);

    let assigned = drivers[0]["assigned_packages"].as_array().unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0]["package_id"], package["package_id"]);
    assert_eq!(assigned[0]["package_title"], "Box1");
    assert_eq!(assigned[0]["isAllocated"], false);
}

#[tokio::test]
async fn update_destination_by_package_id() {
    let app = setup();
    let driver = add_alice(&app).await;
    let package = add_box(&app, driver["id"].as_str().unwrap(), "Box1", None).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("{API}/packages/update"),
            json!({
                "package_id": package["package_id"],
                "package_destination": "Melbourne"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["status"], "updated successfully");

    let res = app
        .clone()
        .oneshot(request("GET", &format!("{API}/packages")))
        .await
        .unwrap();
    let packages = body_json(res).await;
    assert_eq!(packages[0]["package_destination"], "Melbourne");

    let res = app
        .oneshot(json_request(
            "PUT",
            &format!("{API}/packages/update"),
            json!({
                "package_id": "PZA-00000000",
                "package_destination": "Melbourne"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_package_clears_driver_listing() {
    let app = setup();
    let driver = add_alice(&app).await;
    let package = add_box(&app, driver["id"].as_str().unwrap(), "Box1", None).await;
    let package_identity = package["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(request("DELETE", &format!("{API}/packages/{package_identity}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["acknowledged"], true);
    assert_eq!(body["deletedCount"], 1);

    let res = app
        .clone()
        .oneshot(request("GET", &format!("{API}/drivers")))
        .await
        .unwrap();
    let drivers = body_json(res).await;
    assert!(drivers[0]["assigned_packages"].as_array().unwrap().is_empty());

    let res = app
        .oneshot(request("DELETE", &format!("{API}/packages/{package_identity}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_missing_driver_returns_404() {
    let app = setup();
    let response = app
        .oneshot(request("DELETE", &format!("{API}/drivers/D00-33-ZZZ")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("D00-33-ZZZ"));
}

#[tokio::test]
async fn full_driver_lifecycle() {
    let app = setup();

    let driver = add_alice(&app).await;
    let driver_id = driver["driver_id"].as_str().unwrap().to_string();
    let driver_identity = driver["id"].as_str().unwrap().to_string();

    let package = add_box(&app, &driver_identity, "Box1", None).await;
    assert!(package["package_id"].as_str().unwrap().starts_with('P'));

    let res = app
        .clone()
        .oneshot(request("DELETE", &format!("{API}/drivers/{driver_id}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["acknowledged"], true);
    assert_eq!(body["deletedDriverCount"], 1);
    assert_eq!(body["deletedPackageCount"], 1);

    let res = app.oneshot(request("GET", "/health")).await.unwrap();
    let health = body_json(res).await;
    assert_eq!(health["drivers"], 0);
    assert_eq!(health["packages"], 0);
}

#[tokio::test]
async fn drivers_grouped_by_department() {
    let app = setup();
    add_alice(&app).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{API}/drivers/add"),
            json!({
                "driver_name": "Bob",
                "driver_department": "furniture",
                "driver_licence": "XY789",
                "driver_isActive": false
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .oneshot(request("GET", &format!("{API}/drivers/by-department")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let groups = body_json(res).await;
    let groups = groups.as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["department"], "food");
    assert_eq!(groups[1]["department"], "furniture");
    assert_eq!(groups[1]["drivers"][0]["driver_isActive"], false);
}

#[tokio::test]
async fn form_add_driver_redirects_to_listing() {
    let app = setup();
    let res = app
        .clone()
        .oneshot(form_request(
            "/logistics/add-driver-post",
            "driver_name=Carol&driver_department=electronic&driver_licence=CD456&driver_isActive=on",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/logistics/view-drivers");

    let res = app
        .oneshot(request("GET", "/logistics/view-drivers"))
        .await
        .unwrap();
    let drivers = body_json(res).await;
    assert_eq!(drivers[0]["driver_name"], "Carol");
    assert_eq!(drivers[0]["driver_isActive"], true);
}

#[tokio::test]
async fn form_errors_redirect_to_invalid_data() {
    let app = setup();
    let res = app
        .clone()
        .oneshot(form_request(
            "/logistics/add-driver-post",
            "driver_name=C4rol&driver_department=electronic&driver_licence=CD456",
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/logistics/invalid-data");

    let res = app
        .clone()
        .oneshot(request("GET", "/logistics/delete-driver-submit"))
        .await
        .unwrap();
    assert_eq!(location(&res), "/logistics/invalid-data");

    let res = app
        .oneshot(request("GET", "/logistics/invalid-data"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["error"], "invalid data");
}

#[tokio::test]
async fn form_package_flow_round_trips_through_business_ids() {
    let app = setup();
    let driver = add_alice(&app).await;
    let driver_identity = driver["id"].as_str().unwrap();

    let res = app
        .clone()
        .oneshot(form_request(
            "/logistics/add-package-post",
            &format!(
                "title=Chairs&weight=12.5&destination=Brisbane&description=fragile&driverID={driver_identity}&isAllocated=on"
            ),
        ))
        .await
        .unwrap();
    assert_eq!(location(&res), "/logistics/view-packages");

    let res = app
        .clone()
        .oneshot(request("GET", "/logistics/view-packages"))
        .await
        .unwrap();
    let packages = body_json(res).await;
    assert_eq!(packages[0]["package_title"], "Chairs");
    assert_eq!(packages[0]["isAllocated"], true);
    assert_eq!(packages[0]["description"], "fragile");
    let package_id = packages[0]["package_id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(form_request(
            "/logistics/delete-package-post",
            &format!("packageId={package_id}"),
        ))
        .await
        .unwrap();
    assert_eq!(location(&res), "/logistics/view-packages");

    let res = app
        .oneshot(request("GET", "/logistics/view-packages"))
        .await
        .unwrap();
    assert!(body_json(res).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_counts_records() {
    let app = setup();
    let driver = add_alice(&app).await;
    add_box(&app, driver["id"].as_str().unwrap(), "Box1", None).await;

    let res = app.oneshot(request("GET", "/logistics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["driverCount"], 1);
    assert_eq!(body["packageCount"], 1);
}

#[tokio::test]
async fn form_delete_driver_cascades() {
    let app = setup();
    let driver = add_alice(&app).await;
    let driver_id = driver["driver_id"].as_str().unwrap();
    add_box(&app, driver["id"].as_str().unwrap(), "Box1", None).await;

    let res = app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/logistics/delete-driver-submit?id={driver_id}"),
        ))
        .await
        .unwrap();
    assert_eq!(location(&res), "/logistics/view-drivers");

    let res = app.oneshot(request("GET", "/health")).await.unwrap();
    let health = body_json(res).await;
    assert_eq!(health["drivers"], 0);
    assert_eq!(health["packages"], 0);
}

#[tokio::test]
async fn unknown_path_returns_404() {
    let app = setup();
    let response = app
        .oneshot(request("GET", "/logistics/nowhere"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn numeric_strings_are_accepted_for_weight() {
    let app = setup();
    let driver = add_alice(&app).await;

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("{API}/packages/add"),
            json!({
                "package_title": "Box1",
                "package_weight": "2.5",
                "package_destination": "Sydney",
                "isAllocated": "true",
                "driver_id": driver["id"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn wrong_typed_fields_return_json_400() {
    let app = setup();
    let res = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("{API}/drivers/add"),
            json!({
                "driver_name": "Alice",
                "driver_department": "food",
                "driver_licence": "AB123",
                "driver_isActive": "maybe"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());

    let res = app
        .oneshot(json_request(
            "POST",
            &format!("{API}/packages/add"),
            json!({
                "package_title": "Box1",
                "package_weight": "heavy",
                "package_destination": "Sydney",
                "driver_id": "00000000-0000-0000-0000-000000000000"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());
}

#[tokio::test]
async fn malformed_package_identity_returns_json_400() {
    let app = setup();
    let res = app
        .oneshot(request("DELETE", &format!("{API}/packages/not-a-uuid")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());
}

#[tokio::test]
async fn body_without_content_type_returns_json_400() {
    let app = setup();
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("{API}/drivers/add"))
                .body(Body::from(r#"{"driver_name":"Alice"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());
}
