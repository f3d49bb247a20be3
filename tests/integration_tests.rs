use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fleetdesk::config::{AppConfig, AuthMode, MutationPolicy};
use fleetdesk::db;
use fleetdesk::handlers;
use fleetdesk::services::identity;
use fleetdesk::services::identity::proxy::{self, SIGNATURE_HEADER, SUBJECT_HEADER};
use fleetdesk::state::AppState;

// ── Helpers ──

const ADMIN: &str = "admin-1";
const ALICE: &str = "alice";
const BOB: &str = "bob";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        auth_mode: AuthMode::Proxy,
        identity_secret: "".to_string(), // empty = identity headers are trusted as-is
        booking_auto_confirm: false,
        mutation_policy: MutationPolicy::AdminOnly,
        seed_database: true,
        cors_permissive: false,
    }
}

fn test_app_with(config: AppConfig) -> Router {
    let conn = db::init_db(":memory:").unwrap();
    db::seed::seed_fleet(&conn).unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        identity: identity::from_config(&config),
        config,
    });
    handlers::router(state)
}

fn test_app() -> Router {
    test_app_with(test_config())
}

fn request(method: &str, uri: &str, subject: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(subject) = subject {
        builder = builder.header(SUBJECT_HEADER, subject);
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Makes `ADMIN` the first user ever seen, and therefore an admin.
async fn bootstrap_admin(app: &Router) {
    let (status, json) = send(app, request("GET", "/api/auth/user", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["role"], "admin");
}

async fn car_id_by_model(app: &Router, model: &str) -> i64 {
    let (_, cars) = send(app, request("GET", "/api/cars", None, None)).await;
    cars.as_array()
        .unwrap()
        .iter()
        .find(|c| c["model"] == model)
        .and_then(|c| c["id"].as_i64())
        .unwrap()
}

fn booking_body(car_id: i64, start: &str, end: &str) -> Value {
    json!({ "carId": car_id, "startDate": start, "endDate": end })
}

fn new_car_body() -> Value {
    json!({
        "make": "Mazda",
        "model": "MX-5",
        "year": 2022,
        "color": "Red",
        "transmission": "manual",
        "fuelType": "petrol",
        "dailyRate": "70.00",
        "imageUrl": "https://example.com/mx5.jpg",
        "features": ["Convertible"]
    })
}

// ── Health & Identity ──

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, json) = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_current_user_requires_identity() {
    let app = test_app();
    let (status, json) = send(&app, request("GET", "/api/auth/user", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Unauthorized");
}

#[tokio::test]
async fn test_first_user_is_admin_second_is_user() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let (status, json) = send(&app, request("GET", "/api/auth/user", Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], ALICE);
    assert_eq!(json["role"], "user");

    // Logging in again keeps the admin role.
    let (_, json) = send(&app, request("GET", "/api/auth/user", Some(ADMIN), None)).await;
    assert_eq!(json["role"], "admin");
}

#[tokio::test]
async fn test_signed_identity_headers() {
    let mut config = test_config();
    config.identity_secret = "topsecret".to_string();
    let app = test_app_with(config);

    let signature = proxy::sign("topsecret", &[(SUBJECT_HEADER, ALICE)]).unwrap();
    let signed = Request::builder()
        .uri("/api/auth/user")
        .header(SUBJECT_HEADER, ALICE)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, signed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], ALICE);

    let forged = Request::builder()
        .uri("/api/auth/user")
        .header(SUBJECT_HEADER, BOB)
        .header(SIGNATURE_HEADER, "bm90IGEgc2lnbmF0dXJl")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dev_mode_identity() {
    let mut config = test_config();
    config.auth_mode = AuthMode::Dev;
    let app = test_app_with(config);

    let (status, json) = send(&app, request("GET", "/api/auth/user", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "dev-user-1");
    assert_eq!(json["role"], "admin");
}

// ── Cars ──

#[tokio::test]
async fn test_list_cars_seeded() {
    let app = test_app();
    let (status, json) = send(&app, request("GET", "/api/cars", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let cars = json.as_array().unwrap();
    assert_eq!(cars.len(), 4);
    assert_eq!(cars[0]["make"], "Toyota");
    assert_eq!(cars[0]["dailyRate"], "55.00");
    assert_eq!(cars[0]["fuelType"], "hybrid");
    assert_eq!(cars[0]["status"], "available");
}

#[tokio::test]
async fn test_list_cars_filters() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let (status, json) = send(
        &app,
        request("GET", "/api/cars?status=available&search=cam", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cars = json.as_array().unwrap();
    assert_eq!(cars.len(), 1);
    assert_eq!(cars[0]["model"], "Camry");

    // Put the Tesla into maintenance; status filter alone then splits the fleet.
    let tesla = car_id_by_model(&app, "Model 3").await;
    let (status, _) = send(
        &app,
        request(
            "PUT",
            &format!("/api/cars/{tesla}"),
            Some(ADMIN),
            Some(json!({ "status": "maintenance" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, request("GET", "/api/cars?status=available", None, None)).await;
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (_, json) = send(&app, request("GET", "/api/cars?search=MODEL", None, None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (_, json) = send(
        &app,
        request("GET", "/api/cars?status=available&search=model", None, None),
    )
    .await;
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_car_not_found() {
    let app = test_app();
    let (status, json) = send(&app, request("GET", "/api/cars/999", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Car not found");

    let (status, _) = send(&app, request("GET", "/api/cars/abc", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_car_requires_admin() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let (status, _) = send(&app, request("POST", "/api/cars", None, Some(new_car_body()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) =
        send(&app, request("POST", "/api/cars", Some(ALICE), Some(new_car_body()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["message"].as_str().unwrap().contains("Forbidden"));

    let (status, json) =
        send(&app, request("POST", "/api/cars", Some(ADMIN), Some(new_car_body()))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["model"], "MX-5");
    assert_eq!(json["status"], "available");
    assert_eq!(json["features"], json!(["Convertible"]));
    assert!(json["description"].is_null());

    let (_, cars) = send(&app, request("GET", "/api/cars", None, None)).await;
    assert_eq!(cars.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_create_car_validation_names_field() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let mut body = new_car_body();
    body["dailyRate"] = json!(0);
    let (status, json) = send(&app, request("POST", "/api/cars", Some(ADMIN), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "dailyRate");

    let mut body = new_car_body();
    body.as_object_mut().unwrap().remove("make");
    body["fuelType"] = json!("steam");
    let (status, json) = send(&app, request("POST", "/api/cars", Some(ADMIN), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "make");
    assert_eq!(json["message"], "make is required");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/cars")
        .header(SUBJECT_HEADER, ADMIN)
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_oversized_daily_rate_is_rejected_and_api_stays_up() {
    let app = test_app();
    bootstrap_admin(&app).await;

    let mut body = new_car_body();
    body["dailyRate"] = json!("79228162514264337593543950335");
    let (status, json) = send(&app, request("POST", "/api/cars", Some(ADMIN), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "dailyRate");

    let mut body = new_car_body();
    body["dailyRate"] = json!("70.005");
    let (status, json) = send(&app, request("POST", "/api/cars", Some(ADMIN), Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "dailyRate");

    let camry = car_id_by_model(&app, "Camry").await;
    let (status, json) = send(
        &app,
        request(
            "PUT",
            &format!("/api/cars/{camry}"),
            Some(ADMIN),
            Some(json!({ "dailyRate": "100000000" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "dailyRate");

    let mut body = new_car_body();
    body["dailyRate"] = json!("99999999.99");
    let (status, car) = send(&app, request("POST", "/api/cars", Some(ADMIN), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(car["id"].as_i64().unwrap(), "2025-06-16", "2025-06-18")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["totalPrice"], "199999999.98");

    let (status, cars) = send(&app, request("GET", "/api/cars", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cars.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_update_car_null_description_clears_it() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;
    let uri = format!("/api/cars/{camry}");

    let (_, before) = send(&app, request("GET", &uri, None, None)).await;
    assert!(before["description"].is_string());

    let (status, json) =
        send(&app, request("PUT", &uri, Some(ADMIN), Some(json!({ "color": "Grey" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["description"], before["description"]);

    let (status, json) =
        send(&app, request("PUT", &uri, Some(ADMIN), Some(json!({ "description": null })))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["description"].is_null());

    let (_, after) = send(&app, request("GET", &uri, None, None)).await;
    assert!(after["description"].is_null());
}

#[tokio::test]
async fn test_update_car() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, json) = send(
        &app,
        request(
            "PUT",
            &format!("/api/cars/{camry}"),
            Some(ADMIN),
            Some(json!({ "dailyRate": 60.5, "color": "Grey" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dailyRate"], "60.5");
    assert_eq!(json["color"], "Grey");
    assert_eq!(json["make"], "Toyota");

    let (status, json) = send(
        &app,
        request(
            "PUT",
            &format!("/api/cars/{camry}"),
            Some(ADMIN),
            Some(json!({ "transmission": "cvt" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "transmission");

    let (status, _) = send(
        &app,
        request("PUT", "/api/cars/999", Some(ADMIN), Some(json!({ "color": "Grey" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/cars/{camry}"), Some(ALICE), Some(json!({ "color": "Pink" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_car() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let bmw = car_id_by_model(&app, "M4").await;

    let (status, _) = send(&app, request("DELETE", &format!("/api/cars/{bmw}"), None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) =
        send(&app, request("DELETE", &format!("/api/cars/{bmw}"), Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) =
        send(&app, request("DELETE", &format!("/api/cars/{bmw}"), Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_booked_car_is_refused() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-18")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) =
        send(&app, request("DELETE", &format!("/api/cars/{camry}"), Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["message"].as_str().unwrap().contains("existing bookings"));

    let (status, _) = send(&app, request("GET", &format!("/api/cars/{camry}"), None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_open_policy_allows_anonymous_delete() {
    let mut config = test_config();
    config.mutation_policy = MutationPolicy::Open;
    let app = test_app_with(config);
    let bmw = car_id_by_model(&app, "M4").await;

    let (status, _) = send(&app, request("DELETE", &format!("/api/cars/{bmw}"), None, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_quote() {
    let app = test_app();
    let tesla = car_id_by_model(&app, "Model 3").await;

    let (status, json) = send(
        &app,
        request(
            "GET",
            &format!("/api/cars/{tesla}/quote?startDate=2025-06-16&endDate=2025-06-18"),
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["days"], 2);
    assert_eq!(json["rentalTotal"], "170.00");
    assert_eq!(json["serviceFee"], "25.00");
    assert_eq!(json["insuranceFee"], "15.00");
    assert_eq!(json["total"], "210.00");

    let (status, json) = send(
        &app,
        request("GET", &format!("/api/cars/{tesla}/quote"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid date range");
}

// ── Bookings ──

#[tokio::test]
async fn test_create_booking_requires_identity() {
    let app = test_app();
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            None,
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Unauthorized");
}

#[tokio::test]
async fn test_create_booking_computes_price() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;

    let mut body = booking_body(camry, "2025-06-16T00:00:00Z", "2025-06-19T00:00:00Z");
    body["totalPrice"] = json!("1.00");
    body["userId"] = json!(BOB);
    body["status"] = json!("confirmed");

    let (status, json) = send(&app, request("POST", "/api/bookings", Some(ALICE), Some(body))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["totalPrice"], "165.00");
    assert_eq!(json["userId"], ALICE);
    assert_eq!(json["status"], "pending");
    assert_eq!(json["paymentStatus"], "pending");
    assert_eq!(json["carId"], camry);

    // Car status is a label only; booking does not flip it.
    let (_, car) = send(&app, request("GET", &format!("/api/cars/{camry}"), None, None)).await;
    assert_eq!(car["status"], "available");
}

#[tokio::test]
async fn test_create_booking_partial_day_rounds_up() {
    let app = test_app();
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16T09:00:00Z", "2025-06-17T10:00:00Z")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["totalPrice"], "110.00");
}

#[tokio::test]
async fn test_create_booking_rejections() {
    let app = test_app();
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-19", "2025-06-16")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid date range");
    assert_eq!(json["field"], "startDate");

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(999, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Car not found");

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(BOB),
            Some(booking_body(camry, "2025-06-18", "2025-06-21")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Car is not available for the selected dates");
    assert!(json.get("field").is_none());

    // Back-to-back is fine.
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(BOB),
            Some(booking_body(camry, "2025-06-19", "2025-06-21")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_auto_confirm_policy() {
    let mut config = test_config();
    config.booking_auto_confirm = true;
    let app = test_app_with(config);
    let camry = car_id_by_model(&app, "Camry").await;

    let (status, json) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["status"], "confirmed");
}

#[tokio::test]
async fn test_simultaneous_bookings_cannot_double_book() {
    let app = test_app();
    let camry = car_id_by_model(&app, "Camry").await;

    let first = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-07-01", "2025-07-05")),
        ),
    );
    let second = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(BOB),
            Some(booking_body(camry, "2025-07-01", "2025-07-05")),
        ),
    );
    let ((status_a, _), (status_b, _)) = tokio::join!(first, second);

    let mut statuses = [status_a, status_b];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
}

#[tokio::test]
async fn test_list_bookings_scoped_by_identity() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;
    let tesla = car_id_by_model(&app, "Model 3").await;

    for (who, car, start, end) in [
        (ALICE, camry, "2025-06-01", "2025-06-03"),
        (BOB, camry, "2025-06-05", "2025-06-07"),
        (ALICE, tesla, "2025-06-05", "2025-06-07"),
    ] {
        let (status, _) = send(
            &app,
            request("POST", "/api/bookings", Some(who), Some(booking_body(car, start, end))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = send(&app, request("GET", "/api/bookings", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));

    let (_, json) = send(&app, request("GET", "/api/bookings", Some(ALICE), None)).await;
    let mine = json.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|b| b["userId"] == ALICE));
    assert_eq!(mine[1]["car"]["model"], "Model 3");

    let (_, json) = send(&app, request("GET", "/api/bookings", Some(BOB), None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (_, json) = send(&app, request("GET", "/api/bookings", Some(ADMIN), None)).await;
    let all = json.as_array().unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|b| b["car"]["id"].is_i64()));
}

#[tokio::test]
async fn test_update_booking_status() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;

    let (_, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    let uri = format!("/api/bookings/{}/status", booking["id"]);

    let (status, _) = send(
        &app,
        request("PATCH", &uri, Some(ALICE), Some(json!({ "status": "confirmed" }))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send(&app, request("PATCH", &uri, None, Some(json!({ "status": "confirmed" })))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(
        &app,
        request("PATCH", &uri, Some(ADMIN), Some(json!({ "status": "confirmed" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "confirmed");

    let (status, json) = send(
        &app,
        request("PATCH", &uri, Some(ADMIN), Some(json!({ "status": "lost" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["field"], "status");

    let (status, json) = send(
        &app,
        request(
            "PATCH",
            "/api/bookings/999/status",
            Some(ADMIN),
            Some(json!({ "status": "cancelled" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Booking not found");

    // Cancelling frees the dates.
    let (status, _) = send(
        &app,
        request("PATCH", &uri, Some(ADMIN), Some(json!({ "status": "cancelled" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(BOB),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_open_policy_allows_any_status_change() {
    let mut config = test_config();
    config.mutation_policy = MutationPolicy::Open;
    let app = test_app_with(config);
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;

    let (_, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    let uri = format!("/api/bookings/{}/status", booking["id"]);

    let (status, json) = send(
        &app,
        request("PATCH", &uri, Some(ALICE), Some(json!({ "status": "completed" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");

    let (status, _) =
        send(&app, request("PATCH", &uri, None, Some(json!({ "status": "cancelled" })))).await;
    assert_eq!(status, StatusCode::OK);
}

// ── Admin ──

#[tokio::test]
async fn test_admin_stats() {
    let app = test_app();
    bootstrap_admin(&app).await;
    let camry = car_id_by_model(&app, "Camry").await;
    let bmw = car_id_by_model(&app, "M4").await;

    let (_, booking) = send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(ALICE),
            Some(booking_body(camry, "2025-06-16", "2025-06-19")),
        ),
    )
    .await;
    send(
        &app,
        request(
            "POST",
            "/api/bookings",
            Some(BOB),
            Some(booking_body(bmw, "2025-06-16", "2025-06-17")),
        ),
    )
    .await;
    send(
        &app,
        request(
            "PATCH",
            &format!("/api/bookings/{}/status", booking["id"]),
            Some(ADMIN),
            Some(json!({ "status": "confirmed" })),
        ),
    )
    .await;

    let (status, _) = send(&app, request("GET", "/api/admin/stats", Some(ALICE), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = send(&app, request("GET", "/api/admin/stats", Some(ADMIN), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["totalRevenue"], "315.00");
    assert_eq!(json["activeBookings"], 1);
    assert_eq!(json["totalCars"], 4);
}
