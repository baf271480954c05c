use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::router::booking_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

async fn create_test_app(config: AppConfig) -> Router {
    booking_routes(Arc::new(config))
}

fn mock_config(mock_server: &MockServer) -> AppConfig {
    AppConfig {
        store_url: mock_server.uri(),
        store_api_key: "test-api-key".to_string(),
        jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn book_request_body(professional_id: Uuid, service_ids: &[Uuid], start_time: &str) -> String {
    json!({
        "professional_id": professional_id,
        "start_time": start_time,
        "service_ids": service_ids,
        "notes": "first visit"
    })
    .to_string()
}

// 2030-06-03 is a Monday; the mock schedule opens 09:00-12:00 and
// 14:00-18:00 that day.
const START_IN_WINDOW: &str = "2030-06-03T09:00:00Z";

async fn mount_service_catalog(mock_server: &MockServer, service_ids: &[Uuid]) {
    let rows: Vec<serde_json::Value> = service_ids
        .iter()
        .map(|id| MockStoreResponses::service_row(&id.to_string(), "Cut & Style", 30))
        .collect();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(rows)))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_book_appointment_success() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let professional_id = Uuid::new_v4();
    let service_ids = vec![Uuid::new_v4()];

    mount_service_catalog(&mock_server, &service_ids).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_row(&professional_id.to_string(), 1)
        ])))
        .mount(&mock_server)
        .await;

    // No existing bookings in the requested range
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id.to_string(),
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            professional_id,
            &service_ids,
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["status"], "pending");
    assert_eq!(json_response["professional_id"], professional_id.to_string());
}

#[tokio::test]
async fn test_book_appointment_conflict_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let professional_id = Uuid::new_v4();
    let service_ids = vec![Uuid::new_v4()];

    mount_service_catalog(&mock_server, &service_ids).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_row(&professional_id.to_string(), 1)
        ])))
        .mount(&mock_server)
        .await;

    // An active appointment already occupies 09:00-09:30
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id.to_string(),
                &Uuid::new_v4().to_string(),
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            professional_id,
            &service_ids,
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_book_appointment_cancelled_booking_does_not_block() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let professional_id = Uuid::new_v4();
    let service_ids = vec![Uuid::new_v4()];

    mount_service_catalog(&mock_server, &service_ids).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::availability_row(&professional_id.to_string(), 1)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id.to_string(),
                &Uuid::new_v4().to_string(),
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "cancelled"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id.to_string(),
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            professional_id,
            &service_ids,
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_book_appointment_outside_working_hours() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let professional_id = Uuid::new_v4();
    let service_ids = vec![Uuid::new_v4()];

    mount_service_catalog(&mock_server, &service_ids).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/professional_availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::closed_day_row(&professional_id.to_string(), 1)
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            professional_id,
            &service_ids,
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_book_appointment_unknown_service() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            Uuid::new_v4(),
            &[Uuid::new_v4()],
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_appointment_requires_token() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config).await;

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(book_request_body(
            Uuid::new_v4(),
            &[Uuid::new_v4()],
            START_IN_WINDOW,
        )))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cancel_appointment_as_client() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let professional_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id,
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional_id,
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "cancelled"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri(&format!("/{}/cancel", appointment_id))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "reason": "schedule change" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["status"], "cancelled");
}

#[tokio::test]
async fn test_cancel_completed_appointment_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "completed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri(&format!("/{}/cancel", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "reason": "too late" }).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_confirm_appointment_as_professional() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let professional = TestUser::professional("pro@example.com");
    let token = JwtTestUtils::create_test_token(&professional, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional.id,
                &Uuid::new_v4().to_string(),
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional.id,
                &Uuid::new_v4().to_string(),
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "confirmed"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri(&format!("/{}/confirm", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["status"], "confirmed");
}

#[tokio::test]
async fn test_confirm_appointment_rejected_for_client() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &user.id,
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri(&format!("/{}/confirm", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_appointments_for_own_dashboard() {
    let mock_server = MockServer::start().await;
    let config = mock_config(&mock_server);
    let app = create_test_app(config.clone()).await;

    let professional = TestUser::professional("pro@example.com");
    let token = JwtTestUtils::create_test_token(&professional, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::appointment_row(
                &professional.id,
                &Uuid::new_v4().to_string(),
                "2030-06-03T09:00:00Z",
                "2030-06-03T09:30:00Z",
                "confirmed"
            ),
            MockStoreResponses::appointment_row(
                &professional.id,
                &Uuid::new_v4().to_string(),
                "2030-06-03T10:00:00Z",
                "2030-06-03T10:30:00Z",
                "pending"
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri(&format!(
            "/?professional_id={}&date=2030-06-03",
            professional.id
        ))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json_response = body_json(response).await;
    assert_eq!(json_response["total"], 2);
}

#[tokio::test]
async fn test_list_appointments_rejected_for_other_professional() {
    let config = TestConfig::default().to_app_config();
    let app = create_test_app(config.clone()).await;

    let user = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/?professional_id={}&date=2030-06-03", Uuid::new_v4()))
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
