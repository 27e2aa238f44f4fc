/// Router tests that need no database
///
/// The app runs over a pool that never connects, so every assertion here is
/// about behavior decided before the first query: routing, session checks,
/// request validation and response headers.

mod common;

use axum::http::{Method, StatusCode};
use common::{offline_app, send, token_for, TEST_JWT_SECRET};
use phaseplan_shared::{
    auth::jwt::{create_token, Claims},
    models::user::UserRole,
};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = offline_app();
    let id = Uuid::new_v4();

    for (method, uri) in [
        (Method::GET, "/api/projects".to_string()),
        (Method::POST, "/api/projects".to_string()),
        (Method::GET, format!("/api/projects/{}", id)),
        (Method::PATCH, format!("/api/phases/{}", id)),
        (Method::POST, format!("/api/phases/{}/tasks", id)),
        (Method::DELETE, format!("/api/tasks/{}", id)),
        (Method::GET, "/api/auth/session".to_string()),
    ] {
        let (status, _, body) = send(&app, method.clone(), &uri, None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_invalid_tokens_rejected() {
    let app = offline_app();

    let (status, _, _) = send(&app, Method::GET, "/api/projects", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = create_token(
        &Claims::new(Uuid::new_v4(), UserRole::User),
        "a-different-secret-that-is-also-32-bytes-long",
    )
    .unwrap();
    let (status, _, _) = send(&app, Method::GET, "/api/projects", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut expired = Claims::new(Uuid::new_v4(), UserRole::User);
    expired.iat -= 31 * 60;
    expired.nbf -= 31 * 60;
    expired.exp -= 31 * 60;
    let expired = create_token(&expired, TEST_JWT_SECRET).unwrap();
    let (status, _, _) = send(&app, Method::GET, "/api/projects", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_describes_caller() {
    let app = offline_app();
    let user_id = Uuid::new_v4();

    let (status, _, body) = send(
        &app,
        Method::GET,
        "/api/auth/session",
        Some(&token_for(user_id)),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id.to_string());
    assert_eq!(body["role"], "USER");
    assert!(body["expiresAt"].is_string());
}

#[tokio::test]
async fn test_create_project_validation() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4());

    let cases = [
        (
            json!({"title": "Site", "startDate": "2025-01-01"}),
            "totalBilledHours",
            "Total billed hours is required",
        ),
        (
            json!({"title": "Site", "totalBilledHours": 100}),
            "startDate",
            "Start date is required",
        ),
        (
            json!({"title": "  ", "totalBilledHours": 100, "startDate": "2025-01-01"}),
            "title",
            "Title is required",
        ),
        (
            json!({"title": "Site", "totalBilledHours": -1, "startDate": "2025-01-01"}),
            "totalBilledHours",
            "Total billed hours must be a non-negative number",
        ),
        (
            json!({
                "title": "Site",
                "totalBilledHours": "40",
                "startDate": "2025-02-01",
                "endDate": "2025-01-01"
            }),
            "endDate",
            "End date cannot be before start date",
        ),
    ];

    for (body, field, message) in cases {
        let (status, _, response) =
            send(&app, Method::POST, "/api/projects", Some(&token), Some(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], message);
        assert_eq!(response["details"][0]["field"], field);
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = offline_app();
    let token = token_for(Uuid::new_v4());

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/projects",
        Some(&token),
        Some(json!({"title": "Site", "totalBilledHours": "lots", "startDate": "2025-01-01"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_register_validation() {
    let app = offline_app();

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"email": "not-an-email", "name": "Ann", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email address");

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/register",
        None,
        Some(json!({"email": "ann@example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_with_malformed_token() {
    let app = offline_app();

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/auth/reset-password",
        None,
        Some(json!({"token": "short", "password": "new"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = offline_app();

    let (status, headers, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body.get("migrations").is_none());

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = offline_app();
    let (status, _, _) = send(&app, Method::GET, "/api/unknown", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
