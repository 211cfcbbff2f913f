use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use staffdesk_backend::docs;
use tower::ServiceExt;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn swagger_router() -> Router {
    let openapi = docs::ApiDoc::openapi();
    Router::new().merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", openapi))
}

#[test]
fn openapi_lists_core_paths_and_bearer_scheme() {
    let openapi = docs::ApiDoc::openapi();
    let json = serde_json::to_value(&openapi).expect("serialize openapi");

    let paths = json
        .get("paths")
        .and_then(|v| v.as_object())
        .expect("paths object");
    for path in [
        "/api/auth/login",
        "/api/employees",
        "/api/employees/{id}/penalize",
        "/api/company-leaves",
        "/api/notifications/{id}/process",
        "/api/system-users/{id}/password",
        "/api/audit-logs/stats",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }

    let bearer = json
        .pointer("/components/securitySchemes/BearerAuth")
        .expect("BearerAuth scheme");
    assert_eq!(bearer.get("type").and_then(Value::as_str), Some("http"));
    assert_eq!(bearer.get("scheme").and_then(Value::as_str), Some("bearer"));
}

#[test]
fn login_is_documented_as_public() {
    let json = serde_json::to_value(docs::ApiDoc::openapi()).expect("serialize openapi");
    let security = json
        .pointer("/paths/~1api~1auth~1login/post/security")
        .and_then(Value::as_array)
        .expect("login security override");
    assert_eq!(security.len(), 1);
    assert!(security[0].as_object().map(|o| o.is_empty()).unwrap_or(false));
}

#[tokio::test]
async fn swagger_ui_routes_respond() {
    let app = swagger_router();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/docs")
                .body(Body::empty())
                .expect("build docs request"),
        )
        .await
        .expect("call swagger ui");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/api/docs/");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-doc/openapi.json")
                .body(Body::empty())
                .expect("build openapi request"),
        )
        .await
        .expect("call openapi json");
    assert_eq!(response.status(), StatusCode::OK);
}
