use axum::http::{Method, StatusCode};
use serde_json::json;
use staffdesk_backend::models::system_user::Role;

mod support;

use support::{
    integration_guard, seed_system_user, send, test_app, test_pool, token_for, unique_glovo_id,
};

#[tokio::test]
async fn audit_trail_is_filterable_and_summarized() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let root = seed_system_user(&pool, Role::SuperAdmin, None).await;
    let token = token_for(&root);
    let app = test_app(pool.clone());
    let glovo_id = unique_glovo_id();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/employees",
        Some(&token),
        Some(json!({ "glovo_id": glovo_id, "first_name": "Audit", "hours": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!(
        "/api/audit-logs?entity_type=employee&user_id={}&search={}",
        root.email, glovo_id
    );
    let (status, logs) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", logs);
    let logs = logs.as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action"], "create_employee");
    assert_eq!(logs[0]["user_role"], "super_admin");
    assert_eq!(logs[0]["entity_id"], glovo_id.as_str());
    assert!(logs[0]["request_id"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/audit-logs?limit=0", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/audit-logs?start_date=yesterday",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, stats) = send(
        &app,
        Method::GET,
        "/api/audit-logs/stats",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["total"].as_i64().unwrap() >= 1);
    assert!(stats["by_action"]
        .as_array()
        .unwrap()
        .iter()
        .any(|row| row["label"] == "create_employee"));
}
