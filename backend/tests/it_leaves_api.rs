use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use staffdesk_backend::models::system_user::Role;

mod support;

use support::{
    audit_actions_for, integration_guard, seed_employee, seed_system_user, send, test_app,
    test_pool, token_for,
};

#[tokio::test]
async fn it_leave_parks_hours_until_employee_returns() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let employee = seed_employee(&pool, Some(30), "Madrid").await;
    let admin = seed_system_user(&pool, Role::Admin, None).await;
    let token = token_for(&admin);
    let app = test_app(pool.clone());
    let uri = format!("/api/employees/{}", employee.glovo_id);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/it-leave", uri),
        Some(&token),
        Some(json!({ "leave_type": "illness", "leave_date": "2025-02-03" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["employee"]["status"], "it_leave");
    assert_eq!(body["employee"]["hours"], 0);
    assert_eq!(body["employee"]["original_hours"], 30);
    assert_eq!(body["leave"]["status"], "active");
    assert_eq!(body["leave"]["employee_data"]["hours"], 30);
    let leave_id = body["leave"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("{}/it-leave", uri),
        Some(&token),
        Some(json!({ "leave_type": "accident" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, Method::GET, "/api/it-leaves", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|leave| leave["id"] == leave_id));

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "active");
    assert_eq!(body["hours"], 30);
    assert_eq!(body["cdp"], 79);
    assert_eq!(body["original_hours"], Value::Null);

    let (leave_status, ended_by): (String, Option<String>) =
        sqlx::query_as("SELECT status, ended_by FROM it_leaves WHERE id = $1")
            .bind(leave_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(leave_status, "ended");
    assert_eq!(ended_by.as_deref(), Some(admin.email.as_str()));

    assert_eq!(
        audit_actions_for(&pool, &employee.glovo_id).await,
        vec!["set_it_leave", "reactivate_employee_from_it_leave"]
    );
}

#[tokio::test]
async fn it_leave_by_employee_id_is_created() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let employee = seed_employee(&pool, Some(20), "Sevilla").await;
    let admin = seed_system_user(&pool, Role::Admin, None).await;
    let token = token_for(&admin);
    let app = test_app(pool.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/it-leaves",
        Some(&token),
        Some(json!({ "employee_id": employee.glovo_id, "leave_type": "accidente" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["leave"]["leave_type"], "accident");
    assert_eq!(body["employee"]["status"], "it_leave");

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/it-leaves",
        Some(&token),
        Some(json!({ "employee_id": "GLV-MISSING-0", "leave_type": "illness" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
