use axum::http::{Method, StatusCode};
use chrono::Duration;
use chrono_tz::Europe::Madrid;
use serde_json::{json, Value};
use staffdesk_backend::{models::system_user::Role, utils::time::today_local};
use uuid::Uuid;

mod support;

use support::{
    audit_actions_for, integration_guard, seed_employee, seed_system_user, send, test_app,
    test_pool, token_for, unique_glovo_id,
};

async fn import(
    app: &axum::Router,
    token: &str,
    rows: Value,
    dry_run: bool,
) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/employees/bulk-import",
        Some(token),
        Some(json!({ "employees": rows, "dry_run": dry_run })),
    )
    .await
}

#[tokio::test]
async fn empty_and_invalid_batches_are_rejected() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let root = seed_system_user(&pool, Role::SuperAdmin, None).await;
    let token = token_for(&root);
    let app = test_app(pool.clone());

    let (status, _) = import(&app, &token, json!([]), false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let valid_id = unique_glovo_id();
    let rows = json!([
        { "glovo_id": valid_id, "nombre": "Ana" },
        { "glovo_id": unique_glovo_id() },
    ]);
    let (status, body) = import(&app, &token, rows, false).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["details"]["errors"],
        json!(["Row 3: first_name is required"])
    );

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/employees/{}", valid_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dry_run_normalizes_without_writing() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let root = seed_system_user(&pool, Role::SuperAdmin, None).await;
    let token = token_for(&root);
    let app = test_app(pool.clone());
    let glovo_id = unique_glovo_id();

    let rows = json!([{
        "idGlovo": glovo_id,
        "nombre": " Pablo ",
        "horas": "19.6",
        "ciudad": "gRANADA",
        "fechaIncidencia": "05/06/2024",
        "informadoHorario": "Sí",
    }]);
    let (status, body) = import(&app, &token, rows, true).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["dry_run"], true);
    assert_eq!(body["imported"], 0);
    assert_eq!(body["notification_id"], Value::Null);
    let row = &body["employees"][0];
    assert_eq!(row["glovo_id"], glovo_id.as_str());
    assert_eq!(row["first_name"], "Pablo");
    assert_eq!(row["hours"], 20);
    assert_eq!(row["city"], "Granada");
    assert_eq!(row["incident_date"], "2024-06-05");
    assert_eq!(row["schedule_informed"], true);
    assert_eq!(row["status"], "active");

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM employees WHERE glovo_id = $1)")
            .bind(&glovo_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(!exists);
}

#[tokio::test]
async fn import_upserts_rows_and_records_notification() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let root = seed_system_user(&pool, Role::SuperAdmin, None).await;
    let token = token_for(&root);
    let app = test_app(pool.clone());
    let existing = seed_employee(&pool, Some(20), "Madrid").await;
    let new_id = unique_glovo_id();
    let fleet = format!("Fleet{}", Uuid::new_v4().simple());
    let city = format!("Villa{}", Uuid::new_v4().as_u128() % 1_000_000);

    let rows = json!([
        {
            "glovo_id": existing.glovo_id,
            "first_name": "Lucia",
            "hours": 38,
            "phone": "600000001",
        },
        {
            "glovo_id": new_id,
            "first_name": "Nuevo",
            "hours": 10,
            "flota": fleet,
            "ciudad": city,
        },
    ]);
    let (status, body) = import(&app, &token, rows, false).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["imported"], 2);
    let notification_id = body["notification_id"].as_i64().unwrap();

    let (kind, state, requested_by): (String, String, String) = sqlx::query_as(
        "SELECT type, status, requested_by FROM notifications WHERE id = $1",
    )
    .bind(notification_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(kind, "bulk_upload");
    assert_eq!(state, "processed");
    assert_eq!(requested_by, root.email);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/employees/{}", existing.glovo_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["hours"], 38);
    assert_eq!(body["cdp"], 100);
    assert_eq!(body["phone"], "600000001");
    assert_eq!(body["created_at"], json!(existing.created_at));

    let (status, body) = send(&app, Method::GET, "/api/fleets", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().any(|f| f == fleet.as_str()));

    for uri in ["/api/cities", "/api/ciudades"] {
        let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let cities = body.as_array().unwrap();
        assert!(cities.iter().any(|c| c == city.as_str()));
        assert!(cities.iter().all(|c| !c.as_str().unwrap().trim().is_empty()));
    }

    let import_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM audit_logs WHERE action = 'bulk_import_employees' \
         AND new_data->>'notification_id' = $1",
    )
    .bind(notification_id.to_string())
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(import_rows, 1);
    assert!(audit_actions_for(&pool, &new_id).await.is_empty());
}

#[tokio::test]
async fn import_keeps_hours_parked_by_running_penalization() {
    let _guard = integration_guard().await;
    let Some(pool) = test_pool().await else { return };
    let employee = seed_employee(&pool, Some(30), "Madrid").await;
    let root = seed_system_user(&pool, Role::SuperAdmin, None).await;
    let token = token_for(&root);
    let app = test_app(pool.clone());
    let uri = format!("/api/employees/{}", employee.glovo_id);
    let today = today_local(&Madrid);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/penalize", uri),
        Some(&token),
        Some(json!({
            "start_date": today.to_string(),
            "end_date": (today + Duration::days(5)).to_string(),
            "observations": "Late deliveries",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let rows = json!([{ "glovo_id": employee.glovo_id, "first_name": "Lucia", "hours": 32 }]);
    let (status, body) = import(&app, &token, rows, false).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let row = &body["employees"][0];
    assert_eq!(row["status"], "penalized");
    assert_eq!(row["hours"], 0);
    assert_eq!(row["cdp"], 0);
    assert_eq!(row["original_hours"], 32);
    assert_eq!(row["suspension_kind"], "penalization");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("{}/remove-penalization", uri),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["employee"]["status"], "active");
    assert_eq!(body["employee"]["hours"], 32);
    assert_eq!(body["employee"]["original_hours"], Value::Null);
}
