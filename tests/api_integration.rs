//! End-to-end tests over the assembled router and the in-process store.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use aerosafe::api::{create_api_router, AppState};
use aerosafe::auth::session::session_header_value;
use aerosafe::auth::SESSION_HEADER;
use aerosafe::models::{Principal, Role};

fn app() -> Router {
    create_api_router(AppState::with_memory_store())
}

fn principal(role: Role) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role,
    }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    principal: Option<&Principal>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(p) = principal {
        builder = builder.header(SESSION_HEADER, session_header_value(p));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// ============================================================================
// Gate behavior
// ============================================================================

#[tokio::test]
async fn every_gated_route_is_401_without_a_principal() {
    let app = app();
    let routes = [
        ("GET", "/api/fpl-missions"),
        ("POST", "/api/fpl-missions"),
        ("GET", "/api/fpl-missions/dashboard-stats"),
        ("GET", "/api/fpl-missions/tailboard-document"),
        ("GET", "/api/powra"),
        ("GET", "/api/invoices"),
        ("GET", "/api/users"),
        ("PATCH", "/api/users/deactivate"),
    ];
    for (method, uri) in routes {
        let (status, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "Unauthorized", "{method} {uri}");
    }
}

#[tokio::test]
async fn non_admin_roles_are_forbidden_on_user_management() {
    let app = app();
    for role in [Role::User, Role::Supervisor] {
        let p = principal(role);
        let (status, body) = send(&app, "GET", "/api/users", Some(&p), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }
}

#[tokio::test]
async fn health_check_is_public() {
    let app = app();
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unlisted_methods_get_405() {
    let app = app();
    let p = principal(Role::User);
    let (status, _) = send(&app, "PATCH", "/api/fpl-missions", Some(&p), Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// Document creation & server-assigned fields
// ============================================================================

#[tokio::test]
async fn created_mission_is_draft_and_owned_regardless_of_payload() {
    let app = app();
    let pilot = principal(Role::User);

    // status / ownerId in the payload must not override server assignment
    let (status, body) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({
            "siteId": "SITE002",
            "status": "APPROVED",
            "ownerId": Uuid::new_v4(),
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["ownerId"], pilot.id.to_string());
    assert_eq!(body["payload"]["siteId"], "SITE002");
}

#[tokio::test]
async fn schema_violations_return_400_with_details() {
    let app = app();
    let pilot = principal(Role::User);
    let (status, body) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "", "missionType": "JOYRIDE"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

// ============================================================================
// Status workflow over HTTP
// ============================================================================

#[tokio::test]
async fn user_cannot_approve_but_admin_can() {
    let app = app();
    let pilot = principal(Role::User);
    let admin = principal(Role::Admin);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "SITE002"})),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/fpl-missions/{id}");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&pilot),
        Some(json!({"status": "APPROVED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized to change document status");

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({"status": "APPROVED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");
}

#[tokio::test]
async fn owner_may_submit_for_review_but_not_beyond() {
    let app = app();
    let pilot = principal(Role::User);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "SITE003"})),
    )
    .await;
    let uri = format!("/api/fpl-missions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&pilot),
        Some(json!({"status": "PENDING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&pilot),
        Some(json!({"status": "APPROVED"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_owner_user_cannot_touch_someone_elses_document() {
    let app = app();
    let owner = principal(Role::User);
    let stranger = principal(Role::User);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&owner),
        Some(json!({"siteId": "SITE004"})),
    )
    .await;
    let uri = format!("/api/fpl-missions/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&stranger),
        Some(json!({"status": "PENDING"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn same_status_update_is_idempotent_and_keeps_updated_at() {
    let app = app();
    let pilot = principal(Role::User);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "SITE005"})),
    )
    .await;
    let uri = format!("/api/fpl-missions/{}", created["id"].as_str().unwrap());
    let original_updated_at = created["updatedAt"].clone();

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&pilot),
        Some(json!({"status": "DRAFT"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedAt"], original_updated_at);
}

#[tokio::test]
async fn approved_documents_cannot_return_to_draft() {
    let app = app();
    let admin = principal(Role::Admin);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&admin),
        Some(json!({"siteId": "SITE006"})),
    )
    .await;
    let uri = format!("/api/fpl-missions/{}", created["id"].as_str().unwrap());

    send(&app, "PUT", &uri, Some(&admin), Some(json!({"status": "APPROVED"}))).await;
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({"status": "DRAFT"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // APPROVED can still be revoked back to PENDING
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(json!({"status": "PENDING"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
}

// ============================================================================
// Listing, scoping, pagination
// ============================================================================

#[tokio::test]
async fn pagination_returns_the_remainder_page() {
    let app = app();
    let pilot = principal(Role::User);

    for i in 0..15 {
        let (status, _) = send(
            &app,
            "POST",
            "/api/fpl-missions",
            Some(&pilot),
            Some(json!({"siteId": format!("SITE{i:03}")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        "GET",
        "/api/fpl-missions?page=2&limit=10",
        Some(&pilot),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["currentPage"], 2);
}

#[tokio::test]
async fn extreme_page_number_is_answered_not_dropped() {
    let app = app();
    let pilot = principal(Role::User);

    send(
        &app,
        "POST",
        "/api/powra",
        Some(&pilot),
        Some(json!({"site": "Depot", "taskDescription": "pole survey"})),
    )
    .await;

    // page * limit would overflow u64; the request must still get a page.
    let (status, body) = send(
        &app,
        "GET",
        "/api/powra?page=18446744073709551615&limit=100",
        Some(&pilot),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["totalPages"], 1);
}

#[tokio::test]
async fn users_see_only_their_own_documents_and_supervisors_see_all() {
    let app = app();
    let alice = principal(Role::User);
    let bob = principal(Role::User);
    let supervisor = principal(Role::Supervisor);

    for site in ["A1", "A2"] {
        send(
            &app,
            "POST",
            "/api/powra",
            Some(&alice),
            Some(json!({"site": site, "taskDescription": "inspection"})),
        )
        .await;
    }
    send(
        &app,
        "POST",
        "/api/powra",
        Some(&bob),
        Some(json!({"site": "B1", "taskDescription": "survey"})),
    )
    .await;

    let (_, body) = send(&app, "GET", "/api/powra", Some(&alice), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, "GET", "/api/powra", Some(&supervisor), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 3);
}

// ============================================================================
// Deletion policy
// ============================================================================

#[tokio::test]
async fn owners_delete_only_drafts_elevated_roles_delete_anything() {
    let app = app();
    let pilot = principal(Role::User);
    let supervisor = principal(Role::Supervisor);

    let (_, created) = send(
        &app,
        "POST",
        "/api/powra",
        Some(&pilot),
        Some(json!({"site": "Yard", "taskDescription": "cable pull"})),
    )
    .await;
    let uri = format!("/api/powra/{}", created["id"].as_str().unwrap());

    send(
        &app,
        "PUT",
        &uri,
        Some(&supervisor),
        Some(json!({"status": "APPROVED"})),
    )
    .await;

    let (status, _) = send(&app, "DELETE", &uri, Some(&pilot), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uri, Some(&supervisor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&supervisor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Risk matrices
// ============================================================================

#[tokio::test]
async fn risk_matrix_persists_computed_assessment() {
    let app = app();
    let pilot = principal(Role::User);

    let (status, body) = send(
        &app,
        "POST",
        "/api/fpl-missions/risk-matrix",
        Some(&pilot),
        Some(json!({"answers": [
            {"questionId": "q1", "selectedScore": 1},
            {"questionId": "q2", "selectedScore": 3},
            {"questionId": "q3", "selectedScore": 5},
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["payload"]["assessment"]["totalScore"], 9);
    assert_eq!(body["payload"]["assessment"]["riskLevel"], "Low");
}

#[tokio::test]
async fn score_preview_bands_and_rejections() {
    let app = app();
    let pilot = principal(Role::User);

    // 65 = 30 + 30 + 5 -> VeryHigh
    let (status, body) = send(
        &app,
        "POST",
        "/api/risk-matrix/score",
        Some(&pilot),
        Some(json!({"answers": [
            {"questionId": "q1", "selectedScore": 30},
            {"questionId": "q2", "selectedScore": 30},
            {"questionId": "q3", "selectedScore": 5},
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalScore"], 65);
    assert_eq!(body["riskLevel"], "VeryHigh");

    let (status, body) = send(
        &app,
        "POST",
        "/api/risk-matrix/score",
        Some(&pilot),
        Some(json!({"answers": [{"questionId": "q999", "selectedScore": 1}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"][0]
        .as_str()
        .unwrap()
        .contains("unknown question id"));
}

// ============================================================================
// Users & the last-admin invariant
// ============================================================================

#[tokio::test]
async fn last_admin_cannot_be_removed() {
    let app = app();
    let admin = principal(Role::Admin);

    let (_, first) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({"email": "one@aero.test", "name": "Admin One", "role": "ADMIN"})),
    )
    .await;
    let (_, second) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({"email": "two@aero.test", "name": "Admin Two", "role": "ADMIN"})),
    )
    .await;

    // Two active admins: deactivating one succeeds.
    let (status, body) = send(
        &app,
        "PATCH",
        "/api/users/deactivate",
        Some(&admin),
        Some(json!({"userId": first["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], false);

    // One remaining active admin: both deactivation and deletion refuse.
    let (status, body) = send(
        &app,
        "PATCH",
        "/api/users/deactivate",
        Some(&admin),
        Some(json!({"userId": second["id"]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("last remaining admin"));

    let uri = format!("/api/users/{}", second["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A non-admin user can still be removed.
    let (_, user) = send(
        &app,
        "POST",
        "/api/users",
        Some(&admin),
        Some(json!({"email": "pilot@aero.test", "name": "Pilot", "role": "USER"})),
    )
    .await;
    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());
    let (status, _) = send(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = app();
    let admin = principal(Role::Admin);
    let payload = json!({"email": "dup@aero.test", "name": "First", "role": "USER"});

    let (status, _) = send(&app, "POST", "/api/users", Some(&admin), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/users", Some(&admin), Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Invoices
// ============================================================================

#[tokio::test]
async fn invoice_lifecycle_is_owner_scoped() {
    let app = app();
    let owner = principal(Role::User);
    let stranger = principal(Role::User);

    let (status, created) = send(
        &app,
        "POST",
        "/api/invoices",
        Some(&owner),
        Some(json!({"clientName": "Acme Utilities", "total": "1250.00", "currency": "USD"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PENDING");
    let uri = format!("/api/invoices/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&owner),
        Some(json!({"status": "PAID"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PAID");

    let (status, _) = send(&app, "DELETE", &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

// ============================================================================
// Dashboard & export
// ============================================================================

#[tokio::test]
async fn dashboard_counts_follow_visible_scope() {
    let app = app();
    let pilot = principal(Role::User);
    let admin = principal(Role::Admin);

    send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "SITE010"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&admin),
        Some(json!({"siteId": "SITE011"})),
    )
    .await;

    let (status, body) = send(
        &app,
        "GET",
        "/api/fpl-missions/dashboard-stats",
        Some(&pilot),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["missions"]["total"], 1);
    assert_eq!(body["missions"]["draft"], 1);

    let (_, body) = send(
        &app,
        "GET",
        "/api/fpl-missions/dashboard-stats",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["missions"]["total"], 2);
}

#[tokio::test]
async fn export_pdf_returns_a_pdf_document() {
    let app = app();
    let pilot = principal(Role::User);

    let (_, created) = send(
        &app,
        "POST",
        "/api/fpl-missions",
        Some(&pilot),
        Some(json!({"siteId": "SITE012"})),
    )
    .await;
    let uri = format!(
        "/api/fpl-missions/export-pdf?id={}",
        created["id"].as_str().unwrap()
    );

    let request = Request::builder()
        .method("GET")
        .uri(&uri)
        .header(SESSION_HEADER, session_header_value(&pilot))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-1.4"));

    // Missing id is a validation error, unknown id a 404.
    let (status, _) = send(&app, "GET", "/api/fpl-missions/export-pdf", Some(&pilot), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/fpl-missions/export-pdf?id={}", Uuid::new_v4()),
        Some(&pilot),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
