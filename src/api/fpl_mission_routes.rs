//! FPL mission endpoints.
//!
//! ## Endpoints
//!
//! - `GET /api/fpl-missions` - paginated listing (own or all)
//! - `POST /api/fpl-missions` - create (always DRAFT, owned by caller)
//! - `GET /api/fpl-missions/:id`
//! - `PUT /api/fpl-missions/:id` - content edits and status transitions
//! - `DELETE /api/fpl-missions/:id`
//!
//! The listing endpoint carries the best-effort read cache and the
//! per-principal rate limit; neither affects correctness.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::{ApiError, ApiResult};
use crate::models::{Document, DocumentKind, DocumentStatus, PageQuery, Principal};

use super::documents;
use super::AppState;

const MISSION_TYPES: [&str; 5] = ["SURVEY", "INSPECTION", "DELIVERY", "TRAINING", "EMERGENCY"];

// ============================================================================
// Request types & validation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMissionRequest {
    pub site_id: String,
    pub mission_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMissionRequest {
    pub site_id: Option<String>,
    pub mission_type: Option<String>,
    pub notes: Option<String>,
    pub status: Option<DocumentStatus>,
}

fn validate_fields(
    site_id: Option<&str>,
    mission_type: Option<&str>,
    notes: Option<&str>,
) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(site_id) = site_id {
        if site_id.trim().is_empty() {
            details.push("siteId must not be empty".to_string());
        }
        if site_id.len() > 32 {
            details.push("siteId must be at most 32 characters".to_string());
        }
    }
    if let Some(mission_type) = mission_type {
        if !MISSION_TYPES.contains(&mission_type) {
            details.push(format!("missionType '{mission_type}' is not recognized"));
        }
    }
    if let Some(notes) = notes {
        if notes.len() > 2000 {
            details.push("notes must be at most 2000 characters".to_string());
        }
    }
    details
}

fn validate_create(req: &CreateMissionRequest) -> ApiResult<JsonValue> {
    let details = validate_fields(
        Some(&req.site_id),
        req.mission_type.as_deref(),
        req.notes.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    Ok(json!({
        "siteId": req.site_id,
        "missionType": req.mission_type,
        "notes": req.notes,
    }))
}

fn validate_update(existing: &JsonValue, req: &UpdateMissionRequest) -> ApiResult<Option<JsonValue>> {
    if req.site_id.is_none() && req.mission_type.is_none() && req.notes.is_none() {
        return Ok(None);
    }
    let details = validate_fields(
        req.site_id.as_deref(),
        req.mission_type.as_deref(),
        req.notes.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    let updates = json!({
        "siteId": req.site_id,
        "missionType": req.mission_type,
        "notes": req.notes,
    });
    Ok(Some(documents::merge_payload(existing, updates)))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_missions(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<JsonValue>> {
    let key = principal.scope_key();
    if !state.rate_limiter.allow(&key, &state.rate_limit).await {
        return Err(ApiError::RateLimited);
    }

    let (page, limit) = query.normalized();
    let default_page = page == 1 && limit == 10;

    if default_page {
        if let Some(cached) = state.list_cache.get(&key).await {
            return Ok(Json(cached));
        }
    }

    let listing =
        documents::list_documents(&state, &principal, DocumentKind::FplMission, page, limit)
            .await?;
    let body = serde_json::to_value(&listing)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e)))?;

    if default_page {
        state.list_cache.put(key, body.clone()).await;
    }
    Ok(Json(body))
}

async fn create_mission(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateMissionRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let payload = validate_create(&req)?;
    documents::create_document(&state, &principal, DocumentKind::FplMission, payload).await
}

async fn get_mission(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let doc = documents::fetch_authorized(&state, &principal, DocumentKind::FplMission, id).await?;
    Ok(Json(doc))
}

async fn update_mission(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMissionRequest>,
) -> ApiResult<Json<Document>> {
    let existing =
        documents::fetch_authorized(&state, &principal, DocumentKind::FplMission, id).await?;
    let payload = validate_update(&existing.payload, &req)?;
    documents::update_document(
        &state,
        &principal,
        DocumentKind::FplMission,
        id,
        payload,
        req.status,
    )
    .await
}

async fn delete_mission(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    documents::delete_document(&state, &principal, DocumentKind::FplMission, id).await
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fpl-missions", get(list_missions).post(create_mission))
        .route(
            "/api/fpl-missions/:id",
            get(get_mission).put(update_mission).delete(delete_mission),
        )
        .route_layer(RequireRoles::any_authenticated())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validation_flags_every_problem() {
        let req = CreateMissionRequest {
            site_id: "".to_string(),
            mission_type: Some("JOYRIDE".to_string()),
            notes: Some("x".repeat(2001)),
        };
        let err = validate_create(&req).unwrap_err();
        match err {
            ApiError::Validation { details } => assert_eq!(details.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn update_merges_over_existing_payload() {
        let existing = json!({"siteId": "SITE001", "missionType": "SURVEY", "notes": null});
        let req = UpdateMissionRequest {
            site_id: Some("SITE002".to_string()),
            mission_type: None,
            notes: None,
            status: None,
        };
        let merged = validate_update(&existing, &req).unwrap().unwrap();
        assert_eq!(merged["siteId"], "SITE002");
        assert_eq!(merged["missionType"], "SURVEY");
    }

    #[test]
    fn status_only_update_has_no_payload() {
        let existing = json!({"siteId": "SITE001"});
        let req = UpdateMissionRequest {
            site_id: None,
            mission_type: None,
            notes: None,
            status: Some(DocumentStatus::Pending),
        };
        assert!(validate_update(&existing, &req).unwrap().is_none());
    }
}
