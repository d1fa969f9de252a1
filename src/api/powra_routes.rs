//! POWRA (point-of-work risk assessment) endpoints.
//!
//! Control measures are children of their POWRA: they are written only as
//! part of a POWRA write and are replaced wholesale on update (cascade).
//!
//! ## Endpoints
//!
//! - `GET/POST /api/powra`
//! - `GET/PUT/DELETE /api/powra/:id`

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
use crate::models::{
    ControlMeasure, Document, DocumentKind, DocumentStatus, MeasureRisk, PageQuery, Paginated,
    Principal,
};

use super::documents;
use super::AppState;

// ============================================================================
// Request types & validation
// ============================================================================

/// Control measure as submitted by the client; ids are server-assigned.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMeasureInput {
    pub hazard_no: i32,
    pub measures: String,
    pub risk: MeasureRisk,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePowraRequest {
    pub site: String,
    pub task_description: String,
    #[serde(default)]
    pub control_measures: Vec<ControlMeasureInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePowraRequest {
    pub site: Option<String>,
    pub task_description: Option<String>,
    pub control_measures: Option<Vec<ControlMeasureInput>>,
    pub status: Option<DocumentStatus>,
}

fn validate_fields(
    site: Option<&str>,
    task_description: Option<&str>,
    control_measures: Option<&[ControlMeasureInput]>,
) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(site) = site {
        if site.trim().is_empty() || site.len() > 200 {
            details.push("site must be 1-200 characters".to_string());
        }
    }
    if let Some(task) = task_description {
        if task.trim().is_empty() || task.len() > 2000 {
            details.push("taskDescription must be 1-2000 characters".to_string());
        }
    }
    if let Some(measures) = control_measures {
        if measures.len() > 50 {
            details.push("controlMeasures must list at most 50 entries".to_string());
        }
        for (i, m) in measures.iter().enumerate() {
            if m.hazard_no < 1 {
                details.push(format!("controlMeasures[{i}].hazardNo must be positive"));
            }
            if m.measures.trim().is_empty() || m.measures.len() > 1000 {
                details.push(format!("controlMeasures[{i}].measures must be 1-1000 characters"));
            }
        }
    }
    details
}

/// Assign server-side ids to submitted control measures.
fn materialize_measures(inputs: &[ControlMeasureInput]) -> Vec<ControlMeasure> {
    inputs
        .iter()
        .map(|m| ControlMeasure {
            id: Uuid::new_v4(),
            hazard_no: m.hazard_no,
            measures: m.measures.clone(),
            risk: m.risk,
        })
        .collect()
}

fn validate_create(req: &CreatePowraRequest) -> ApiResult<JsonValue> {
    let details = validate_fields(
        Some(&req.site),
        Some(&req.task_description),
        Some(&req.control_measures),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    Ok(json!({
        "site": req.site,
        "taskDescription": req.task_description,
        "controlMeasures": materialize_measures(&req.control_measures),
    }))
}

fn validate_update(existing: &JsonValue, req: &UpdatePowraRequest) -> ApiResult<Option<JsonValue>> {
    if req.site.is_none() && req.task_description.is_none() && req.control_measures.is_none() {
        return Ok(None);
    }
    let details = validate_fields(
        req.site.as_deref(),
        req.task_description.as_deref(),
        req.control_measures.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    let updates = json!({
        "site": req.site,
        "taskDescription": req.task_description,
        "controlMeasures": req.control_measures.as_deref().map(materialize_measures),
    });
    Ok(Some(documents::merge_payload(existing, updates)))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_powras(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Document>>> {
    let (page, limit) = query.normalized();
    let listing =
        documents::list_documents(&state, &principal, DocumentKind::Powra, page, limit).await?;
    Ok(Json(listing))
}

async fn create_powra(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreatePowraRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let payload = validate_create(&req)?;
    documents::create_document(&state, &principal, DocumentKind::Powra, payload).await
}

async fn get_powra(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let doc = documents::fetch_authorized(&state, &principal, DocumentKind::Powra, id).await?;
    Ok(Json(doc))
}

async fn update_powra(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePowraRequest>,
) -> ApiResult<Json<Document>> {
    let existing = documents::fetch_authorized(&state, &principal, DocumentKind::Powra, id).await?;
    let payload = validate_update(&existing.payload, &req)?;
    documents::update_document(&state, &principal, DocumentKind::Powra, id, payload, req.status)
        .await
}

async fn delete_powra(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    documents::delete_document(&state, &principal, DocumentKind::Powra, id).await
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/powra", get(list_powras).post(create_powra))
        .route(
            "/api/powra/:id",
            get(get_powra).put(update_powra).delete(delete_powra),
        )
        .route_layer(RequireRoles::any_authenticated())
}
