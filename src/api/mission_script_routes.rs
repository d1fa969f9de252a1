//! Mission-planning script endpoints.
//!
//! ## Endpoints
//!
//! - `GET/POST /api/fpl-missions/mission-planning-script`
//! - `GET/PUT/DELETE /api/fpl-missions/mission-planning-script/:id`

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
use crate::models::{Document, DocumentKind, DocumentStatus, PageQuery, Paginated, Principal};

use super::documents;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScriptRequest {
    pub title: String,
    pub script: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScriptRequest {
    pub title: Option<String>,
    pub script: Option<String>,
    pub version: Option<String>,
    pub status: Option<DocumentStatus>,
}

fn validate_fields(
    title: Option<&str>,
    script: Option<&str>,
    version: Option<&str>,
) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(title) = title {
        if title.trim().is_empty() || title.len() > 200 {
            details.push("title must be 1-200 characters".to_string());
        }
    }
    if let Some(script) = script {
        if script.trim().is_empty() {
            details.push("script must not be empty".to_string());
        }
        if script.len() > 20_000 {
            details.push("script must be at most 20000 characters".to_string());
        }
    }
    if let Some(version) = version {
        if version.len() > 20 {
            details.push("version must be at most 20 characters".to_string());
        }
    }
    details
}

fn validate_create(req: &CreateScriptRequest) -> ApiResult<JsonValue> {
    let details = validate_fields(Some(&req.title), Some(&req.script), req.version.as_deref());
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    Ok(json!({
        "title": req.title,
        "script": req.script,
        "version": req.version,
    }))
}

fn validate_update(existing: &JsonValue, req: &UpdateScriptRequest) -> ApiResult<Option<JsonValue>> {
    if req.title.is_none() && req.script.is_none() && req.version.is_none() {
        return Ok(None);
    }
    let details = validate_fields(
        req.title.as_deref(),
        req.script.as_deref(),
        req.version.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    let updates = json!({
        "title": req.title,
        "script": req.script,
        "version": req.version,
    });
    Ok(Some(documents::merge_payload(existing, updates)))
}

async fn list_scripts(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Document>>> {
    let (page, limit) = query.normalized();
    let listing = documents::list_documents(
        &state,
        &principal,
        DocumentKind::MissionPlanningScript,
        page,
        limit,
    )
    .await?;
    Ok(Json(listing))
}

async fn create_script(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateScriptRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let payload = validate_create(&req)?;
    documents::create_document(&state, &principal, DocumentKind::MissionPlanningScript, payload)
        .await
}

async fn get_script(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let doc =
        documents::fetch_authorized(&state, &principal, DocumentKind::MissionPlanningScript, id)
            .await?;
    Ok(Json(doc))
}

async fn update_script(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateScriptRequest>,
) -> ApiResult<Json<Document>> {
    let existing =
        documents::fetch_authorized(&state, &principal, DocumentKind::MissionPlanningScript, id)
            .await?;
    let payload = validate_update(&existing.payload, &req)?;
    documents::update_document(
        &state,
        &principal,
        DocumentKind::MissionPlanningScript,
        id,
        payload,
        req.status,
    )
    .await
}

async fn delete_script(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    documents::delete_document(&state, &principal, DocumentKind::MissionPlanningScript, id).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/fpl-missions/mission-planning-script",
            get(list_scripts).post(create_script),
        )
        .route(
            "/api/fpl-missions/mission-planning-script/:id",
            get(get_script).put(update_script).delete(delete_script),
        )
        .route_layer(RequireRoles::any_authenticated())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_script_is_rejected() {
        let req = CreateScriptRequest {
            title: "Survey profile".to_string(),
            script: "x".repeat(20_001),
            version: None,
        };
        assert!(matches!(
            validate_create(&req),
            Err(ApiError::Validation { .. })
        ));
    }
}
