//! Tailboard document endpoints, nested under the FPL mission prefix the
//! way the original surface exposed them.
//!
//! ## Endpoints
//!
//! - `GET /api/fpl-missions/tailboard-document`
//! - `POST /api/fpl-missions/tailboard-document`
//! - `GET/PUT/DELETE /api/fpl-missions/tailboard-document/:id`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::{ApiError, ApiResult};
use crate::models::{Document, DocumentKind, DocumentStatus, PageQuery, Paginated, Principal};

use super::documents;
use super::AppState;

// ============================================================================
// Request types & validation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTailboardRequest {
    pub date: NaiveDate,
    pub crew_members: Vec<String>,
    #[serde(default)]
    pub safety_topics: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTailboardRequest {
    pub date: Option<NaiveDate>,
    pub crew_members: Option<Vec<String>>,
    pub safety_topics: Option<Vec<String>>,
    pub notes: Option<String>,
    pub status: Option<DocumentStatus>,
}

fn validate_fields(
    crew_members: Option<&[String]>,
    safety_topics: Option<&[String]>,
    notes: Option<&str>,
) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(crew) = crew_members {
        if crew.is_empty() {
            details.push("crewMembers must not be empty".to_string());
        }
        if crew.len() > 20 {
            details.push("crewMembers must list at most 20 names".to_string());
        }
        if crew.iter().any(|name| name.trim().is_empty() || name.len() > 100) {
            details.push("each crew member name must be 1-100 characters".to_string());
        }
    }
    if let Some(topics) = safety_topics {
        if topics.len() > 20 {
            details.push("safetyTopics must list at most 20 entries".to_string());
        }
        if topics.iter().any(|t| t.trim().is_empty() || t.len() > 200) {
            details.push("each safety topic must be 1-200 characters".to_string());
        }
    }
    if let Some(notes) = notes {
        if notes.len() > 2000 {
            details.push("notes must be at most 2000 characters".to_string());
        }
    }
    details
}

fn validate_create(req: &CreateTailboardRequest) -> ApiResult<JsonValue> {
    let details = validate_fields(
        Some(&req.crew_members),
        Some(&req.safety_topics),
        req.notes.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    Ok(json!({
        "date": req.date,
        "crewMembers": req.crew_members,
        "safetyTopics": req.safety_topics,
        "notes": req.notes,
    }))
}

fn validate_update(
    existing: &JsonValue,
    req: &UpdateTailboardRequest,
) -> ApiResult<Option<JsonValue>> {
    if req.date.is_none()
        && req.crew_members.is_none()
        && req.safety_topics.is_none()
        && req.notes.is_none()
    {
        return Ok(None);
    }
    let details = validate_fields(
        req.crew_members.as_deref(),
        req.safety_topics.as_deref(),
        req.notes.as_deref(),
    );
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }
    let updates = json!({
        "date": req.date,
        "crewMembers": req.crew_members,
        "safetyTopics": req.safety_topics,
        "notes": req.notes,
    });
    Ok(Some(documents::merge_payload(existing, updates)))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_tailboards(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Document>>> {
    let (page, limit) = query.normalized();
    let listing = documents::list_documents(
        &state,
        &principal,
        DocumentKind::TailboardDocument,
        page,
        limit,
    )
    .await?;
    Ok(Json(listing))
}

async fn create_tailboard(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateTailboardRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let payload = validate_create(&req)?;
    documents::create_document(&state, &principal, DocumentKind::TailboardDocument, payload).await
}

async fn get_tailboard(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let doc =
        documents::fetch_authorized(&state, &principal, DocumentKind::TailboardDocument, id)
            .await?;
    Ok(Json(doc))
}

async fn update_tailboard(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTailboardRequest>,
) -> ApiResult<Json<Document>> {
    let existing =
        documents::fetch_authorized(&state, &principal, DocumentKind::TailboardDocument, id)
            .await?;
    let payload = validate_update(&existing.payload, &req)?;
    documents::update_document(
        &state,
        &principal,
        DocumentKind::TailboardDocument,
        id,
        payload,
        req.status,
    )
    .await
}

async fn delete_tailboard(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    documents::delete_document(&state, &principal, DocumentKind::TailboardDocument, id).await
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/fpl-missions/tailboard-document",
            get(list_tailboards).post(create_tailboard),
        )
        .route(
            "/api/fpl-missions/tailboard-document/:id",
            get(get_tailboard)
                .put(update_tailboard)
                .delete(delete_tailboard),
        )
        .route_layer(RequireRoles::any_authenticated())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_crew_is_rejected() {
        let req = CreateTailboardRequest {
            date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            crew_members: vec![],
            safety_topics: vec![],
            notes: None,
        };
        assert!(matches!(
            validate_create(&req),
            Err(ApiError::Validation { .. })
        ));
    }

    #[test]
    fn valid_create_builds_payload() {
        let req = CreateTailboardRequest {
            date: NaiveDate::from_ymd_opt(2026, 8, 26).unwrap(),
            crew_members: vec!["A. Pilot".to_string()],
            safety_topics: vec!["Overhead lines".to_string()],
            notes: None,
        };
        let payload = validate_create(&req).unwrap();
        assert_eq!(payload["crewMembers"][0], "A. Pilot");
    }
}
