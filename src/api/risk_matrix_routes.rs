//! Risk matrix endpoints.
//!
//! A risk matrix document persists the submitted answers together with the
//! assessment computed by the scoring engine. A standalone scoring endpoint
//! lets the frontend preview a result without persisting anything.
//!
//! ## Endpoints
//!
//! - `GET/POST /api/fpl-missions/risk-matrix`
//! - `GET/PUT/DELETE /api/fpl-missions/risk-matrix/:id`
//! - `POST /api/risk-matrix/score` - stateless preview

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::ApiResult;
use crate::models::{Document, DocumentKind, DocumentStatus, PageQuery, Paginated, Principal};
use crate::risk::{score, RiskAnswer, RiskScore};

use super::documents;
use super::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRiskMatrixRequest {
    pub answers: Vec<RiskAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRiskMatrixRequest {
    pub answers: Option<Vec<RiskAnswer>>,
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub answers: Vec<RiskAnswer>,
}

/// Score the answers and build the canonical payload. Scoring rejects
/// unknown question ids, bad weights, and duplicates.
fn assessed_payload(answers: &[RiskAnswer]) -> ApiResult<JsonValue> {
    let assessment: RiskScore = score(answers)?;
    Ok(json!({
        "answers": answers,
        "assessment": assessment,
    }))
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_matrices(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Document>>> {
    let (page, limit) = query.normalized();
    let listing =
        documents::list_documents(&state, &principal, DocumentKind::RiskMatrix, page, limit)
            .await?;
    Ok(Json(listing))
}

async fn create_matrix(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateRiskMatrixRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let payload = assessed_payload(&req.answers)?;
    documents::create_document(&state, &principal, DocumentKind::RiskMatrix, payload).await
}

async fn get_matrix(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let doc = documents::fetch_authorized(&state, &principal, DocumentKind::RiskMatrix, id).await?;
    Ok(Json(doc))
}

async fn update_matrix(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRiskMatrixRequest>,
) -> ApiResult<Json<Document>> {
    let payload = match &req.answers {
        Some(answers) => Some(assessed_payload(answers)?),
        None => None,
    };
    documents::update_document(
        &state,
        &principal,
        DocumentKind::RiskMatrix,
        id,
        payload,
        req.status,
    )
    .await
}

async fn delete_matrix(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    documents::delete_document(&state, &principal, DocumentKind::RiskMatrix, id).await
}

/// Stateless scoring preview; nothing is persisted.
async fn score_preview(
    _principal: Principal,
    Json(req): Json<ScoreRequest>,
) -> ApiResult<Json<RiskScore>> {
    Ok(Json(score(&req.answers)?))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/fpl-missions/risk-matrix",
            get(list_matrices).post(create_matrix),
        )
        .route(
            "/api/fpl-missions/risk-matrix/:id",
            get(get_matrix).put(update_matrix).delete(delete_matrix),
        )
        .route("/api/risk-matrix/score", post(score_preview))
        .route_layer(RequireRoles::any_authenticated())
}
