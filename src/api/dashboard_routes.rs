//! Dashboard aggregates and PDF export for the mission family.
//!
//! ## Endpoints
//!
//! - `GET /api/fpl-missions/dashboard-stats` - per-kind status counts for
//!   the caller's visible scope
//! - `GET /api/fpl-missions/export-pdf?id=<uuid>` - mission summary as
//!   `application/pdf`

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::{ApiError, ApiResult};
use crate::models::{DocumentKind, Principal, StatusCounts};

use super::documents::{fetch_authorized, visible_scope};
use super::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub missions: StatusCounts,
    pub tailboards: StatusCounts,
    pub risk_matrices: StatusCounts,
    pub mission_scripts: StatusCounts,
    pub powra: StatusCounts,
}

async fn dashboard_stats(
    State(state): State<AppState>,
    principal: Principal,
) -> ApiResult<Json<DashboardStats>> {
    let scope = visible_scope(&principal);

    let missions = state
        .documents
        .count_by_status(DocumentKind::FplMission, scope)
        .await?;
    let tailboards = state
        .documents
        .count_by_status(DocumentKind::TailboardDocument, scope)
        .await?;
    let risk_matrices = state
        .documents
        .count_by_status(DocumentKind::RiskMatrix, scope)
        .await?;
    let mission_scripts = state
        .documents
        .count_by_status(DocumentKind::MissionPlanningScript, scope)
        .await?;
    let powra = state
        .documents
        .count_by_status(DocumentKind::Powra, scope)
        .await?;

    Ok(Json(DashboardStats {
        missions,
        tailboards,
        risk_matrices,
        mission_scripts,
        powra,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub id: Option<Uuid>,
}

async fn export_pdf(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let id = query
        .id
        .ok_or_else(|| ApiError::validation(vec!["id query parameter is required".to_string()]))?;

    let doc = fetch_authorized(&state, &principal, DocumentKind::FplMission, id).await?;
    let bytes = state.pdf.render(&doc);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"mission-{}.pdf\"", doc.id),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/fpl-missions/dashboard-stats", get(dashboard_stats))
        .route("/api/fpl-missions/export-pdf", get(export_pdf))
        .route_layer(RequireRoles::any_authenticated())
}
