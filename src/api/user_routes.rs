//! User management endpoints (ADMIN only).
//!
//! Carries the one cross-entity invariant outside the document workflow:
//! the system never loses its last active ADMIN. The guard itself lives in
//! the store so the check-and-write is a single atomic operation.
//!
//! ## Endpoints
//!
//! - `GET/POST /api/users`
//! - `PUT/DELETE /api/users/:id`
//! - `PATCH /api/users/deactivate`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, patch};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::{ApiError, ApiResult};
use crate::models::{Principal, Role, User};

use super::AppState;

// ============================================================================
// Request types & validation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    pub user_id: Uuid,
}

fn validate_email(email: &str) -> Vec<String> {
    let mut details = Vec::new();
    if email.len() > 254 || !email.contains('@') || email.trim().is_empty() {
        details.push("email must be a valid address".to_string());
    }
    details
}

fn validate_name(name: &str) -> Vec<String> {
    let mut details = Vec::new();
    if name.trim().is_empty() || name.len() > 200 {
        details.push("name must be 1-200 characters".to_string());
    }
    details
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_users(
    State(state): State<AppState>,
    _principal: Principal,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

async fn create_user(
    State(state): State<AppState>,
    _principal: Principal,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let mut details = validate_email(&req.email);
    details.extend(validate_name(&req.name));
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }

    let user = User {
        id: Uuid::new_v4(),
        email: req.email,
        name: req.name,
        role: req.role,
        active: true,
        created_at: Utc::now(),
    };
    let created = state.users.insert(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    let mut user = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if let Some(ref name) = req.name {
        let details = validate_name(name);
        if !details.is_empty() {
            return Err(ApiError::validation(details));
        }
        user.name = name.clone();
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if let Some(active) = req.active {
        user.active = active;
    }

    Ok(Json(state.users.update(user).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    _principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deactivate_user(
    State(state): State<AppState>,
    _principal: Principal,
    Json(req): Json<DeactivateRequest>,
) -> ApiResult<Json<User>> {
    let user = state.users.deactivate(req.user_id).await?;
    Ok(Json(user))
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/deactivate", patch(deactivate_user))
        .route("/api/users/:id", axum::routing::put(update_user).delete(delete_user))
        .route_layer(RequireRoles::admin_only())
}
