//! Client invoice endpoints.
//!
//! Invoices are owner-scoped and independent of the document status
//! machine: owners create them PENDING, mark them PAID, and delete them.
//! Elevated roles can see every invoice; mutation stays with the owner
//! (ADMIN may also mutate).
//!
//! ## Endpoints
//!
//! - `GET/POST /api/invoices`
//! - `GET/PUT/DELETE /api/invoices/:id`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::RequireRoles;
use crate::error::{ApiError, ApiResult};
use crate::models::{Invoice, InvoiceStatus, PageQuery, Paginated, Principal, Role};

use super::documents::visible_scope;
use super::AppState;

// ============================================================================
// Request types & validation
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub client_name: String,
    pub total: Decimal,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    pub client_name: Option<String>,
    pub total: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<InvoiceStatus>,
}

fn validate_fields(
    client_name: Option<&str>,
    total: Option<Decimal>,
    currency: Option<&str>,
) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(name) = client_name {
        if name.trim().is_empty() || name.len() > 200 {
            details.push("clientName must be 1-200 characters".to_string());
        }
    }
    if let Some(total) = total {
        if total.is_sign_negative() {
            details.push("total must not be negative".to_string());
        }
    }
    if let Some(currency) = currency {
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            details.push("currency must be a 3-letter uppercase code".to_string());
        }
    }
    details
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_invoices(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<Invoice>>> {
    let (page, limit) = query.normalized();
    let scope = visible_scope(&principal);
    let (items, total) = state.invoices.list(scope, page, limit).await?;
    Ok(Json(Paginated::new(items, total, page, limit)))
}

async fn create_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<CreateInvoiceRequest>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let details = validate_fields(Some(&req.client_name), Some(req.total), Some(&req.currency));
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }

    let now = Utc::now();
    let invoice = Invoice {
        id: Uuid::new_v4(),
        owner_id: principal.id,
        client_name: req.client_name,
        status: InvoiceStatus::Pending,
        total: req.total,
        currency: req.currency,
        created_at: now,
        updated_at: now,
    };
    let created = state.invoices.insert(invoice).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Fetch with visibility rules: 404 unknown, 403 for a non-owner USER.
async fn fetch_visible(state: &AppState, principal: &Principal, id: Uuid) -> ApiResult<Invoice> {
    let invoice = state
        .invoices
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice not found"))?;
    if !principal.role.is_elevated() && invoice.owner_id != principal.id {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(invoice)
}

/// Mutation stays with the owner; ADMIN may step in.
fn may_mutate(principal: &Principal, invoice: &Invoice) -> bool {
    invoice.owner_id == principal.id || principal.role == Role::Admin
}

async fn get_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(fetch_visible(&state, &principal, id).await?))
}

async fn update_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateInvoiceRequest>,
) -> ApiResult<Json<Invoice>> {
    let mut invoice = fetch_visible(&state, &principal, id).await?;
    if !may_mutate(&principal, &invoice) {
        return Err(ApiError::forbidden("Forbidden"));
    }

    let details = validate_fields(req.client_name.as_deref(), req.total, req.currency.as_deref());
    if !details.is_empty() {
        return Err(ApiError::validation(details));
    }

    let mut changed = false;
    if let Some(name) = req.client_name {
        invoice.client_name = name;
        changed = true;
    }
    if let Some(total) = req.total {
        invoice.total = total;
        changed = true;
    }
    if let Some(currency) = req.currency {
        invoice.currency = currency;
        changed = true;
    }
    if let Some(status) = req.status {
        if status != invoice.status {
            invoice.status = status;
            changed = true;
        }
    }

    if !changed {
        return Ok(Json(invoice));
    }
    invoice.updated_at = Utc::now();
    Ok(Json(state.invoices.update(invoice).await?))
}

async fn delete_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let invoice = fetch_visible(&state, &principal, id).await?;
    if !may_mutate(&principal, &invoice) {
        return Err(ApiError::forbidden("Forbidden"));
    }
    state.invoices.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/api/invoices/:id",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route_layer(RequireRoles::any_authenticated())
}
