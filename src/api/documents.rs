//! Shared document handler behavior.
//!
//! Every status-bearing resource routes through these helpers, so the
//! ownership rules, pagination shape, and status workflow cannot drift
//! between resource types.

use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Document, DocumentKind, DocumentStatus, Paginated, Principal};
use crate::store::OwnerScope;
use crate::workflow::{apply_transition, Transition};

use super::AppState;

/// Listing scope for a principal: USERs see their own records, elevated
/// roles see everything.
pub fn visible_scope(principal: &Principal) -> OwnerScope {
    if principal.role.is_elevated() {
        OwnerScope::All
    } else {
        OwnerScope::Owner(principal.id)
    }
}

/// Create a document owned by the caller. Status and ownership are
/// server-assigned regardless of the incoming payload.
pub async fn create_document(
    state: &AppState,
    principal: &Principal,
    kind: DocumentKind,
    payload: JsonValue,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let doc = Document::new(kind, principal.id, payload);
    let created = state.documents.insert(doc).await?;
    state.list_cache.invalidate_all().await;
    tracing::info!(document_id = %created.id, kind = %kind, owner = %created.owner_id, "document created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Page of documents visible to the caller.
pub async fn list_documents(
    state: &AppState,
    principal: &Principal,
    kind: DocumentKind,
    page: u64,
    limit: u64,
) -> ApiResult<Paginated<Document>> {
    let (items, total) = state
        .documents
        .list(kind, visible_scope(principal), page, limit)
        .await?;
    Ok(Paginated::new(items, total, page, limit))
}

/// Fetch one document, enforcing visibility: 404 when the id does not
/// resolve, 403 for a non-owner without an elevated role.
pub async fn fetch_authorized(
    state: &AppState,
    principal: &Principal,
    kind: DocumentKind,
    id: Uuid,
) -> ApiResult<Document> {
    let doc = state
        .documents
        .get(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Document not found"))?;

    if !principal.role.is_elevated() && doc.owner_id != principal.id {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(doc)
}

/// Apply a content and/or status update. Status changes route through the
/// workflow table; content edits are limited to the owner while DRAFT or to
/// elevated roles at any status. When nothing changes, no write is issued
/// and `updated_at` stays untouched.
pub async fn update_document(
    state: &AppState,
    principal: &Principal,
    kind: DocumentKind,
    id: Uuid,
    new_payload: Option<JsonValue>,
    requested_status: Option<DocumentStatus>,
) -> ApiResult<Json<Document>> {
    let doc = fetch_authorized(state, principal, kind, id).await?;

    let mut next = doc.clone();
    let mut changed = false;

    if let Some(requested) = requested_status {
        match apply_transition(&doc, requested, principal)? {
            Transition::Unchanged => {}
            Transition::Changed(status) => {
                next.status = status;
                changed = true;
            }
        }
    }

    if let Some(payload) = new_payload {
        if payload != doc.payload {
            let editable = principal.role.is_elevated()
                || (doc.owner_id == principal.id && doc.status == DocumentStatus::Draft);
            if !editable {
                return Err(ApiError::forbidden(
                    "Document content can only be edited while in draft",
                ));
            }
            next.payload = payload;
            changed = true;
        }
    }

    if !changed {
        return Ok(Json(doc));
    }

    next.updated_at = Utc::now();
    let saved = state.documents.update(next).await?;
    state.list_cache.invalidate_all().await;
    Ok(Json(saved))
}

/// Delete a document. Owners may delete only while DRAFT; elevated roles at
/// any status.
pub async fn delete_document(
    state: &AppState,
    principal: &Principal,
    kind: DocumentKind,
    id: Uuid,
) -> ApiResult<StatusCode> {
    let doc = fetch_authorized(state, principal, kind, id).await?;

    if !principal.role.is_elevated() && doc.status != DocumentStatus::Draft {
        return Err(ApiError::forbidden(
            "Only draft documents can be deleted by their owner",
        ));
    }

    state.documents.delete(kind, id).await?;
    state.list_cache.invalidate_all().await;
    Ok(StatusCode::NO_CONTENT)
}

/// Merge helper for update payloads: overlay `updates` (only keys with
/// non-null values) onto a copy of the existing payload object.
pub fn merge_payload(existing: &JsonValue, updates: JsonValue) -> JsonValue {
    let mut merged = existing.clone();
    if let (Some(base), Some(incoming)) = (merged.as_object_mut(), updates.as_object()) {
        for (key, value) in incoming {
            if !value.is_null() {
                base.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
