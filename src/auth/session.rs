//! Session context resolution.
//!
//! One resolver turns the opaque session carrier on an incoming request into
//! a typed `Option<Principal>`; no handler parses session headers itself.

use axum::http::HeaderMap;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::{Principal, Role};

/// Header carrying the serialized session payload.
pub const SESSION_HEADER: &str = "x-session";

/// Resolves an authenticated principal from request headers. Swappable so
/// tests and alternative session carriers can plug in their own.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal>;
}

/// Session payload as issued by the auth collaborator: `{"user":{"id","role"}}`.
#[derive(Debug, Deserialize)]
struct SessionPayload {
    user: SessionUser,
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    id: Uuid,
    role: Role,
}

/// Default resolver: parses the `x-session` header as JSON. Malformed or
/// absent sessions resolve to `None` (the gate turns that into a 401).
#[derive(Debug, Clone, Default)]
pub struct HeaderSessionResolver;

impl SessionResolver for HeaderSessionResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
        let raw = headers.get(SESSION_HEADER)?.to_str().ok()?;
        let payload: SessionPayload = serde_json::from_str(raw).ok()?;
        Some(Principal {
            id: payload.user.id,
            role: payload.user.role,
        })
    }
}

/// Serialize a principal into the session header value. Used by tests and
/// local tooling; production sessions are issued externally.
pub fn session_header_value(principal: &Principal) -> String {
    serde_json::json!({
        "user": { "id": principal.id, "role": principal.role }
    })
    .to_string()
}
