//! RBAC gate: access logging plus per-route role allow-lists.
//!
//! Two cooperating pieces wrap every API route:
//!
//! 1. [`access_log`] middleware resolves the principal once, stashes it in
//!    request extensions, and emits an access record with the elapsed time.
//! 2. [`RequireRoles`] is a route layer holding the allow-list. Requests
//!    without a principal are rejected with 401, requests from a role
//!    outside the list with 403 - the inner handler is never invoked.
//!
//! All authorization decisions are logged with principal id and role, never
//! with session tokens.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower::{Layer, Service};

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::{Principal, Role};

/// Requests slower than this are flagged in the access log.
const SLOW_REQUEST_MS: u128 = 5000;

// ============================================================================
// Access logging middleware
// ============================================================================

/// Resolve the session principal and record an access-log entry for every
/// request. The principal (when present) is inserted into request extensions
/// for the role layer and handler extractors downstream.
pub async fn access_log(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let principal = state.sessions.resolve(req.headers());
    if let Some(ref p) = principal {
        req.extensions_mut().insert(p.clone());
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let duration_ms = started.elapsed().as_millis();
    let (principal_id, role) = match &principal {
        Some(p) => (p.id.to_string(), p.role.as_str()),
        None => ("-".to_string(), "-"),
    };

    tracing::info!(
        %method,
        %path,
        principal_id = %principal_id,
        role = %role,
        status = %response.status(),
        duration_ms = duration_ms as u64,
        "access"
    );

    if duration_ms > SLOW_REQUEST_MS {
        tracing::warn!(
            %method,
            %path,
            duration_ms = duration_ms as u64,
            "slow request"
        );
    }

    response
}

// ============================================================================
// Principal extractor
// ============================================================================

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

// ============================================================================
// RequireRoles route layer
// ============================================================================

/// Route layer enforcing a role allow-list before the inner handler runs.
#[derive(Debug, Clone, Copy)]
pub struct RequireRoles {
    allowed: &'static [Role],
}

impl RequireRoles {
    pub fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Any authenticated principal, regardless of role.
    pub fn any_authenticated() -> Self {
        Self::new(&[Role::User, Role::Supervisor, Role::Admin])
    }

    pub fn admin_only() -> Self {
        Self::new(&[Role::Admin])
    }

    pub fn elevated() -> Self {
        Self::new(&[Role::Supervisor, Role::Admin])
    }
}

impl<S> Layer<S> for RequireRoles {
    type Service = RequireRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireRolesService {
            inner,
            allowed: self.allowed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequireRolesService<S> {
    inner: S,
    allowed: &'static [Role],
}

impl<S> Service<Request> for RequireRolesService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let allowed = self.allowed;

        let Some(principal) = req.extensions().get::<Principal>().cloned() else {
            return Box::pin(async move { Ok(ApiError::Unauthorized.into_response()) });
        };

        if !allowed.contains(&principal.role) {
            tracing::warn!(
                principal_id = %principal.id,
                role = %principal.role,
                path = %req.uri().path(),
                "elevated privilege attempt denied"
            );
            return Box::pin(async move {
                Ok(ApiError::forbidden("Forbidden").into_response())
            });
        }

        // Swap in a clone so the original keeps its readiness state.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}
