//! REST API surface.
//!
//! One route module per resource; all of them delegate the shared
//! ownership, pagination, and status-workflow behavior to [`documents`].
//! Role allow-lists are applied per route group via
//! [`RequireRoles`](crate::auth::RequireRoles); the access-log middleware
//! wraps the whole `/api` tree.

pub mod dashboard_routes;
pub mod documents;
pub mod fpl_mission_routes;
pub mod invoice_routes;
pub mod mission_script_routes;
pub mod powra_routes;
pub mod risk_matrix_routes;
pub mod tailboard_routes;
pub mod user_routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{access_log, HeaderSessionResolver, SessionResolver};
use crate::cache::{ListCache, RateLimitConfig, RateLimiter};
use crate::pdf::{MinimalPdfRenderer, MissionPdfRenderer};
use crate::store::{DocumentStore, InvoiceStore, MemoryStore, UserStore};

// ============================================================================
// Application state
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub sessions: Arc<dyn SessionResolver>,
    pub pdf: Arc<dyn MissionPdfRenderer>,
    pub list_cache: Arc<ListCache>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        users: Arc<dyn UserStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        Self {
            documents,
            users,
            invoices,
            sessions: Arc::new(HeaderSessionResolver),
            pdf: Arc::new(MinimalPdfRenderer),
            list_cache: Arc::new(ListCache::new()),
            rate_limiter: Arc::new(RateLimiter::new()),
            rate_limit: RateLimitConfig::default(),
        }
    }

    /// State over one shared in-process store. Used by tests and local runs
    /// without Postgres.
    pub fn with_memory_store() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store.clone(), store)
    }
}

// ============================================================================
// Router assembly
// ============================================================================

/// Assemble the full API router with logging, CORS, and tracing layers.
pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .merge(dashboard_routes::router())
        .merge(fpl_mission_routes::router())
        .merge(tailboard_routes::router())
        .merge(risk_matrix_routes::router())
        .merge(mission_script_routes::router())
        .merge(powra_routes::router())
        .merge(invoice_routes::router())
        .merge(user_routes::router())
        .layer(middleware::from_fn_with_state(state.clone(), access_log))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
