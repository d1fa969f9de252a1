//! AeroSafe: role-gated safety and mission-planning document management.
//!
//! Pilots, supervisors, and admins create, review, approve, and export
//! structured safety documents (POWRA risk assessments, FPL missions,
//! tailboard documents, risk matrices, mission-planning scripts) and manage
//! client invoices over a JSON HTTP API.
//!
//! The load-bearing pieces are the RBAC gate wrapping every route
//! ([`auth`]), the DRAFT -> PENDING -> APPROVED status machine shared by
//! every document kind ([`workflow`]), and the weighted risk scoring engine
//! ([`risk`]). Persistence sits behind the [`store`] traits with a Postgres
//! implementation in [`database`] (feature `"database"`) and an in-process
//! one for tests and local runs.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pdf;
pub mod risk;
pub mod store;
pub mod workflow;

#[cfg(feature = "database")]
pub mod database;

pub use api::{create_api_router, AppState};
pub use error::{ApiError, ApiResult, StoreError};
pub use models::{Document, DocumentKind, DocumentStatus, Principal, Role};
