//! Authentication context and role-based access control.
//!
//! Session issuance (magic-link flow) is an external collaborator; this
//! module only resolves an already-issued session into a [`Principal`] and
//! enforces per-route role allow-lists before any handler runs.
//!
//! [`Principal`]: crate::models::Principal

pub mod rbac;
pub mod session;

pub use rbac::{access_log, RequireRoles};
pub use session::{HeaderSessionResolver, SessionResolver, SESSION_HEADER};
