//! Core domain types shared across the API, workflow, and persistence layers.
//!
//! All status-bearing resources (FPL missions, tailboard documents, risk
//! matrices, mission-planning scripts, POWRA) are represented by the same
//! [`Document`] envelope with a typed payload serialized as JSON. Ownership
//! is carried by a single `owner_id` field for every resource.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Roles & Principal
// ============================================================================

/// Actor role. SUPERVISOR and ADMIN are elevated roles: they bypass
/// ownership checks and drive status transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Supervisor,
    Admin,
}

impl Role {
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Supervisor | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Supervisor => "SUPERVISOR",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Role::User),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Authenticated actor derived per-request from session state. Never
/// persisted by this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
}

impl Principal {
    /// Cache / rate-limit key for this principal.
    pub fn scope_key(&self) -> String {
        format!("{}:{}", self.id, self.role)
    }
}

// ============================================================================
// Document envelope
// ============================================================================

/// Lifecycle of every status-bearing resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    Pending,
    Approved,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "DRAFT",
            DocumentStatus::Pending => "PENDING",
            DocumentStatus::Approved => "APPROVED",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(DocumentStatus::Draft),
            "PENDING" => Ok(DocumentStatus::Pending),
            "APPROVED" => Ok(DocumentStatus::Approved),
            other => Err(format!("unknown document status '{other}'")),
        }
    }
}

/// Resource type carried by a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    FplMission,
    TailboardDocument,
    RiskMatrix,
    MissionPlanningScript,
    Powra,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::FplMission => "FPL_MISSION",
            DocumentKind::TailboardDocument => "TAILBOARD_DOCUMENT",
            DocumentKind::RiskMatrix => "RISK_MATRIX",
            DocumentKind::MissionPlanningScript => "MISSION_PLANNING_SCRIPT",
            DocumentKind::Powra => "POWRA",
        }
    }

    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::FplMission,
        DocumentKind::TailboardDocument,
        DocumentKind::RiskMatrix,
        DocumentKind::MissionPlanningScript,
        DocumentKind::Powra,
    ];
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FPL_MISSION" => Ok(DocumentKind::FplMission),
            "TAILBOARD_DOCUMENT" => Ok(DocumentKind::TailboardDocument),
            "RISK_MATRIX" => Ok(DocumentKind::RiskMatrix),
            "MISSION_PLANNING_SCRIPT" => Ok(DocumentKind::MissionPlanningScript),
            "POWRA" => Ok(DocumentKind::Powra),
            other => Err(format!("unknown document kind '{other}'")),
        }
    }
}

/// Generic status-bearing resource. The payload shape is owned by the
/// per-resource route module; everything else is uniform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub owner_id: Uuid,
    pub status: DocumentStatus,
    pub payload: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Build a fresh document for `owner`. New documents always start at
    /// DRAFT; `status` / `owner_id` in a client payload never override this.
    pub fn new(kind: DocumentKind, owner: Uuid, payload: JsonValue) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            owner_id: owner,
            status: DocumentStatus::Draft,
            payload,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Severity of a single POWRA control measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureRisk {
    L,
    M,
    H,
}

/// Child of a POWRA document; created, updated, and deleted only as part of
/// a POWRA write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlMeasure {
    pub id: Uuid,
    pub hazard_no: i32,
    pub measures: String,
    pub risk: MeasureRisk,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Invoices
// ============================================================================

/// Invoice lifecycle is independent of the document status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            other => Err(format!("unknown invoice status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub client_name: String,
    pub status: InvoiceStatus,
    pub total: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Query parameters shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    10
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageQuery {
    /// Clamp to sane bounds; a `page`/`limit` of zero falls back to defaults.
    pub fn normalized(&self) -> (u64, u64) {
        let page = if self.page == 0 { 1 } else { self.page };
        let limit = if self.limit == 0 { 10 } else { self.limit.min(100) };
        (page, limit)
    }
}

/// Uniform listing response shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total_pages: u64,
    pub current_page: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total_pages,
            current_page: page,
        }
    }
}

/// Per-status document counts used by the dashboard endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: u64,
    pub draft: u64,
    pub pending: u64,
    pub approved: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: DocumentStatus) {
        self.total += 1;
        match status {
            DocumentStatus::Draft => self.draft += 1,
            DocumentStatus::Pending => self.pending += 1,
            DocumentStatus::Approved => self.approved += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        for role in [Role::User, Role::Supervisor, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("PILOT".parse::<Role>().is_err());
    }

    #[test]
    fn new_document_starts_draft() {
        let owner = Uuid::new_v4();
        let doc = Document::new(DocumentKind::FplMission, owner, serde_json::json!({}));
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.owner_id, owner);
    }

    #[test]
    fn pagination_math() {
        let page = Paginated::<u8>::new(vec![], 15, 2, 10);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);

        let empty = Paginated::<u8>::new(vec![], 0, 1, 10);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn statuses_serialize_screaming() {
        assert_eq!(
            serde_json::to_value(DocumentStatus::Draft).unwrap(),
            serde_json::json!("DRAFT")
        );
        assert_eq!(
            serde_json::to_value(Role::Supervisor).unwrap(),
            serde_json::json!("SUPERVISOR")
        );
    }
}
