//! Persistence seam.
//!
//! All authoritative state lives behind these traits; handlers never issue
//! queries directly. Each mutation is a single atomic operation from the
//! caller's point of view - in particular the last-admin guard executes as
//! one check-and-write, never as a separate read followed by a write.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Document, DocumentKind, Invoice, StatusCounts, User};

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Scope of a listing query: everything, or a single owner's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    All,
    Owner(Uuid),
}

impl OwnerScope {
    pub fn matches(&self, owner_id: Uuid) -> bool {
        match self {
            OwnerScope::All => true,
            OwnerScope::Owner(id) => *id == owner_id,
        }
    }
}

/// Storage for status-bearing documents of every kind.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: Document) -> StoreResult<Document>;

    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Option<Document>>;

    /// Page of documents ordered by creation time (newest first), plus the
    /// total matching count.
    async fn list(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)>;

    /// Full-row update (content + status in one write). `NotFound` if the
    /// id no longer resolves.
    async fn update(&self, doc: Document) -> StoreResult<Document>;

    /// `NotFound` if the id does not resolve.
    async fn delete(&self, kind: DocumentKind, id: Uuid) -> StoreResult<()>;

    async fn count_by_status(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
    ) -> StoreResult<StatusCounts>;
}

/// Storage for user accounts, including the last-admin invariant.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` if the email is already registered.
    async fn insert(&self, user: User) -> StoreResult<User>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    async fn update(&self, user: User) -> StoreResult<User>;

    /// Atomic: refuses with `Conflict` when the target is the sole
    /// remaining active ADMIN.
    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// Atomic, same guard as `delete`.
    async fn deactivate(&self, id: Uuid) -> StoreResult<User>;

    async fn count_active_admins(&self) -> StoreResult<u64>;
}

/// Storage for client invoices.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert(&self, invoice: Invoice) -> StoreResult<Invoice>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Invoice>>;

    async fn list(
        &self,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Invoice>, u64)>;

    async fn update(&self, invoice: Invoice) -> StoreResult<Invoice>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// Message used whenever the last-admin guard refuses a write.
pub const LAST_ADMIN_MESSAGE: &str = "Cannot remove or deactivate the last remaining admin";
