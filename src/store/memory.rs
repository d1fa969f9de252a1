//! In-process store implementation.
//!
//! Backs the integration tests and local development wiring. All three
//! traits share one `RwLock`-guarded state, so check-and-write sequences
//! (the last-admin guard) are atomic within a single lock hold.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Document, DocumentKind, Invoice, Role, StatusCounts, User};

use super::{
    DocumentStore, InvoiceStore, OwnerScope, StoreResult, UserStore, LAST_ADMIN_MESSAGE,
};

#[derive(Debug, Default)]
struct Shelves {
    documents: HashMap<Uuid, Document>,
    users: HashMap<Uuid, User>,
    invoices: HashMap<Uuid, Invoice>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    shelves: RwLock<Shelves>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_slice<T: Clone>(mut items: Vec<T>, page: u64, limit: u64) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    // Saturating: `page` comes straight off the query string.
    let start = page.saturating_sub(1).saturating_mul(limit);
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    let items = if start >= items.len() {
        Vec::new()
    } else {
        items.split_off(start).into_iter().take(limit as usize).collect()
    };
    (items, total)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: Document) -> StoreResult<Document> {
        self.shelves
            .write()
            .await
            .documents
            .insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Option<Document>> {
        let shelves = self.shelves.read().await;
        Ok(shelves
            .documents
            .get(&id)
            .filter(|d| d.kind == kind)
            .cloned())
    }

    async fn list(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)> {
        let shelves = self.shelves.read().await;
        let mut matching: Vec<Document> = shelves
            .documents
            .values()
            .filter(|d| d.kind == kind && scope.matches(d.owner_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_slice(matching, page, limit))
    }

    async fn update(&self, doc: Document) -> StoreResult<Document> {
        let mut shelves = self.shelves.write().await;
        if !shelves.documents.contains_key(&doc.id) {
            return Err(StoreError::NotFound);
        }
        shelves.documents.insert(doc.id, doc.clone());
        Ok(doc)
    }

    async fn delete(&self, kind: DocumentKind, id: Uuid) -> StoreResult<()> {
        let mut shelves = self.shelves.write().await;
        match shelves.documents.get(&id) {
            Some(d) if d.kind == kind => {
                shelves.documents.remove(&id);
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn count_by_status(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
    ) -> StoreResult<StatusCounts> {
        let shelves = self.shelves.read().await;
        let mut counts = StatusCounts::default();
        for doc in shelves
            .documents
            .values()
            .filter(|d| d.kind == kind && scope.matches(d.owner_id))
        {
            counts.record(doc.status);
        }
        Ok(counts)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: User) -> StoreResult<User> {
        let mut shelves = self.shelves.write().await;
        if shelves
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        shelves.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.shelves.read().await.users.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let shelves = self.shelves.read().await;
        let mut users: Vec<User> = shelves.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn update(&self, user: User) -> StoreResult<User> {
        let mut shelves = self.shelves.write().await;
        let existing = shelves.users.get(&user.id).ok_or(StoreError::NotFound)?;

        // Demoting or deactivating the last active admin through update is
        // the same hole as deleting them.
        let losing_admin =
            existing.role == Role::Admin && existing.active && !(user.role == Role::Admin && user.active);
        if losing_admin && active_admin_count(&shelves) <= 1 {
            return Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
        }

        shelves.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut shelves = self.shelves.write().await;
        let target = shelves.users.get(&id).ok_or(StoreError::NotFound)?.clone();
        if target.role == Role::Admin && target.active && active_admin_count(&shelves) <= 1 {
            return Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
        }
        shelves.users.remove(&id);
        Ok(())
    }

    async fn deactivate(&self, id: Uuid) -> StoreResult<User> {
        let mut shelves = self.shelves.write().await;
        let target = shelves.users.get(&id).ok_or(StoreError::NotFound)?.clone();
        if target.role == Role::Admin && target.active && active_admin_count(&shelves) <= 1 {
            return Err(StoreError::Conflict(LAST_ADMIN_MESSAGE.to_string()));
        }
        let user = shelves.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.active = false;
        Ok(user.clone())
    }

    async fn count_active_admins(&self) -> StoreResult<u64> {
        Ok(active_admin_count(&*self.shelves.read().await))
    }
}

fn active_admin_count(shelves: &Shelves) -> u64 {
    shelves
        .users
        .values()
        .filter(|u| u.role == Role::Admin && u.active)
        .count() as u64
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert(&self, invoice: Invoice) -> StoreResult<Invoice> {
        self.shelves
            .write()
            .await
            .invoices
            .insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        Ok(self.shelves.read().await.invoices.get(&id).cloned())
    }

    async fn list(
        &self,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Invoice>, u64)> {
        let shelves = self.shelves.read().await;
        let mut matching: Vec<Invoice> = shelves
            .invoices
            .values()
            .filter(|i| scope.matches(i.owner_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_slice(matching, page, limit))
    }

    async fn update(&self, invoice: Invoice) -> StoreResult<Invoice> {
        let mut shelves = self.shelves.write().await;
        if !shelves.invoices.contains_key(&invoice.id) {
            return Err(StoreError::NotFound);
        }
        shelves.invoices.insert(invoice.id, invoice.clone());
        Ok(invoice)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut shelves = self.shelves.write().await;
        shelves
            .invoices
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
