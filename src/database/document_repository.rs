//! Postgres-backed [`DocumentStore`].

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Document, DocumentKind, DocumentStatus, StatusCounts};
use crate::store::{DocumentStore, OwnerScope, StoreResult};

#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    kind: String,
    owner_id: Uuid,
    status: String,
    payload: JsonValue,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = anyhow::Error;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        Ok(Document {
            id: row.id,
            kind: row.kind.parse::<DocumentKind>().map_err(anyhow::Error::msg)?,
            owner_id: row.owner_id,
            status: row
                .status
                .parse::<DocumentStatus>()
                .map_err(anyhow::Error::msg)?,
            payload: row.payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn scope_owner(scope: OwnerScope) -> Option<Uuid> {
    match scope {
        OwnerScope::All => None,
        OwnerScope::Owner(id) => Some(id),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, doc: Document) -> StoreResult<Document> {
        sqlx::query(
            r#"
            INSERT INTO documents (id, kind, owner_id, status, payload, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(doc.id)
        .bind(doc.kind.as_str())
        .bind(doc.owner_id)
        .bind(doc.status.as_str())
        .bind(&doc.payload)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert document")?;

        info!(document_id = %doc.id, kind = %doc.kind, "created document");
        Ok(doc)
    }

    async fn get(&self, kind: DocumentKind, id: Uuid) -> StoreResult<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, kind, owner_id, status, payload, created_at, updated_at
            FROM documents
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch document")?;

        row.map(Document::try_from)
            .transpose()
            .map_err(StoreError::Backend)
    }

    async fn list(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Document>, u64)> {
        let owner = scope_owner(scope);
        // Saturating: `page` comes straight off the query string, and the
        // bound value must stay non-negative.
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT count(*) FROM documents
            WHERE kind = $1 AND ($2::uuid IS NULL OR owner_id = $2)
            "#,
        )
        .bind(kind.as_str())
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count documents")?;

        let rows = sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, kind, owner_id, status, payload, created_at, updated_at
            FROM documents
            WHERE kind = $1 AND ($2::uuid IS NULL OR owner_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(kind.as_str())
        .bind(owner)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list documents")?;

        let documents = rows
            .into_iter()
            .map(Document::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Backend)?;

        Ok((documents, total.max(0) as u64))
    }

    async fn update(&self, doc: Document) -> StoreResult<Document> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET status = $3, payload = $4, updated_at = $5
            WHERE id = $1 AND kind = $2
            "#,
        )
        .bind(doc.id)
        .bind(doc.kind.as_str())
        .bind(doc.status.as_str())
        .bind(&doc.payload)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to update document")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(doc)
    }

    async fn delete(&self, kind: DocumentKind, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to delete document")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        info!(document_id = %id, kind = %kind, "deleted document");
        Ok(())
    }

    async fn count_by_status(
        &self,
        kind: DocumentKind,
        scope: OwnerScope,
    ) -> StoreResult<StatusCounts> {
        let owner = scope_owner(scope);
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT status, count(*) FROM documents
            WHERE kind = $1 AND ($2::uuid IS NULL OR owner_id = $2)
            GROUP BY status
            "#,
        )
        .bind(kind.as_str())
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .context("Failed to count documents by status")?;

        let mut counts = StatusCounts::default();
        for (status, n) in rows {
            let status = status
                .parse::<DocumentStatus>()
                .map_err(|e| StoreError::Backend(anyhow::Error::msg(e)))?;
            let n = n.max(0) as u64;
            counts.total += n;
            match status {
                DocumentStatus::Draft => counts.draft += n,
                DocumentStatus::Pending => counts.pending += n,
                DocumentStatus::Approved => counts.approved += n,
            }
        }
        Ok(counts)
    }
}
