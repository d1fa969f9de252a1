//! Postgres-backed [`InvoiceStore`].

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Invoice, InvoiceStatus};
use crate::store::{InvoiceStore, OwnerScope, StoreResult};

#[derive(Debug, Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    owner_id: Uuid,
    client_name: String,
    status: String,
    total: Decimal,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = anyhow::Error;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            owner_id: row.owner_id,
            client_name: row.client_name,
            status: row
                .status
                .parse::<InvoiceStatus>()
                .map_err(anyhow::Error::msg)?,
            total: row.total,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn insert(&self, invoice: Invoice) -> StoreResult<Invoice> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, owner_id, client_name, status, total, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.owner_id)
        .bind(&invoice.client_name)
        .bind(invoice.status.as_str())
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert invoice")?;

        info!(invoice_id = %invoice.id, "created invoice");
        Ok(invoice)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, owner_id, client_name, status, total, currency, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch invoice")?;

        row.map(Invoice::try_from)
            .transpose()
            .map_err(StoreError::Backend)
    }

    async fn list(
        &self,
        scope: OwnerScope,
        page: u64,
        limit: u64,
    ) -> StoreResult<(Vec<Invoice>, u64)> {
        let owner = match scope {
            OwnerScope::All => None,
            OwnerScope::Owner(id) => Some(id),
        };
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);

        let total: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM invoices WHERE ($1::uuid IS NULL OR owner_id = $1)",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count invoices")?;

        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, owner_id, client_name, status, total, currency, created_at, updated_at
            FROM invoices
            WHERE ($1::uuid IS NULL OR owner_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list invoices")?;

        let invoices = rows
            .into_iter()
            .map(Invoice::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::Backend)?;

        Ok((invoices, total.max(0) as u64))
    }

    async fn update(&self, invoice: Invoice) -> StoreResult<Invoice> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_name = $2, status = $3, total = $4, currency = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(&invoice.client_name)
        .bind(invoice.status.as_str())
        .bind(invoice.total)
        .bind(&invoice.currency)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .context("Failed to update invoice")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(invoice)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete invoice")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        info!(invoice_id = %id, "deleted invoice");
        Ok(())
    }
}
