//! Invoice repository

use crate::domain::{Invoice, InvoiceStatus, NewInvoice};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

/// Filters applied to invoice listings
#[derive(Debug, Clone, Default)]
pub struct InvoiceListFilter {
    /// Restrict to one customer's invoices
    pub customer_id: Option<i64>,
    pub status: Option<InvoiceStatus>,
    /// Substring match on the invoice number
    pub search: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn create(&self, input: &NewInvoice) -> Result<Invoice>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>>;
    async fn find_by_order_id(&self, order_id: i64) -> Result<Option<Invoice>>;
    async fn list(
        &self,
        filter: &InvoiceListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Invoice>>;
    async fn count(&self, filter: &InvoiceListFilter) -> Result<i64>;
    async fn set_status(
        &self,
        id: i64,
        status: InvoiceStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice>;
}

pub struct InvoiceRepositoryImpl {
    pool: MySqlPool,
}

impl InvoiceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const INVOICE_COLUMNS: &str =
    "id, invoice_no, order_id, customer_id, amount, status, paid_at, created_at, updated_at";

fn push_filter_sql(sql: &mut String, filter: &InvoiceListFilter) {
    if filter.customer_id.is_some() {
        sql.push_str(" AND customer_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.search.is_some() {
        sql.push_str(" AND invoice_no LIKE ?");
    }
}

#[async_trait]
impl InvoiceRepository for InvoiceRepositoryImpl {
    async fn create(&self, input: &NewInvoice) -> Result<Invoice> {
        let result = sqlx::query(
            r#"
            INSERT INTO invoices
                (invoice_no, order_id, customer_id, amount, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'unpaid', NOW(), NOW())
            "#,
        )
        .bind(&input.invoice_no)
        .bind(input.order_id)
        .bind(input.customer_id)
        .bind(input.amount)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id() as i64;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create invoice")))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE id = ?",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn find_by_order_id(&self, order_id: i64) -> Result<Option<Invoice>> {
        let invoice = sqlx::query_as::<_, Invoice>(&format!(
            "SELECT {} FROM invoices WHERE order_id = ?",
            INVOICE_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn list(
        &self,
        filter: &InvoiceListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Invoice>> {
        let mut sql = format!("SELECT {} FROM invoices WHERE 1=1", INVOICE_COLUMNS);
        push_filter_sql(&mut sql, filter);
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Invoice>(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search));
        }

        let invoices = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(invoices)
    }

    async fn count(&self, filter: &InvoiceListFilter) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM invoices WHERE 1=1");
        push_filter_sql(&mut sql, filter);

        let mut query = sqlx::query_as::<_, (i64,)>(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search));
        }

        let row = query.fetch_one(&self.pool).await?;
        Ok(row.0)
    }

    async fn set_status(
        &self,
        id: i64,
        status: InvoiceStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<Invoice> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET status = ?, paid_at = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(paid_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Invoice {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update invoice")))
    }
}
