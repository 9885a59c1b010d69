//! Domain order repository

use crate::domain::{
    DocumentAttachment, NewDocumentAttachment, NewOrder, Order, OrderStatus,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Filters applied to order listings
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    /// Restrict to one customer's orders
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    /// Substring match on the domain name
    pub search: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order row and all of its attachment rows in one transaction.
    async fn create_with_documents(
        &self,
        order: &NewOrder,
        documents: &[NewDocumentAttachment],
    ) -> Result<(Order, Vec<DocumentAttachment>)>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Order>>;
    async fn documents_for(&self, order_id: i64) -> Result<Vec<DocumentAttachment>>;
    async fn list(&self, filter: &OrderListFilter, offset: i64, limit: i64) -> Result<Vec<Order>>;
    async fn count(&self, filter: &OrderListFilter) -> Result<i64>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct OrderRepositoryImpl {
    pool: MySqlPool,
}

impl OrderRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, domain_name, years, amount, customer_type, status, storage_key, created_at, updated_at";

fn push_filter_sql(sql: &mut String, filter: &OrderListFilter) {
    if filter.customer_id.is_some() {
        sql.push_str(" AND customer_id = ?");
    }
    if filter.status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if filter.search.is_some() {
        sql.push_str(" AND domain_name LIKE ?");
    }
}

#[async_trait]
impl OrderRepository for OrderRepositoryImpl {
    async fn create_with_documents(
        &self,
        order: &NewOrder,
        documents: &[NewDocumentAttachment],
    ) -> Result<(Order, Vec<DocumentAttachment>)> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO domain_orders
                (customer_id, domain_name, years, amount, customer_type, status, storage_key,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, NOW(), NOW())
            "#,
        )
        .bind(order.customer_id)
        .bind(&order.domain_name)
        .bind(order.years)
        .bind(order.amount)
        .bind(order.customer_type)
        .bind(&order.storage_key)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_id() as i64;

        for doc in documents {
            sqlx::query(
                r#"
                INSERT INTO domain_order_documents (order_id, doc_type, file_path, created_at)
                VALUES (?, ?, ?, NOW())
                "#,
            )
            .bind(order_id)
            .bind(doc.doc_type)
            .bind(&doc.file_path)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let created = self
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create order")))?;
        let documents = self.documents_for(order_id).await?;

        Ok((created, documents))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM domain_orders WHERE id = ?",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn documents_for(&self, order_id: i64) -> Result<Vec<DocumentAttachment>> {
        let documents = sqlx::query_as::<_, DocumentAttachment>(
            r#"
            SELECT id, order_id, doc_type, file_path, created_at
            FROM domain_order_documents
            WHERE order_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn list(&self, filter: &OrderListFilter, offset: i64, limit: i64) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {} FROM domain_orders WHERE 1=1", ORDER_COLUMNS);
        push_filter_sql(&mut sql, filter);
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query_as::<_, Order>(&sql);
        if let Some(customer_id) = filter.customer_id {
            query = query.bind(customer_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", search));
        }

        let orders = query.bind(limit).bind(offset).fetch_all(&self.pool).await?;
        Ok(orders)
    }

    async fn count(&self, filter: &OrderListFilter) -> Result<i64> {
        let mut sql = String::from("SELECT COUNT(*) FROM domain_orders WHERE 1=1");
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

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM domain_order_documents WHERE order_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM domain_orders WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Order {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }
}
