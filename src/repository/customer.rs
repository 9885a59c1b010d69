//! Customer repository (read-only; accounts are provisioned elsewhere)

use crate::domain::Customer;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>>;
}

pub struct CustomerRepositoryImpl {
    pool: MySqlPool,
}

impl CustomerRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerRepository for CustomerRepositoryImpl {
    async fn find_by_id(&self, id: i64) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, created_at, updated_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }
}
