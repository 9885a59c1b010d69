//! TLD catalog repository

use crate::domain::{CreateTldInput, PriceTier, Tld, TldWithPrices, UpdateTldInput};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TldRepository: Send + Sync {
    async fn create(&self, input: &CreateTldInput) -> Result<TldWithPrices>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Tld>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Tld>>;
    async fn find_tier(&self, tld_id: i64, years: i32) -> Result<Option<PriceTier>>;
    async fn prices_for(&self, tld_id: i64) -> Result<Vec<PriceTier>>;
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<TldWithPrices>>;
    async fn count(&self) -> Result<i64>;
    async fn update(&self, id: i64, input: &UpdateTldInput) -> Result<TldWithPrices>;
    async fn delete(&self, id: i64) -> Result<()>;
}

pub struct TldRepositoryImpl {
    pool: MySqlPool,
}

impl TldRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn with_prices(&self, tld: Tld) -> Result<TldWithPrices> {
        let prices = self.prices_for(tld.id).await?;
        Ok(TldWithPrices { tld, prices })
    }
}

#[async_trait]
impl TldRepository for TldRepositoryImpl {
    async fn create(&self, input: &CreateTldInput) -> Result<TldWithPrices> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO domain_tlds (name, status, created_at, updated_at)
            VALUES (?, ?, NOW(), NOW())
            "#,
        )
        .bind(&input.name)
        .bind(input.status.unwrap_or_default())
        .execute(&mut *tx)
        .await?;

        let tld_id = result.last_insert_id() as i64;

        for tier in &input.prices {
            sqlx::query(
                r#"
                INSERT INTO domain_tld_prices
                    (tld_id, years, register_price, renewal_price, created_at, updated_at)
                VALUES (?, ?, ?, ?, NOW(), NOW())
                "#,
            )
            .bind(tld_id)
            .bind(tier.years)
            .bind(tier.register_price)
            .bind(tier.renewal_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let tld = self
            .find_by_id(tld_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to create TLD")))?;
        self.with_prices(tld).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tld>> {
        let tld = sqlx::query_as::<_, Tld>(
            r#"
            SELECT id, name, status, created_at, updated_at
            FROM domain_tlds
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tld)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Tld>> {
        let tld = sqlx::query_as::<_, Tld>(
            r#"
            SELECT id, name, status, created_at, updated_at
            FROM domain_tlds
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tld)
    }

    async fn find_tier(&self, tld_id: i64, years: i32) -> Result<Option<PriceTier>> {
        let tier = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT id, tld_id, years, register_price, renewal_price, created_at, updated_at
            FROM domain_tld_prices
            WHERE tld_id = ? AND years = ?
            "#,
        )
        .bind(tld_id)
        .bind(years)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tier)
    }

    async fn prices_for(&self, tld_id: i64) -> Result<Vec<PriceTier>> {
        let tiers = sqlx::query_as::<_, PriceTier>(
            r#"
            SELECT id, tld_id, years, register_price, renewal_price, created_at, updated_at
            FROM domain_tld_prices
            WHERE tld_id = ?
            ORDER BY years ASC
            "#,
        )
        .bind(tld_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tiers)
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<TldWithPrices>> {
        let tlds = sqlx::query_as::<_, Tld>(
            r#"
            SELECT id, name, status, created_at, updated_at
            FROM domain_tlds
            ORDER BY name ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(tlds.len());
        for tld in tlds {
            out.push(self.with_prices(tld).await?);
        }
        Ok(out)
    }

    async fn count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM domain_tlds")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn update(&self, id: i64, input: &UpdateTldInput) -> Result<TldWithPrices> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("TLD {} not found", id)))?;

        let name = input.name.as_ref().unwrap_or(&existing.name);
        let status = input.status.unwrap_or(existing.status);

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE domain_tlds
            SET name = ?, status = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(name)
        .bind(status)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // Absent prices leave tiers untouched; a present list replaces them
        if let Some(tiers) = &input.prices {
            sqlx::query("DELETE FROM domain_tld_prices WHERE tld_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for tier in tiers {
                sqlx::query(
                    r#"
                    INSERT INTO domain_tld_prices
                        (tld_id, years, register_price, renewal_price, created_at, updated_at)
                    VALUES (?, ?, ?, ?, NOW(), NOW())
                    "#,
                )
                .bind(id)
                .bind(tier.years)
                .bind(tier.register_price)
                .bind(tier.renewal_price)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let tld = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to update TLD")))?;
        self.with_prices(tld).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM domain_tlds WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("TLD {} not found", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_mock_tld_repository() {
        let mut mock = MockTldRepository::new();

        mock.expect_find_by_name()
            .with(eq(".com"))
            .returning(|_| Ok(None));

        let result = mock.find_by_name(".com").await.unwrap();
        assert!(result.is_none());
    }
}
