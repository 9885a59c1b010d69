//! Common test utilities
//!
//! Integration tests need a throwaway MySQL instance. Point
//! `TEST_DATABASE_URL` (or `DATABASE_URL`) at one; tests skip
//! themselves when no database is reachable.

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Once;

static ENV_INIT: Once = Once::new();

fn init_env() {
    ENV_INIT.call_once(|| {
        let _ = dotenvy::dotenv();
    });
}

pub async fn get_test_pool() -> Result<MySqlPool, sqlx::Error> {
    init_env();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| sqlx::Error::Configuration("TEST_DATABASE_URL not set".into()))?;

    MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
}

pub async fn setup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Empty every table, children before parents so the foreign keys
/// stay satisfied.
pub async fn cleanup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    for table in [
        "invoices",
        "domain_order_documents",
        "domain_orders",
        "domain_tld_prices",
        "domain_tlds",
        "customers",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Insert a customer row and return its id. Orders and invoices
/// require one to exist.
#[allow(dead_code)]
pub async fn seed_customer(
    pool: &MySqlPool,
    name: &str,
    email: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query("INSERT INTO customers (name, email) VALUES (?, ?)")
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;
    Ok(result.last_insert_id() as i64)
}
