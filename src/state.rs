//! Shared application state

use crate::config::Config;
use crate::jwt::JwtManager;
use crate::repository::{
    CustomerRepositoryImpl, InvoiceRepositoryImpl, OrderRepositoryImpl, TldRepositoryImpl,
};
use crate::service::{InvoiceService, OrderService, PricingService};
use sqlx::MySqlPool;
use std::sync::Arc;

pub type PricingSvc = PricingService<TldRepositoryImpl>;
pub type InvoiceSvc =
    InvoiceService<InvoiceRepositoryImpl, OrderRepositoryImpl, CustomerRepositoryImpl>;
pub type OrderSvc = OrderService<
    OrderRepositoryImpl,
    TldRepositoryImpl,
    CustomerRepositoryImpl,
    InvoiceRepositoryImpl,
>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: MySqlPool,
    pub jwt_manager: Arc<JwtManager>,
    pub pricing_service: Arc<PricingSvc>,
    pub order_service: Arc<OrderSvc>,
    pub invoice_service: Arc<InvoiceSvc>,
}

impl AppState {
    /// Readiness check used by /ready
    pub async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
