//! Business logic layer

pub mod invoice;
pub mod order;
pub mod pricing;

pub use invoice::InvoiceService;
pub use order::OrderService;
pub use pricing::PricingService;
