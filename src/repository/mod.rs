//! Data access layer

pub mod customer;
pub mod invoice;
pub mod order;
pub mod tld;

pub use customer::*;
pub use invoice::*;
pub use order::*;
pub use tld::*;
