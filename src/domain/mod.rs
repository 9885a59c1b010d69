//! Domain models

pub mod actor;
pub mod common;
pub mod customer;
pub mod email;
pub mod invoice;
pub mod order;
pub mod tld;

pub use actor::*;
pub use common::*;
pub use customer::*;
pub use email::*;
pub use invoice::*;
pub use order::*;
pub use tld::*;
