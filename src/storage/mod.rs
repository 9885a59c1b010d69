//! Document file storage

pub mod local;

pub use local::*;
