//! Domain registration orders and billing service
//!
//! Customers order domain registrations with supporting documents,
//! prices come from an admin-managed TLD catalog, and every order gets
//! exactly one invoice that moves through unpaid, paid or cancelled.

pub mod api;
pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod storage;
