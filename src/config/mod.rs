//! Configuration management for Domainly Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// SMTP configuration for invoice mail
    pub smtp: Option<SmtpConfig>,
    /// Document storage configuration
    pub storage: StorageConfig,
    /// Base URL of the customer dashboard, used in invoice emails
    pub app_base_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for uploaded order documents
    pub root: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "https://id.domainly.example".to_string()),
            },
            smtp: Self::smtp_from_env()?,
            storage: StorageConfig {
                root: env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage/domain_docs".to_string()),
            },
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        })
    }

    /// SMTP is optional: without SMTP_HOST the service runs but invoice
    /// mail dispatch is skipped with a warning.
    fn smtp_from_env() -> Result<Option<SmtpConfig>> {
        let host = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => host,
            _ => return Ok(None),
        };

        Ok(Some(SmtpConfig {
            host,
            port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            use_tls: env::var("SMTP_USE_TLS")
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
            from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "billing@domainly.example".to_string()),
            from_name: env::var("SMTP_FROM_NAME").ok(),
        }))
    }

    /// HTTP listen address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}
