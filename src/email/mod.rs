//! Email sending for invoice notifications
//!
//! SMTP delivery via lettre, with a provider trait so services can be
//! tested without a mail server.

pub mod provider;
pub mod smtp;
pub mod templates;

pub use provider::{EmailProvider, EmailProviderError};
pub use smtp::SmtpEmailProvider;
pub use templates::{EmailTemplate, RenderedEmail, TemplateEngine};
