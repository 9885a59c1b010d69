//! Email template system
//!
//! Provides simple variable substitution for email templates.
//! Variables are specified using {{variable_name}} syntax; values are
//! HTML-escaped in HTML contexts and left verbatim in plain text.

use std::collections::HashMap;

/// Available email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    /// Sent to the customer when an invoice is issued for their order
    InvoiceIssued,
}

impl EmailTemplate {
    /// Get the subject line for this template
    pub fn subject(&self) -> &'static str {
        match self {
            Self::InvoiceIssued => "Your Domain Order Invoice - {{invoice_no}}",
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::InvoiceIssued => INVOICE_ISSUED_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        match self {
            Self::InvoiceIssued => INVOICE_ISSUED_TEMPLATE_TEXT,
        }
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Render an HTML template string, replacing {{variable}} with
    /// HTML-escaped values
    pub fn render(&self, template: &str) -> String {
        self.substitute(template, true)
    }

    /// Render a plain text template string, replacing {{variable}} with
    /// values verbatim
    pub fn render_text(&self, template: &str) -> String {
        self.substitute(template, false)
    }

    /// Render a complete email template
    pub fn render_template(&self, template: EmailTemplate) -> RenderedEmail {
        RenderedEmail {
            subject: self.render_text(template.subject()),
            html_body: self.render(template.html_body()),
            text_body: self.render_text(template.text_body()),
        }
    }

    // Single left-to-right pass over the template. Substituted values are
    // never rescanned, so a value that itself contains {{...}} stays
    // literal text.
    fn substitute(&self, template: &str, escape: bool) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match self.variables.get(key) {
                        Some(value) if escape => result.push_str(&escape_html(value)),
                        Some(value) => result.push_str(value),
                        // Unknown variables are left in place
                        None => {
                            result.push_str(&rest[start..start + 2 + end + 2]);
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }
}

/// Escape the HTML special characters in a value
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Rendered email with all variables substituted
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

// ============================================================================
// Email Templates
// ============================================================================

const INVOICE_ISSUED_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Invoice</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .header h1 { color: #2563eb; margin: 0; font-size: 24px; }
        .content { margin-bottom: 30px; }
        .details { width: 100%; border-collapse: collapse; margin: 20px 0; }
        .details td { padding: 8px 0; border-bottom: 1px solid #eee; }
        .details td:last-child { text-align: right; font-weight: 600; }
        .button { display: inline-block; background-color: #2563eb; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; color: #888; font-size: 12px; margin-top: 30px; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Invoice {{invoice_no}}</h1>
        </div>
        <div class="content">
            <p>Dear {{customer_name}},</p>
            <p>Thank you for your domain registration order. Your invoice is ready.</p>
            <table class="details">
                <tr><td>Invoice number</td><td>{{invoice_no}}</td></tr>
                <tr><td>Domain</td><td>{{domain_name}}</td></tr>
                <tr><td>Registration period</td><td>{{years}} year(s)</td></tr>
                <tr><td>Amount due</td><td>{{amount}}</td></tr>
            </table>
            <p style="text-align: center;">
                <a href="{{invoice_url}}" class="button">View Invoice</a>
            </p>
            <p>Your order will be processed once payment is received.</p>
        </div>
        <div class="footer">
            <p>If you did not place this order, please contact support.</p>
        </div>
    </div>
</body>
</html>"#;

const INVOICE_ISSUED_TEMPLATE_TEXT: &str = r#"Dear {{customer_name}},

Thank you for your domain registration order. Your invoice is ready.

Invoice number: {{invoice_no}}
Domain: {{domain_name}}
Registration period: {{years}} year(s)
Amount due: {{amount}}

View your invoice at: {{invoice_url}}

Your order will be processed once payment is received.

If you did not place this order, please contact support."#;
