//! Invoice issuance and lifecycle business logic

use crate::domain::{
    invoice_number, Actor, EmailAddress, EmailMessage, Invoice, InvoiceStatus, NewInvoice, Order,
};
use crate::email::{EmailProvider, EmailTemplate, TemplateEngine};
use crate::error::{AppError, Result};
use crate::repository::{CustomerRepository, InvoiceListFilter, InvoiceRepository, OrderRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::warn;

pub struct InvoiceService<IR, OR, CR>
where
    IR: InvoiceRepository,
    OR: OrderRepository,
    CR: CustomerRepository,
{
    repo: Arc<IR>,
    order_repo: Arc<OR>,
    customer_repo: Arc<CR>,
    email_provider: Option<Arc<dyn EmailProvider>>,
    app_base_url: String,
}

impl<IR, OR, CR> InvoiceService<IR, OR, CR>
where
    IR: InvoiceRepository,
    OR: OrderRepository,
    CR: CustomerRepository,
{
    pub fn new(
        repo: Arc<IR>,
        order_repo: Arc<OR>,
        customer_repo: Arc<CR>,
        email_provider: Option<Arc<dyn EmailProvider>>,
        app_base_url: String,
    ) -> Self {
        Self {
            repo,
            order_repo,
            customer_repo,
            email_provider,
            app_base_url,
        }
    }

    /// Issue the invoice for a freshly created order and notify the customer.
    /// Notification failures are logged and never fail the order.
    pub async fn issue(&self, order: &Order) -> Result<Invoice> {
        let invoice = self
            .repo
            .create(&NewInvoice {
                invoice_no: invoice_number(Utc::now().date_naive(), order.id),
                order_id: order.id,
                customer_id: order.customer_id,
                amount: order.amount,
            })
            .await?;

        self.notify_issued(order, &invoice).await;

        Ok(invoice)
    }

    async fn notify_issued(&self, order: &Order, invoice: &Invoice) {
        let Some(provider) = &self.email_provider else {
            warn!(invoice_no = %invoice.invoice_no, "No email provider configured, skipping invoice notification");
            return;
        };

        let customer = match self.customer_repo.find_by_id(order.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                warn!(customer_id = order.customer_id, "Customer not found for invoice notification");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load customer for invoice notification");
                return;
            }
        };

        let mut engine = TemplateEngine::new();
        engine
            .set("customer_name", &customer.name)
            .set("invoice_no", &invoice.invoice_no)
            .set("domain_name", &order.domain_name)
            .set("years", order.years.to_string())
            .set("amount", invoice.amount.to_string())
            .set(
                "invoice_url",
                format!("{}/api/v1/invoices/{}/download", self.app_base_url, invoice.id),
            );
        let rendered = engine.render_template(EmailTemplate::InvoiceIssued);

        let message = EmailMessage::new(
            EmailAddress::with_name(&customer.email, &customer.name),
            rendered.subject,
            rendered.html_body,
        )
        .with_text_body(rendered.text_body);

        match provider.send(&message).await {
            Ok(result) if result.success => {}
            Ok(result) => {
                warn!(
                    invoice_no = %invoice.invoice_no,
                    error = ?result.error,
                    "Invoice notification was not delivered"
                );
            }
            Err(e) => {
                warn!(invoice_no = %invoice.invoice_no, error = %e, "Failed to send invoice notification");
            }
        }
    }

    /// Admin-wide invoice listing
    pub async fn list(
        &self,
        actor: &Actor,
        filter: &InvoiceListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Invoice>, i64)> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins may list all invoices".to_string(),
            ));
        }

        let invoices = self.repo.list(filter, offset, limit).await?;
        let total = self.repo.count(filter).await?;
        Ok((invoices, total))
    }

    /// The calling customer's own invoices
    pub async fn list_own(
        &self,
        actor: &Actor,
        status: Option<InvoiceStatus>,
        search: Option<String>,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Invoice>, i64)> {
        let filter = InvoiceListFilter {
            customer_id: Some(actor.id),
            status,
            search,
        };

        let invoices = self.repo.list(&filter, offset, limit).await?;
        let total = self.repo.count(&filter).await?;
        Ok((invoices, total))
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> Result<Invoice> {
        let invoice = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

        if !actor.can_access_customer(invoice.customer_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this invoice".to_string(),
            ));
        }

        Ok(invoice)
    }

    /// Mark an invoice paid. Re-marking a paid invoice is a no-op;
    /// a cancelled invoice can never become paid.
    pub async fn mark_paid(&self, actor: &Actor, id: i64) -> Result<Invoice> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins may mark invoices paid".to_string(),
            ));
        }

        let invoice = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

        match invoice.status {
            InvoiceStatus::Paid => Ok(invoice),
            InvoiceStatus::Cancelled => Err(AppError::Conflict(
                "A cancelled invoice cannot be marked paid".to_string(),
            )),
            InvoiceStatus::Unpaid => {
                self.repo
                    .set_status(id, InvoiceStatus::Paid, Some(Utc::now()))
                    .await
            }
        }
    }

    /// Cancel an invoice. Re-cancelling is a no-op; a paid invoice
    /// cannot be cancelled.
    pub async fn mark_cancelled(&self, actor: &Actor, id: i64) -> Result<Invoice> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins may cancel invoices".to_string(),
            ));
        }

        let invoice = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

        match invoice.status {
            InvoiceStatus::Cancelled => Ok(invoice),
            InvoiceStatus::Paid => Err(AppError::Conflict(
                "A paid invoice cannot be cancelled".to_string(),
            )),
            InvoiceStatus::Unpaid => {
                self.repo
                    .set_status(id, InvoiceStatus::Cancelled, None)
                    .await
            }
        }
    }

    /// Render the printable invoice document for download.
    pub async fn render_document(&self, actor: &Actor, id: i64) -> Result<(Invoice, String)> {
        let invoice = self.get(actor, id).await?;

        let order = self
            .order_repo
            .find_by_id(invoice.order_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Order {} missing for invoice", invoice.order_id))
            })?;
        let customer = self
            .customer_repo
            .find_by_id(invoice.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Customer {} missing for invoice",
                    invoice.customer_id
                ))
            })?;

        let mut engine = TemplateEngine::new();
        engine
            .set("invoice_no", &invoice.invoice_no)
            .set("status", invoice.status.to_string())
            .set("customer_name", &customer.name)
            .set("customer_email", &customer.email)
            .set("domain_name", &order.domain_name)
            .set("years", order.years.to_string())
            .set("amount", invoice.amount.to_string())
            .set("issued_on", invoice.created_at.format("%Y-%m-%d").to_string())
            .set(
                "paid_on",
                invoice
                    .paid_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );

        let html = engine.render(INVOICE_DOCUMENT_TEMPLATE);
        Ok((invoice, html))
    }
}

const INVOICE_DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Invoice {{invoice_no}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; color: #333; max-width: 700px; margin: 40px auto; }
        h1 { font-size: 22px; }
        .meta { color: #666; margin-bottom: 24px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 10px 8px; border-bottom: 1px solid #ddd; }
        .total td { font-weight: 700; border-top: 2px solid #333; }
        .status { text-transform: uppercase; letter-spacing: 1px; }
    </style>
</head>
<body>
    <h1>Invoice {{invoice_no}}</h1>
    <p class="meta">
        Status: <span class="status">{{status}}</span><br>
        Issued: {{issued_on}}<br>
        Paid: {{paid_on}}
    </p>
    <p>
        Billed to:<br>
        <strong>{{customer_name}}</strong><br>
        {{customer_email}}
    </p>
    <table>
        <tr><th>Description</th><th>Amount</th></tr>
        <tr>
            <td>Domain registration: {{domain_name}} ({{years}} year(s))</td>
            <td>{{amount}}</td>
        </tr>
        <tr class="total"><td>Total due</td><td>{{amount}}</td></tr>
    </table>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerType, Money, OrderStatus};
    use crate::repository::{
        MockCustomerRepository, MockInvoiceRepository, MockOrderRepository,
    };
    use mockall::predicate::*;

    fn order(id: i64, customer_id: i64) -> Order {
        Order {
            id,
            customer_id,
            domain_name: "example.com".to_string(),
            years: 2,
            amount: Money(2598),
            customer_type: CustomerType::Company,
            status: OrderStatus::Pending,
            storage_key: "deadbeef-0000-0000-0000-000000000000".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn invoice(id: i64, status: InvoiceStatus) -> Invoice {
        Invoice {
            id,
            invoice_no: "INV-20260829-00001".to_string(),
            order_id: 1,
            customer_id: 10,
            amount: Money(2598),
            status,
            paid_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(
        repo: MockInvoiceRepository,
        order_repo: MockOrderRepository,
        customer_repo: MockCustomerRepository,
    ) -> InvoiceService<MockInvoiceRepository, MockOrderRepository, MockCustomerRepository> {
        InvoiceService::new(
            Arc::new(repo),
            Arc::new(order_repo),
            Arc::new(customer_repo),
            None,
            "http://localhost:3000".to_string(),
        )
    }

    #[tokio::test]
    async fn test_issue_copies_order_amount() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_create()
            .withf(|input: &NewInvoice| {
                input.order_id == 1 && input.customer_id == 10 && input.amount == Money(2598)
            })
            .returning(|input| {
                let mut created = invoice(1, InvoiceStatus::Unpaid);
                created.invoice_no = input.invoice_no.clone();
                Ok(created)
            });

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let created = service.issue(&order(1, 10)).await.unwrap();

        assert!(created.invoice_no.starts_with("INV-"));
        assert!(created.invoice_no.ends_with("-00001"));
        assert_eq!(created.status, InvoiceStatus::Unpaid);
    }

    #[tokio::test]
    async fn test_mark_paid_transitions_unpaid_invoice() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .with(eq(1))
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Unpaid))));
        repo.expect_set_status()
            .withf(|id, status, paid_at| {
                *id == 1 && *status == InvoiceStatus::Paid && paid_at.is_some()
            })
            .returning(|id, status, paid_at| {
                let mut updated = invoice(id, status);
                updated.paid_at = paid_at;
                Ok(updated)
            });

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let admin = Actor::admin(1, "ops@example.com");
        let updated = service.mark_paid(&admin, 1).await.unwrap();

        assert_eq!(updated.status, InvoiceStatus::Paid);
        assert!(updated.paid_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Paid))));
        // No set_status expectation: the repo must not be written

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let admin = Actor::admin(1, "ops@example.com");
        let unchanged = service.mark_paid(&admin, 1).await.unwrap();
        assert_eq!(unchanged.status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_mark_paid_rejects_cancelled_invoice() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Cancelled))));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let admin = Actor::admin(1, "ops@example.com");
        let err = service.mark_paid(&admin, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mark_paid_requires_admin() {
        let service = service(
            MockInvoiceRepository::new(),
            MockOrderRepository::new(),
            MockCustomerRepository::new(),
        );
        let customer = Actor::customer(10, "alice@example.com");
        let err = service.mark_paid(&customer, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_mark_cancelled_rejects_paid_invoice() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Paid))));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let admin = Actor::admin(1, "ops@example.com");
        let err = service.mark_cancelled(&admin, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_mark_cancelled_is_idempotent() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Cancelled))));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let admin = Actor::admin(1, "ops@example.com");
        let unchanged = service.mark_cancelled(&admin, 1).await.unwrap();
        assert_eq!(unchanged.status, InvoiceStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_get_denies_other_customers() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Unpaid))));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let other = Actor::customer(99, "mallory@example.com");
        let err = service.get(&other, 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_get_allows_owner_and_admin() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Unpaid))));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let owner = Actor::customer(10, "alice@example.com");
        assert!(service.get(&owner, 1).await.is_ok());

        let admin = Actor::admin(1, "ops@example.com");
        assert!(service.get(&admin, 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_requires_admin() {
        let service = service(
            MockInvoiceRepository::new(),
            MockOrderRepository::new(),
            MockCustomerRepository::new(),
        );
        let customer = Actor::customer(10, "alice@example.com");
        let err = service
            .list(&customer, &InvoiceListFilter::default(), 0, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_own_is_scoped_to_actor() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_list()
            .withf(|filter, _, _| filter.customer_id == Some(10))
            .returning(|_, _, _| Ok(vec![invoice(1, InvoiceStatus::Unpaid)]));
        repo.expect_count()
            .withf(|filter| filter.customer_id == Some(10))
            .returning(|_| Ok(1));

        let service = service(repo, MockOrderRepository::new(), MockCustomerRepository::new());
        let owner = Actor::customer(10, "alice@example.com");
        let (invoices, total) = service.list_own(&owner, None, None, 0, 20).await.unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_render_document_contains_details() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Unpaid))));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_id()
            .returning(|_| Ok(Some(order(1, 10))));

        let mut customer_repo = MockCustomerRepository::new();
        customer_repo.expect_find_by_id().returning(|_| {
            Ok(Some(crate::domain::Customer {
                id: 10,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let service = service(repo, order_repo, customer_repo);
        let owner = Actor::customer(10, "alice@example.com");
        let (_, html) = service.render_document(&owner, 1).await.unwrap();

        assert!(html.contains("INV-20260829-00001"));
        assert!(html.contains("example.com"));
        assert!(html.contains("25.98"));
        assert!(!html.contains("{{"));
    }

    #[tokio::test]
    async fn test_render_document_escapes_domain_name() {
        let mut repo = MockInvoiceRepository::new();
        repo.expect_find_by_id()
            .returning(|_| Ok(Some(invoice(1, InvoiceStatus::Unpaid))));

        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().returning(|_| {
            let mut order = order(1, 10);
            order.domain_name = "<script>alert(1)</script>.com".to_string();
            Ok(Some(order))
        });

        let mut customer_repo = MockCustomerRepository::new();
        customer_repo.expect_find_by_id().returning(|_| {
            Ok(Some(crate::domain::Customer {
                id: 10,
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });

        let service = service(repo, order_repo, customer_repo);
        let owner = Actor::customer(10, "alice@example.com");
        let (_, html) = service.render_document(&owner, 1).await.unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;.com"));
    }
}
