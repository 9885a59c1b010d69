//! Order creation and management business logic

use crate::domain::{
    Actor, CreateOrderRequest, DocumentAttachment, NewDocumentAttachment, NewOrder,
    OrderPlacement, OrderWithDocuments, Role,
};
use crate::error::{AppError, Result};
use crate::repository::{
    CustomerRepository, InvoiceRepository, OrderListFilter, OrderRepository, TldRepository,
};
use crate::service::{InvoiceService, PricingService};
use crate::storage::FileStorage;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

pub struct OrderService<OR, TR, CR, IR>
where
    OR: OrderRepository,
    TR: TldRepository,
    CR: CustomerRepository,
    IR: InvoiceRepository,
{
    repo: Arc<OR>,
    pricing: Arc<PricingService<TR>>,
    customer_repo: Arc<CR>,
    invoice_repo: Arc<IR>,
    invoice_service: Arc<InvoiceService<IR, OR, CR>>,
    storage: Arc<dyn FileStorage>,
}

fn unknown_customer_error() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut e = ValidationError::new("exists");
    e.message = Some("The selected customer does not exist.".into());
    errors.add("customer_id", e);
    errors
}

impl<OR, TR, CR, IR> OrderService<OR, TR, CR, IR>
where
    OR: OrderRepository,
    TR: TldRepository,
    CR: CustomerRepository,
    IR: InvoiceRepository,
{
    pub fn new(
        repo: Arc<OR>,
        pricing: Arc<PricingService<TR>>,
        customer_repo: Arc<CR>,
        invoice_repo: Arc<IR>,
        invoice_service: Arc<InvoiceService<IR, OR, CR>>,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            repo,
            pricing,
            customer_repo,
            invoice_repo,
            invoice_service,
            storage,
        }
    }

    /// Create an order: validate, price it from the catalog, store the
    /// uploaded documents, persist order and attachments in one
    /// transaction, then issue the invoice.
    pub async fn create(&self, actor: &Actor, request: CreateOrderRequest) -> Result<OrderPlacement> {
        let requested_customer_id = request.customer_id;
        let valid = request.validate_for(actor.role)?;

        let customer_id = match actor.role {
            Role::Admin => requested_customer_id.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("customer_id missing after validation"))
            })?,
            Role::Customer => actor.id,
        };

        if self.customer_repo.find_by_id(customer_id).await?.is_none() {
            if actor.is_admin() {
                return Err(AppError::Validation(unknown_customer_error()));
            }
            return Err(AppError::NotFound("Customer account not found".to_string()));
        }

        // Catalog price is authoritative; client-submitted amounts are ignored
        let quote = self.pricing.resolve_price(&valid.suffix, valid.years).await?;

        // Files land on storage before the database transaction so a
        // commit never references bytes that failed to write
        let storage_key = Uuid::new_v4().to_string();
        let mut attachments = Vec::with_capacity(valid.documents.len());
        for doc in &valid.documents {
            match self
                .storage
                .store(&storage_key, &doc.file_name, &doc.content)
                .await
            {
                Ok(file_path) => attachments.push(NewDocumentAttachment {
                    doc_type: doc.doc_type,
                    file_path,
                }),
                Err(e) => {
                    self.cleanup_storage(&storage_key).await;
                    return Err(e);
                }
            }
        }

        let new_order = NewOrder {
            customer_id,
            domain_name: valid.domain_name,
            years: valid.years,
            amount: quote.register_price,
            customer_type: valid.customer_type,
            storage_key: storage_key.clone(),
        };

        let (order, documents) = match self.repo.create_with_documents(&new_order, &attachments).await
        {
            Ok(created) => created,
            Err(e) => {
                self.cleanup_storage(&storage_key).await;
                return Err(e);
            }
        };

        let invoice = self.invoice_service.issue(&order).await?;

        Ok(OrderPlacement {
            order,
            documents,
            invoice,
        })
    }

    async fn cleanup_storage(&self, storage_key: &str) {
        if let Err(e) = self.storage.remove_namespace(storage_key).await {
            warn!(storage_key, error = %e, "Failed to clean up stored documents");
        }
    }

    /// List orders. Customers only ever see their own; admins may filter
    /// by customer.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: OrderListFilter,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<crate::domain::Order>, i64)> {
        if !actor.is_admin() {
            filter.customer_id = Some(actor.id);
        }

        let orders = self.repo.list(&filter, offset, limit).await?;
        let total = self.repo.count(&filter).await?;
        Ok((orders, total))
    }

    pub async fn get(&self, actor: &Actor, id: i64) -> Result<OrderWithDocuments> {
        let order = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        if !actor.can_access_customer(order.customer_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this order".to_string(),
            ));
        }

        let documents = self.repo.documents_for(order.id).await?;
        Ok(OrderWithDocuments { order, documents })
    }

    /// Fetch one attached document's metadata and bytes, with the same
    /// ownership rules as reading the order itself.
    pub async fn document(
        &self,
        actor: &Actor,
        order_id: i64,
        document_id: i64,
    ) -> Result<(DocumentAttachment, Vec<u8>)> {
        let order = self.get(actor, order_id).await?;

        let attachment = order
            .documents
            .into_iter()
            .find(|d| d.id == document_id)
            .ok_or_else(|| AppError::NotFound(format!("Document {} not found", document_id)))?;

        let bytes = self.storage.retrieve(&attachment.file_path).await?;
        Ok((attachment, bytes))
    }

    /// Delete an order and its stored documents. Customers may only
    /// delete their own; orders that have been invoiced are kept for
    /// the financial record.
    pub async fn delete(&self, actor: &Actor, id: i64) -> Result<()> {
        let order = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {} not found", id)))?;

        if !actor.can_access_customer(order.customer_id) {
            return Err(AppError::Forbidden(
                "You do not have access to this order".to_string(),
            ));
        }

        if self.invoice_repo.find_by_order_id(order.id).await?.is_some() {
            return Err(AppError::Conflict(
                "Order has an invoice and cannot be deleted".to_string(),
            ));
        }

        self.repo.delete(order.id).await?;
        self.cleanup_storage(&order.storage_key).await;
        Ok(())
    }
}
