//! Order repository integration tests

use domainly_core::domain::{
    CustomerType, DocumentType, Money, NewDocumentAttachment, NewOrder, OrderStatus,
};
use domainly_core::repository::order::OrderRepositoryImpl;
use domainly_core::repository::{OrderListFilter, OrderRepository};

mod common;

fn new_order(customer_id: i64, domain_name: &str) -> NewOrder {
    NewOrder {
        customer_id,
        domain_name: domain_name.to_string(),
        years: 1,
        amount: Money(1200_00),
        customer_type: CustomerType::Individual,
        storage_key: "11111111-2222-3333-4444-555555555555".to_string(),
    }
}

#[tokio::test]
async fn test_create_with_documents_is_atomic() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let customer_id = common::seed_customer(&pool, "Alice", "alice@example.com")
        .await
        .unwrap();
    let repo = OrderRepositoryImpl::new(pool.clone());

    let documents = vec![
        NewDocumentAttachment {
            doc_type: DocumentType::Nid,
            file_path: "orders/abc/nid.pdf".to_string(),
        },
        NewDocumentAttachment {
            doc_type: DocumentType::TradeLicense,
            file_path: "orders/abc/license.pdf".to_string(),
        },
    ];

    let (order, docs) = repo
        .create_with_documents(&new_order(customer_id, "example.com"), &documents)
        .await
        .unwrap();

    assert_eq!(order.customer_id, customer_id);
    assert_eq!(order.domain_name, "example.com");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount, Money(1200_00));
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.order_id == order.id));

    let fetched = repo.documents_for(order.id).await.unwrap();
    assert_eq!(fetched.len(), 2);

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_list_filters_by_customer_and_search() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let alice = common::seed_customer(&pool, "Alice", "alice@example.com")
        .await
        .unwrap();
    let bob = common::seed_customer(&pool, "Bob", "bob@example.com")
        .await
        .unwrap();
    let repo = OrderRepositoryImpl::new(pool.clone());

    repo.create_with_documents(&new_order(alice, "alpha.com"), &[])
        .await
        .unwrap();
    repo.create_with_documents(&new_order(alice, "beta.net"), &[])
        .await
        .unwrap();
    repo.create_with_documents(&new_order(bob, "gamma.com"), &[])
        .await
        .unwrap();

    let own = OrderListFilter {
        customer_id: Some(alice),
        ..Default::default()
    };
    assert_eq!(repo.count(&own).await.unwrap(), 2);
    let orders = repo.list(&own, 0, 10).await.unwrap();
    assert!(orders.iter().all(|o| o.customer_id == alice));

    let search = OrderListFilter {
        search: Some("gamma".to_string()),
        ..Default::default()
    };
    let orders = repo.list(&search, 0, 10).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].domain_name, "gamma.com");

    common::cleanup_database(&pool).await.unwrap();
}

#[tokio::test]
async fn test_delete_removes_order_and_documents() {
    let pool = match common::get_test_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Skipping test: could not connect to database: {}", e);
            return;
        }
    };

    common::setup_database(&pool).await.unwrap();
    common::cleanup_database(&pool).await.unwrap();

    let customer_id = common::seed_customer(&pool, "Alice", "alice@example.com")
        .await
        .unwrap();
    let repo = OrderRepositoryImpl::new(pool.clone());

    let (order, _) = repo
        .create_with_documents(
            &new_order(customer_id, "example.com"),
            &[NewDocumentAttachment {
                doc_type: DocumentType::Nid,
                file_path: "orders/abc/nid.pdf".to_string(),
            }],
        )
        .await
        .unwrap();

    repo.delete(order.id).await.unwrap();
    assert!(repo.find_by_id(order.id).await.unwrap().is_none());
    assert!(repo.documents_for(order.id).await.unwrap().is_empty());

    common::cleanup_database(&pool).await.unwrap();
}
