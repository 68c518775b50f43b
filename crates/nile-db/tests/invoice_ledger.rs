//! End-to-end ledger workflows against a real SQLite database.

use nile_core::{
    CreateInvoiceRequest, FxRate, InvoiceLineRequest, Money, NewCustomer, NewProduct, Product,
    ProductUpdate, WithdrawRequest,
};
use nile_db::{Database, DbConfig, DbError, LedgerError};
use rust_decimal_macros::dec;
use std::time::Duration;

const USER: &str = "user-1";
const OTHER_USER: &str = "user-2";

// =============================================================================
// Helpers
// =============================================================================

async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn customer(db: &Database, user_id: &str) -> String {
    db.customers()
        .create(
            user_id,
            NewCustomer {
                name: "Amna Osman".to_string(),
                phone: "+249 912 345 678".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

async fn product(db: &Database, user_id: &str, quantity: i64, usd: Money, sdg: Money) -> Product {
    db.products()
        .create(
            user_id,
            NewProduct {
                name: "Rice 50kg".to_string(),
                description: None,
                quantity,
                price_sdg: sdg,
                price_usd: usd,
                purchase_date: None,
                exchange_rate: FxRate::from_units(550).unwrap(),
            },
        )
        .await
        .unwrap()
}

async fn remaining(db: &Database, id: &str) -> i64 {
    db.products().get(USER, id).await.unwrap().unwrap().remaining
}

fn rate(units: i64) -> FxRate {
    FxRate::from_units(units).unwrap()
}

fn invoice_request(customer_id: &str, lines: Vec<InvoiceLineRequest>) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        customer_id: customer_id.to_string(),
        items: lines,
        ..Default::default()
    }
}

// =============================================================================
// Invoice Creation
// =============================================================================

#[tokio::test]
async fn create_invoice_computes_totals_and_reserves_stock() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]),
        )
        .await
        .unwrap();

    let invoice = &created.invoice;
    assert_eq!(invoice.total_usd, Money::from_units(30));
    assert_eq!(invoice.total_original_sdg, Money::from_units(16500));
    assert_eq!(invoice.total_current_sdg, Money::from_units(18000));
    assert_eq!(invoice.profit_loss, Money::from_units(1500));

    let item = &created.items[0];
    assert_eq!(item.quantity, 3);
    assert_eq!(item.price_usd, Money::from_units(10));
    assert_eq!(item.original_price_sdg, Money::from_units(5500));
    assert_eq!(item.current_price_sdg, Money::from_units(6000));
    assert_eq!(item.exchange_rate_at_purchase, rate(550));
    assert_eq!(item.current_exchange_rate, rate(600));

    assert_eq!(remaining(&db, &p.id).await, 2);
}

#[tokio::test]
async fn refetched_invoice_keeps_creation_totals() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let a = product(&db, USER, 10, Money::from_cents(333), Money::from_cents(183_150)).await;
    let b = product(&db, USER, 10, Money::from_units(10), Money::from_units(5500)).await;
    let odd_rate = FxRate::new(dec!(601.125)).unwrap();

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(
                &customer_id,
                vec![
                    InvoiceLineRequest::new(&a.id, 3, odd_rate),
                    InvoiceLineRequest::new(&b.id, 2, odd_rate),
                ],
            ),
        )
        .await
        .unwrap();

    // 3.33 × 601.125 × 3 = 6005.23875, rounded once
    assert_eq!(created.items[0].total_current_sdg, Money::new(dec!(6005.24)));

    let line_sum = Money::checked_sum(created.items.iter().map(|i| i.total_current_sdg)).unwrap();
    assert_eq!(created.invoice.total_current_sdg, line_sum);

    // Stock moves after creation must not leak into stored totals
    db.ledger()
        .withdraw_product(
            USER,
            &a.id,
            WithdrawRequest {
                quantity: 1,
                current_exchange_rate: Some(rate(700)),
            },
        )
        .await
        .unwrap();

    let fetched = db
        .invoices()
        .get(USER, &created.invoice.id)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fetched.invoice.total_usd, created.invoice.total_usd);
    assert_eq!(fetched.invoice.total_original_sdg, created.invoice.total_original_sdg);
    assert_eq!(fetched.invoice.total_current_sdg, created.invoice.total_current_sdg);
    assert_eq!(fetched.invoice.profit_loss, created.invoice.profit_loss);
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.items[0].product_id, a.id);
    assert_eq!(fetched.items[0].total_current_sdg, created.items[0].total_current_sdg);
    assert_eq!(fetched.items[1].total_current_sdg, created.items[1].total_current_sdg);
}

#[tokio::test]
async fn insufficient_stock_persists_nothing() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 2, Money::from_units(10), Money::from_units(5500)).await;

    let err = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 5, rate(600))]),
        )
        .await
        .unwrap_err();

    match &err {
        LedgerError::InsufficientStock {
            requested,
            available,
            product_id,
            ..
        } => {
            assert_eq!(*requested, 5);
            assert_eq!(*available, 2);
            assert_eq!(product_id, &p.id);
        }
        other => panic!("expected InsufficientStock, got {:?}", other),
    }
    assert_eq!(err.status_code(), 400);

    assert_eq!(remaining(&db, &p.id).await, 2);
    assert!(db.invoices().list(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn foreign_records_are_not_found() {
    let db = memory_db().await;
    let own_customer = customer(&db, USER).await;
    let foreign_customer = customer(&db, OTHER_USER).await;
    let own = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;
    let foreign = product(&db, OTHER_USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let err = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&foreign_customer, vec![InvoiceLineRequest::new(&own.id, 1, rate(600))]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { ref entity, .. } if entity == "Customer"));

    // First line reserves, second line is foreign: the first must be undone
    let err = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(
                &own_customer,
                vec![
                    InvoiceLineRequest::new(&own.id, 2, rate(600)),
                    InvoiceLineRequest::new(&foreign.id, 1, rate(600)),
                ],
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { ref entity, .. } if entity == "Product"));
    assert_eq!(err.status_code(), 404);
    assert_eq!(remaining(&db, &own.id).await, 5);

    let err = db
        .ledger()
        .withdraw_product(
            USER,
            &foreign.id,
            WithdrawRequest {
                quantity: 1,
                current_exchange_rate: Some(rate(600)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let cases = vec![
        invoice_request("", vec![InvoiceLineRequest::new(&p.id, 1, rate(600))]),
        invoice_request(&customer_id, vec![]),
        invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 0, rate(600))]),
        invoice_request(
            &customer_id,
            vec![InvoiceLineRequest {
                product_id: p.id.clone(),
                quantity: 1,
                current_exchange_rate: None,
            }],
        ),
    ];

    for request in cases {
        let err = db.ledger().create_invoice(USER, request).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)), "got {:?}", err);
    }

    assert_eq!(remaining(&db, &p.id).await, 5);
}

// =============================================================================
// Invoice Deletion
// =============================================================================

#[tokio::test]
async fn delete_invoice_returns_stock() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]),
        )
        .await
        .unwrap();
    assert_eq!(remaining(&db, &p.id).await, 2);

    let err = db
        .ledger()
        .delete_invoice(OTHER_USER, &created.invoice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { .. }));
    assert_eq!(remaining(&db, &p.id).await, 2);

    db.ledger().delete_invoice(USER, &created.invoice.id).await.unwrap();
    assert_eq!(remaining(&db, &p.id).await, 5);
    assert_eq!(db.invoices().count(USER).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_after_quantity_cut_clamps_release() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]),
        )
        .await
        .unwrap();

    // quantity 5 → 2 with remaining 2 leaves remaining 0
    let cut = db
        .products()
        .update(
            USER,
            &p.id,
            ProductUpdate {
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cut.remaining, 0);

    db.ledger().delete_invoice(USER, &created.invoice.id).await.unwrap();

    let after = db.products().get(USER, &p.id).await.unwrap().unwrap();
    // 3 released, only 2 fit under the lifetime quantity
    assert_eq!(after.remaining, 2);
    assert_eq!(after.quantity, 2);
}

#[tokio::test]
async fn zero_quantity_update_cannot_swallow_released_stock() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]),
        )
        .await
        .unwrap();

    let err = db
        .products()
        .update(
            USER,
            &p.id,
            ProductUpdate {
                quantity: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));

    db.ledger().delete_invoice(USER, &created.invoice.id).await.unwrap();

    let after = db.products().get(USER, &p.id).await.unwrap().unwrap();
    assert_eq!(after.quantity, 5);
    assert_eq!(after.remaining, 5);
}

#[tokio::test]
async fn failed_delete_keeps_items_and_stock() {
    let db = memory_db().await;
    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 5, Money::from_units(10), Money::from_units(5500)).await;

    let created = db
        .ledger()
        .create_invoice(
            USER,
            invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]),
        )
        .await
        .unwrap();

    // Fails the last step, after stock has been released and items removed
    sqlx::query(
        "CREATE TRIGGER block_invoice_delete BEFORE DELETE ON invoices \
         BEGIN SELECT RAISE(ABORT, 'blocked'); END",
    )
    .execute(db.pool())
    .await
    .unwrap();

    let err = db
        .ledger()
        .delete_invoice(USER, &created.invoice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Internal(_)));

    assert_eq!(remaining(&db, &p.id).await, 2);
    let kept = db.invoices().get(USER, &created.invoice.id).await.unwrap().unwrap();
    assert_eq!(kept.items.len(), 1);
    assert_eq!(kept.invoice.total_usd, Money::from_units(30));
}

// =============================================================================
// Withdrawal
// =============================================================================

#[tokio::test]
async fn withdraw_prices_and_decrements() {
    let db = memory_db().await;
    let p = product(&db, USER, 10, Money::from_units(10), Money::from_units(6000)).await;

    let result = db
        .ledger()
        .withdraw_product(
            USER,
            &p.id,
            WithdrawRequest {
                quantity: 4,
                current_exchange_rate: Some(rate(650)),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.withdrawn_quantity, 4);
    assert_eq!(result.total_usd, Money::from_units(40));
    assert_eq!(result.original_price_sdg, Money::from_units(6000));
    assert_eq!(result.current_price_sdg, Money::from_units(6500));
    assert_eq!(result.original_total_sdg, Money::from_units(24000));
    assert_eq!(result.current_total_sdg, Money::from_units(26000));
    assert_eq!(result.price_difference, Money::from_units(2000));
    assert_eq!(result.exchange_rate_at_purchase, rate(550));
    assert_eq!(result.current_exchange_rate, rate(650));
    assert_eq!(result.product.remaining, 6);
    assert_eq!(remaining(&db, &p.id).await, 6);
}

#[tokio::test]
async fn remaining_never_goes_negative() {
    let db = memory_db().await;
    let p = product(&db, USER, 7, Money::from_units(1), Money::from_units(550)).await;

    for quantity in [3, 3, 3, 1, 2, 1] {
        let outcome = db
            .ledger()
            .withdraw_product(
                USER,
                &p.id,
                WithdrawRequest {
                    quantity,
                    current_exchange_rate: Some(rate(600)),
                },
            )
            .await;

        if let Err(err) = outcome {
            assert!(matches!(err, LedgerError::InsufficientStock { .. }));
        }
        assert!(remaining(&db, &p.id).await >= 0);
    }

    // 3 + 3 succeed, 3 fails, 1 succeeds, 2 fails, 1 fails
    assert_eq!(remaining(&db, &p.id).await, 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invoices_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("ledger.db"))
        .max_connections(4)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();

    let customer_id = customer(&db, USER).await;
    let p = product(&db, USER, 4, Money::from_units(10), Money::from_units(5500)).await;

    let mut handles = Vec::new();
    for _ in 0..2 {
        let ledger = db.ledger();
        let request = invoice_request(&customer_id, vec![InvoiceLineRequest::new(&p.id, 3, rate(600))]);
        handles.push(tokio::spawn(async move {
            ledger.create_invoice(USER, request).await
        }));
    }

    let mut succeeded = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(LedgerError::InsufficientStock {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 3);
                assert_eq!(available, 1);
                short += 1;
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(short, 1);
    assert_eq!(remaining(&db, &p.id).await, 1);
    assert_eq!(db.invoices().count(USER).await.unwrap(), 1);

    db.close().await;
}
