//! # Seed Data Generator
//!
//! Populates a ledger database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database from NILE_DATABASE_PATH (default ./nile.db)
//! cargo run -p nile-db --bin seed
//!
//! # Specify database path and owner
//! cargo run -p nile-db --bin seed -- --db ./data/nile.db --user demo-user
//! ```
//!
//! ## Generated Data
//! - One customer
//! - A handful of staple goods priced in USD and SDG at the stocking rate
//! - A current exchange rate
//! - One invoice drawing on the first two products

use std::env;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use nile_core::{
    CreateInvoiceRequest, FxRate, InvoiceLineRequest, Money, NewCustomer, NewProduct,
};
use nile_db::{Database, LedgerConfig};

/// Name, stock, USD price in cents.
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Rice 50kg", 40, 3_250),
    ("Sugar 10kg", 60, 1_100),
    ("Cooking Oil 5L", 30, 1_475),
    ("Wheat Flour 25kg", 25, 1_890),
    ("Lentils 5kg", 50, 720),
    ("Tea 1kg", 80, 650),
];

/// SDG per USD when the seed stock was bought.
const STOCKING_RATE: i64 = 550;

/// SDG per USD today.
const CURRENT_RATE: i64 = 600;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = LedgerConfig::load()?;
    let mut user_id = String::from("demo-user");

    // Initialize tracing
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with_target(true)
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Nile Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $NILE_DATABASE_PATH or ./nile.db)");
                println!("  -u, --user <ID>    Owner of the seeded records (default: demo-user)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(database = %config.database_path, user_id = %user_id, "Seeding ledger");

    let db = Database::new(config.db_config()).await?;

    let existing = db.products().count(&user_id).await?;
    if existing > 0 {
        warn!(existing, "User already has products, skipping seed. Delete the database file to regenerate.");
        return Ok(());
    }

    let stocking_rate = FxRate::from_units(STOCKING_RATE)?;
    let current_rate = FxRate::from_units(CURRENT_RATE)?;

    let customer = db
        .customers()
        .create(
            &user_id,
            NewCustomer {
                name: "Khartoum Wholesale Traders".to_string(),
                phone: "+249 912 000 000".to_string(),
                address: Some("Souq Arabi, Khartoum".to_string()),
                ..Default::default()
            },
        )
        .await?;

    let mut product_ids = Vec::with_capacity(PRODUCTS.len());
    for (name, quantity, usd_cents) in PRODUCTS {
        let price_usd = Money::from_cents(*usd_cents);
        let product = db
            .products()
            .create(
                &user_id,
                NewProduct {
                    name: name.to_string(),
                    description: None,
                    quantity: *quantity,
                    price_sdg: stocking_rate.usd_to_sdg(price_usd)?,
                    price_usd,
                    purchase_date: None,
                    exchange_rate: stocking_rate,
                },
            )
            .await?;
        product_ids.push(product.id);
    }
    info!(count = product_ids.len(), "Products stocked");

    db.exchange_rates().record(&user_id, current_rate, None).await?;

    let lines = product_ids
        .iter()
        .take(2)
        .map(|id| InvoiceLineRequest::new(id.as_str(), 3, current_rate))
        .collect();

    let invoice = db
        .ledger()
        .create_invoice(
            &user_id,
            CreateInvoiceRequest {
                customer_id: customer.id,
                items: lines,
                notes: Some("Seeded demo invoice".to_string()),
                ..Default::default()
            },
        )
        .await?;

    info!(
        invoice_id = %invoice.invoice.id,
        total_usd = %invoice.invoice.total_usd,
        total_current_sdg = %invoice.invoice.total_current_sdg,
        profit_loss = %invoice.invoice.profit_loss,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}
