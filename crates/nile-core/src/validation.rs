//! # Validation Module
//!
//! Request validation for Nile Ledger.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (external)                                        │
//! │  └── Deserialization into request types (missing fields default)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields present                                           │
//! │  └── Quantities and rates positive                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (remaining >= 0)                                            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nile_core::money::FxRate;
//! use nile_core::types::{CreateInvoiceRequest, InvoiceLineRequest};
//! use nile_core::validation::validate_create_invoice;
//!
//! let mut req = CreateInvoiceRequest::default();
//! assert!(validate_create_invoice(&req).is_err());
//!
//! req.customer_id = "c-1".to_string();
//! req.items.push(InvoiceLineRequest::new("p-1", 3, FxRate::from_units(600).unwrap()));
//! assert!(validate_create_invoice(&req).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::{FxRate, Money};
use crate::types::{CreateInvoiceRequest, NewCustomer, NewProduct, ProductUpdate, WithdrawRequest};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted product or customer name.
pub const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a required identifier.
pub fn validate_required_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a product or customer name.
///
/// ## Example
/// ```rust
/// use nile_core::validation::validate_name;
///
/// assert!(validate_name("name", "Rice 50kg").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a quantity: at least 1.
///
/// There is no upper cap; stock levels bound what can actually be taken.
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Validates a unit price: strictly positive.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::must_be_positive(field));
    }
    Ok(())
}

/// Unwraps a required exchange rate.
///
/// `FxRate` cannot hold a non-positive value, so presence is all that is
/// left to check.
pub fn require_rate(field: &str, rate: Option<FxRate>) -> ValidationResult<FxRate> {
    rate.ok_or_else(|| ValidationError::required(field))
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates an invoice creation request before any database work.
///
/// ## Rules
/// - `customerId` present
/// - at least one item
/// - each item: `productId` present, `quantity >= 1`, `currentExchangeRate` present
///
/// The first failing rule is reported, with the item index in the field name.
pub fn validate_create_invoice(req: &CreateInvoiceRequest) -> ValidationResult<()> {
    validate_required_id("customerId", &req.customer_id)?;

    if req.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    for (idx, item) in req.items.iter().enumerate() {
        validate_required_id(&format!("items[{idx}].productId"), &item.product_id)?;
        validate_quantity(&format!("items[{idx}].quantity"), item.quantity)?;
        require_rate(
            &format!("items[{idx}].currentExchangeRate"),
            item.current_exchange_rate,
        )?;
    }

    Ok(())
}

/// Validates a withdrawal request and returns the rate to price it at.
pub fn validate_withdrawal(req: &WithdrawRequest) -> ValidationResult<FxRate> {
    validate_quantity("quantity", req.quantity)?;
    require_rate("currentExchangeRate", req.current_exchange_rate)
}

/// Validates a new product.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_quantity("quantity", product.quantity)?;
    validate_price("priceSdg", product.price_sdg)?;
    validate_price("priceUsd", product.price_usd)?;
    Ok(())
}

/// Validates the fields present on a product update.
pub fn validate_product_update(update: &ProductUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_name("name", name)?;
    }
    // Zero would pin remaining at 0 and swallow stock released by later deletes.
    if let Some(qty) = update.quantity {
        validate_quantity("quantity", qty)?;
    }
    if let Some(price) = update.price_sdg {
        validate_price("priceSdg", price)?;
    }
    if let Some(price) = update.price_usd {
        validate_price("priceUsd", price)?;
    }
    Ok(())
}

/// Validates a new customer: name and phone are required.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_name("name", &customer.name)?;
    if customer.phone.trim().is_empty() {
        return Err(ValidationError::required("phone"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvoiceLineRequest;

    fn rate() -> FxRate {
        FxRate::from_units(600).unwrap()
    }

    fn valid_request() -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            customer_id: "c-1".to_string(),
            items: vec![InvoiceLineRequest::new("p-1", 3, rate())],
            ..Default::default()
        }
    }

    fn field_of(err: ValidationError) -> String {
        match err {
            ValidationError::Required { field } | ValidationError::MustBePositive { field } => field,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_invoice_request() {
        assert!(validate_create_invoice(&valid_request()).is_ok());
    }

    #[test]
    fn test_missing_customer() {
        let mut req = valid_request();
        req.customer_id = "  ".to_string();
        assert_eq!(field_of(validate_create_invoice(&req).unwrap_err()), "customerId");
    }

    #[test]
    fn test_missing_items() {
        let mut req = valid_request();
        req.items.clear();
        assert_eq!(field_of(validate_create_invoice(&req).unwrap_err()), "items");
    }

    #[test]
    fn test_item_rules_name_the_index() {
        let mut req = valid_request();
        req.items.push(InvoiceLineRequest {
            product_id: "p-2".to_string(),
            quantity: 0,
            current_exchange_rate: Some(rate()),
        });
        assert_eq!(
            field_of(validate_create_invoice(&req).unwrap_err()),
            "items[1].quantity"
        );

        req.items[1].quantity = 1;
        req.items[1].current_exchange_rate = None;
        assert_eq!(
            field_of(validate_create_invoice(&req).unwrap_err()),
            "items[1].currentExchangeRate"
        );

        req.items[1].current_exchange_rate = Some(rate());
        req.items[1].product_id.clear();
        assert_eq!(
            field_of(validate_create_invoice(&req).unwrap_err()),
            "items[1].productId"
        );
    }

    #[test]
    fn test_validate_withdrawal() {
        let ok = WithdrawRequest {
            quantity: 4,
            current_exchange_rate: Some(rate()),
        };
        assert_eq!(validate_withdrawal(&ok).unwrap(), rate());

        let no_rate = WithdrawRequest {
            quantity: 4,
            current_exchange_rate: None,
        };
        assert!(validate_withdrawal(&no_rate).is_err());

        assert!(validate_withdrawal(&WithdrawRequest::default()).is_err());
    }

    #[test]
    fn test_validate_quantity_has_no_upper_cap() {
        assert!(validate_quantity("quantity", 1).is_ok());
        assert!(validate_quantity("quantity", 1_000_000).is_ok());
        assert!(validate_quantity("quantity", 0).is_err());
        assert!(validate_quantity("quantity", -1).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            name: "Rice 50kg".to_string(),
            description: None,
            quantity: 10,
            price_sdg: Money::from_units(5500),
            price_usd: Money::from_units(10),
            purchase_date: None,
            exchange_rate: rate(),
        };
        assert!(validate_new_product(&product).is_ok());

        product.price_usd = Money::zero();
        assert!(validate_new_product(&product).is_err());

        product.price_usd = Money::from_units(10);
        product.name = String::new();
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_product_update() {
        assert!(validate_product_update(&ProductUpdate::default()).is_ok());

        let update = ProductUpdate {
            quantity: Some(-1),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_err());

        let zero = ProductUpdate {
            quantity: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            validate_product_update(&zero),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_new_customer() {
        let mut customer = NewCustomer {
            name: "Omdurman Traders".to_string(),
            phone: "+249 912 000 000".to_string(),
            ..Default::default()
        };
        assert!(validate_new_customer(&customer).is_ok());

        customer.phone.clear();
        assert!(validate_new_customer(&customer).is_err());
    }

    #[test]
    fn test_validate_name_length() {
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name("name", &"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

}
