//! # Customer Repository
//!
//! Customers an invoice can be billed to. Scoped by owner like everything
//! else; an invoice can only reference a customer of the same user.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{generate_id, CUSTOMER_COLUMNS};
use crate::error::DbResult;
use nile_core::validation::validate_new_customer;
use nile_core::{Customer, NewCustomer};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer. Name and phone are required.
    pub async fn create(&self, user_id: &str, new: NewCustomer) -> DbResult<Customer> {
        validate_new_customer(&new)?;

        let now = Utc::now();
        let customer = Customer {
            id: generate_id(),
            user_id: user_id.to_string(),
            name: new.name.trim().to_string(),
            phone: new.phone.trim().to_string(),
            email: new.email,
            address: new.address,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, user_id, name, phone, email, address, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.user_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1 AND user_id = ?2");

        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Lists the user's customers by name.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE user_id = ?1 ORDER BY name");

        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }
}
