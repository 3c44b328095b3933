//! Shared test utilities for Stockbook.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test products with sensible defaults.

use crate::{
    core::product::{self, NewProduct},
    entities,
    errors::Result,
};
use chrono::{Days, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a [`NewProduct`] with sensible defaults, without touching the database.
///
/// # Arguments
/// * `code` - Business code
/// * `name` - Product name
///
/// # Defaults
/// * `quantity`: 10
/// * `sale_price`: 100
/// * `cost_price`: 60
/// * `expiration_date`: one year from today
/// * `image_url`: None
#[must_use]
pub fn test_new_product(code: &str, name: &str) -> NewProduct {
    NewProduct {
        code: code.to_string(),
        name: name.to_string(),
        quantity: 10,
        sale_price: dec!(100),
        cost_price: dec!(60),
        expiration_date: Utc::now().date_naive() + Days::new(365),
        image_url: None,
    }
}

/// Creates a test product with sensible defaults.
///
/// # Arguments
/// * `db` - Database connection
/// * `code` - Business code
/// * `name` - Product name
pub async fn create_test_product(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, test_new_product(code, name)).await
}

/// Creates a test product with custom stock and prices.
/// Use this when a test depends on specific quantities or margins.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    quantity: i64,
    sale_price: Decimal,
    cost_price: Decimal,
) -> Result<entities::product::Model> {
    let mut input = test_new_product(code, name);
    input.quantity = quantity;
    input.sale_price = sale_price;
    input.cost_price = cost_price;
    product::create_product(db, input).await
}
