//! Starting catalog loading from catalog.toml
//!
//! This module provides functionality to load an initial product catalog
//! from a TOML configuration file. The products defined in catalog.toml are
//! used to seed the database on first run; codes already present are skipped,
//! so seeding stays idempotent across restarts.

use crate::core::product::NewProduct;
use crate::errors::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Deserialize)]
pub struct Catalog {
    /// List of products to seed
    pub products: Vec<ProductSeed>,
}

/// Configuration for a single seeded product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductSeed {
    /// Unique business code for the product
    pub code: String,
    /// Human-readable name
    pub name: String,
    /// Starting stock level
    pub quantity: i64,
    /// Price a customer pays per unit
    pub sale_price: Decimal,
    /// Price paid to acquire one unit
    pub cost_price: Decimal,
    /// Date after which the product should no longer be sold, `YYYY-MM-DD`
    pub expiration_date: NaiveDate,
    /// Optional reference to a stored product image
    pub image_url: Option<String>,
}

/// Loads the starting catalog from a TOML file
///
/// # Arguments
/// * `path` - Path to the catalog.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog.toml: {e}"),
    })
}

/// Seeds the database with every catalog product whose code is not yet present.
///
/// Codes are matched against all rows, deleted ones included, so a product
/// that was soft deleted is not silently recreated by the next restart.
/// Returns how many products were inserted.
///
/// # Errors
/// Returns an error if a lookup fails or an inserted product is invalid.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &Catalog) -> Result<usize> {
    let mut seeded = 0;
    for seed in &catalog.products {
        if crate::core::product::product_code_exists(db, &seed.code).await? {
            debug!("Product {} already present, skipping seed", seed.code);
            continue;
        }

        crate::core::product::create_product(
            db,
            NewProduct {
                code: seed.code.clone(),
                name: seed.name.clone(),
                quantity: seed.quantity,
                sale_price: seed.sale_price,
                cost_price: seed.cost_price,
                expiration_date: seed.expiration_date,
                image_url: seed.image_url.clone(),
            },
        )
        .await?;
        seeded += 1;
    }
    Ok(seeded)
}
