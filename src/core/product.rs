//! Product business logic - Handles all inventory-related operations.
//!
//! This module is the source of truth for current stock and pricing. It provides
//! functions for creating, retrieving, searching, updating, and soft deleting
//! products, plus the guarded stock decrement every sale commit goes through.
//! All functions are async and return Result types for proper error handling
//! throughout the system.

use crate::{
    entities::{Product, product},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Unique business code, trimmed before storage
    pub code: String,
    /// Human-readable name, trimmed before storage
    pub name: String,
    /// Starting stock level, never negative
    pub quantity: i64,
    /// Price a customer pays per unit
    pub sale_price: Decimal,
    /// Price paid to acquire one unit, must stay below `sale_price`
    pub cost_price: Decimal,
    /// Date after which the product should no longer be sold
    pub expiration_date: NaiveDate,
    /// Optional reference to a stored product image
    pub image_url: Option<String>,
}

/// Partial update for an existing product; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New business code
    pub code: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New stock level, never negative
    pub quantity: Option<i64>,
    /// New sale price
    pub sale_price: Option<Decimal>,
    /// New cost price
    pub cost_price: Option<Decimal>,
    /// New expiration date
    pub expiration_date: Option<NaiveDate>,
    /// New image reference
    pub image_url: Option<String>,
}

/// Rejects price pairs that would make every sale lose money.
fn validate_prices(sale_price: Decimal, cost_price: Decimal) -> Result<()> {
    if cost_price < Decimal::ZERO {
        return Err(Error::InvalidPrice { price: cost_price });
    }

    if sale_price <= cost_price {
        return Err(Error::UnprofitablePrice {
            sale_price,
            cost_price,
        });
    }

    Ok(())
}

/// Retrieves a specific active product by its unique ID.
///
/// Deleted products are not returned; sale history resolves them separately.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a specific active product by its business code.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Code.eq(code))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns true when any product row, active or deleted, holds the code.
///
/// Codes stay reserved after soft deletion because sale history references
/// the deleted rows.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn product_code_exists(db: &DatabaseConnection, code: &str) -> Result<bool> {
    Product::find()
        .filter(product::Column::Code.eq(code))
        .one(db)
        .await
        .map(|found| found.is_some())
        .map_err(Into::into)
}

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn list_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds active products whose code or name contains the given fragment.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn search_products(
    db: &DatabaseConnection,
    query: &str,
) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .filter(
            product::Column::Code
                .contains(query)
                .or(product::Column::Name.contains(query)),
        )
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the most recently created active products, newest first.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn latest_products(db: &DatabaseConnection, limit: u64) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_desc(product::Column::CreatedAt)
        // Id breaks creation-time ties deterministically
        .order_by_desc(product::Column::Id)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product with the specified parameters, performing input validation.
///
/// This function trims the code and name, validates that neither is empty, that
/// the starting quantity is non-negative, and that the sale price exceeds the
/// cost price. The code must be unique across all products, deleted ones
/// included, because sale history keeps referencing deleted rows.
///
/// # Errors
/// Returns an error if:
/// - The code or name is empty or whitespace-only
/// - The starting quantity is negative
/// - The cost price is negative, or the sale price does not exceed it
/// - Another product already holds the code
/// - The database insert operation fails
pub async fn create_product(
    db: &DatabaseConnection,
    new_product: NewProduct,
) -> Result<product::Model> {
    // Validate inputs
    let code = new_product.code.trim();
    if code.is_empty() {
        return Err(Error::InvalidInput {
            message: "Product code cannot be empty".to_string(),
        });
    }

    let name = new_product.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput {
            message: "Product name cannot be empty".to_string(),
        });
    }

    if new_product.quantity < 0 {
        return Err(Error::InvalidQuantity {
            quantity: new_product.quantity,
        });
    }

    validate_prices(new_product.sale_price, new_product.cost_price)?;

    if product_code_exists(db, code).await? {
        return Err(Error::DuplicateCode {
            code: code.to_string(),
        });
    }

    let now = chrono::Utc::now();

    let product = product::ActiveModel {
        code: Set(code.to_string()),
        name: Set(name.to_string()),
        quantity: Set(new_product.quantity),
        sale_price: Set(new_product.sale_price),
        cost_price: Set(new_product.cost_price),
        expiration_date: Set(new_product.expiration_date),
        image_url: Set(new_product.image_url),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Applies a partial update to an existing product, performing input validation.
///
/// The resulting price pair is re-validated even when only one side changes, so
/// an edit can never leave a product selling below cost. Historical sale
/// records are never touched; they keep the prices snapshotted at commit time.
///
/// # Errors
/// Returns an error if:
/// - A provided code or name is empty or whitespace-only
/// - A provided quantity is negative
/// - The resulting price pair is invalid
/// - A provided code is already held by another product
/// - The product does not exist or is already deleted
/// - The database update operation fails
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    // Validate inputs that need no database access first
    if let Some(code) = &update.code {
        if code.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Product code cannot be empty".to_string(),
            });
        }
    }

    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput {
                message: "Product name cannot be empty".to_string(),
            });
        }
    }

    if let Some(quantity) = update.quantity {
        if quantity < 0 {
            return Err(Error::InvalidQuantity { quantity });
        }
    }

    let product = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            product: product_id.to_string(),
        })?;

    if product.is_deleted {
        return Err(Error::ProductNotFound {
            product: product_id.to_string(),
        });
    }

    // The resulting price pair must stay profitable even when only one side changes
    let sale_price = update.sale_price.unwrap_or(product.sale_price);
    let cost_price = update.cost_price.unwrap_or(product.cost_price);
    validate_prices(sale_price, cost_price)?;

    if let Some(code) = &update.code {
        let code = code.trim();
        if code != product.code && product_code_exists(db, code).await? {
            return Err(Error::DuplicateCode {
                code: code.to_string(),
            });
        }
    }

    let mut product: product::ActiveModel = product.into();
    if let Some(code) = update.code {
        product.code = Set(code.trim().to_string());
    }
    if let Some(name) = update.name {
        product.name = Set(name.trim().to_string());
    }
    if let Some(quantity) = update.quantity {
        product.quantity = Set(quantity);
    }
    if let Some(price) = update.sale_price {
        product.sale_price = Set(price);
    }
    if let Some(price) = update.cost_price {
        product.cost_price = Set(price);
    }
    if let Some(date) = update.expiration_date {
        product.expiration_date = Set(date);
    }
    if let Some(url) = update.image_url {
        product.image_url = Set(Some(url));
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Soft deletes a product by marking it as deleted, preserving sale history.
///
/// The product disappears from listings, search, and sale resolution, but its
/// rows stay joinable from historical sales and its code stays reserved.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist or is already deleted
/// - The database update operation fails
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            product: product_id.to_string(),
        })?
        .into();

    if *product.is_deleted.as_ref() {
        return Err(Error::ProductNotFound {
            product: product_id.to_string(),
        });
    }

    product.is_deleted = Set(true);
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Atomically removes `amount` units of stock from a product.
///
/// This performs a single guarded SQL UPDATE:
/// `UPDATE products SET quantity = quantity - ? WHERE id = ? AND quantity >= ?`
/// so the stock check and the decrement happen as one database operation and
/// the quantity can never go negative, even under concurrent commits. Zero
/// affected rows means the stock moved (or the product vanished) after the
/// caller's check, reported as a retryable [`Error::StockConflict`].
///
/// Generic over [`ConnectionTrait`] so sale commits can run it inside their
/// own transaction.
///
/// # Errors
/// Returns an error if:
/// - `amount` is zero or negative
/// - The guard matched no row (missing, deleted, or insufficient stock)
/// - The database update operation fails
pub async fn decrement_stock<C>(db: &C, product_id: i64, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount <= 0 {
        return Err(Error::InvalidQuantity { quantity: amount });
    }

    let result = Product::update_many()
        .col_expr(
            product::Column::Quantity,
            Expr::col(product::Column::Quantity).sub(amount),
        )
        .filter(product::Column::Id.eq(product_id))
        .filter(product::Column::IsDeleted.eq(false))
        .filter(product::Column::Quantity.gte(amount))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::StockConflict {
            product: product_id.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Test empty code validation
        let result = create_product(&db, test_new_product("", "Widget")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        // Test whitespace-only code validation
        let result = create_product(&db, test_new_product("   ", "Widget")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        // Test empty name validation
        let result = create_product(&db, test_new_product("A1", "")).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        // Test negative quantity validation
        let mut input = test_new_product("A1", "Widget");
        input.quantity = -1;
        let result = create_product(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -1 }
        ));

        // Test sale price equal to cost price
        let mut input = test_new_product("A1", "Widget");
        input.sale_price = dec!(60);
        input.cost_price = dec!(60);
        let result = create_product(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UnprofitablePrice { .. }
        ));

        // Test sale price below cost price
        let mut input = test_new_product("A1", "Widget");
        input.sale_price = dec!(50);
        input.cost_price = dec!(60);
        let result = create_product(&db, input).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UnprofitablePrice { .. }
        ));

        // Test negative cost price
        let mut input = test_new_product("A1", "Widget");
        input.cost_price = dec!(-5);
        let result = create_product(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidPrice { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let mut input = test_new_product("  A1  ", "  Widget  ");
        input.image_url = Some("https://example.com/widget.png".to_string());
        let product = create_product(&db, input).await?;

        // Code and name are trimmed before storage
        assert_eq!(product.code, "A1");
        assert_eq!(product.name, "Widget");
        assert_eq!(product.quantity, 10);
        assert_eq!(product.sale_price, dec!(100));
        assert_eq!(product.cost_price, dec!(60));
        assert_eq!(
            product.image_url,
            Some("https://example.com/widget.png".to_string())
        );
        assert!(!product.is_deleted);
        assert_eq!(product.created_at, product.updated_at);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_product_duplicate_code() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_product(&db, "A1", "Widget").await?;
        let result = create_test_product(&db, "A1", "Other Widget").await;

        assert!(matches!(result.unwrap_err(), Error::DuplicateCode { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_code_stays_reserved() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_test_product(&db, "A1", "Widget").await?;
        delete_product(&db, product.id).await?;

        // The code still belongs to the deleted row
        let result = create_test_product(&db, "A1", "Replacement").await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateCode { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_excludes_deleted() -> Result<()> {
        let db = setup_test_db().await?;

        let product = create_test_product(&db, "A1", "Widget").await?;
        assert!(get_product(&db, product.id).await?.is_some());
        assert!(get_product_by_code(&db, "A1").await?.is_some());

        delete_product(&db, product.id).await?;

        assert!(get_product(&db, product.id).await?.is_none());
        assert!(get_product_by_code(&db, "A1").await?.is_none());
        // The reservation check still sees the row
        assert!(product_code_exists(&db, "A1").await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_integration() -> Result<()> {
        let db = setup_test_db().await?;

        let bolts = create_test_product(&db, "B1", "Bolts").await?;
        let anchors = create_test_product(&db, "A1", "Anchors").await?;
        let deleted = create_test_product(&db, "C1", "Clamps").await?;
        delete_product(&db, deleted.id).await?;

        // Active products only, ordered alphabetically by name
        let products = list_products(&db).await?;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, anchors.id);
        assert_eq!(products[1].id, bolts.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_search_products() -> Result<()> {
        let db = setup_test_db().await?;

        let beans = create_test_product(&db, "CF-01", "Espresso Beans").await?;
        let filters = create_test_product(&db, "CF-02", "Filter Paper").await?;
        create_test_product(&db, "TX-09", "Tea Tin").await?;

        // Match on a name fragment
        let by_name = search_products(&db, "Espresso").await?;
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, beans.id);

        // Match on a code fragment spanning both coffee products
        let by_code = search_products(&db, "CF-").await?;
        assert_eq!(by_code.len(), 2);

        // Deleted products disappear from search
        delete_product(&db, filters.id).await?;
        let after_delete = search_products(&db, "CF-").await?;
        assert_eq!(after_delete.len(), 1);

        // No match returns an empty list
        assert!(search_products(&db, "nothing").await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_latest_products() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_product(&db, "A1", "First").await?;
        let second = create_test_product(&db, "A2", "Second").await?;
        let third = create_test_product(&db, "A3", "Third").await?;

        let latest = latest_products(&db, 2).await?;
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id, third.id);
        assert_eq!(latest[1].id, second.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        // Test empty code validation
        let update = ProductUpdate {
            code: Some("  ".to_string()),
            ..Default::default()
        };
        let result = update_product(&db, 1, update).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidInput { .. }));

        // Test negative quantity validation
        let update = ProductUpdate {
            quantity: Some(-3),
            ..Default::default()
        };
        let result = update_product(&db, 1, update).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -3 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "A1", "Widget").await?;

        let update = ProductUpdate {
            name: Some("Premium Widget".to_string()),
            sale_price: Some(dec!(120)),
            cost_price: Some(dec!(70)),
            ..Default::default()
        };
        let updated = update_product(&db, product.id, update).await?;

        assert_eq!(updated.name, "Premium Widget");
        assert_eq!(updated.sale_price, dec!(120));
        assert_eq!(updated.cost_price, dec!(70));
        // Untouched fields keep their values
        assert_eq!(updated.code, "A1");
        assert_eq!(updated.quantity, 10);

        // Verify the update persisted
        let retrieved = get_product(&db, product.id).await?.unwrap();
        assert_eq!(retrieved.name, "Premium Widget");
        assert_eq!(retrieved.sale_price, dec!(120));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_rechecks_price_pair() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "A1", "Widget").await?;

        // Raising only the cost above the stored sale price must fail
        let update = ProductUpdate {
            cost_price: Some(dec!(150)),
            ..Default::default()
        };
        let result = update_product(&db, product.id, update).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UnprofitablePrice { .. }
        ));

        // The stored prices are unchanged
        let unchanged = get_product(&db, product.id).await?.unwrap();
        assert_eq!(unchanged.cost_price, dec!(60));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_duplicate_code() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_product(&db, "A1", "Widget").await?;
        let other = create_test_product(&db, "B1", "Bolts").await?;

        // Taking another product's code must fail
        let update = ProductUpdate {
            code: Some("A1".to_string()),
            ..Default::default()
        };
        let result = update_product(&db, other.id, update).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateCode { .. }));

        // Re-submitting the product's own code is not a conflict
        let update = ProductUpdate {
            code: Some("B1".to_string()),
            ..Default::default()
        };
        let unchanged = update_product(&db, other.id, update).await?;
        assert_eq!(unchanged.code, "B1");

        Ok(())
    }

    #[tokio::test]
    async fn test_update_product_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_product(&db, 999, ProductUpdate::default()).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        // Deleted products are not updatable either
        let product = create_test_product(&db, "A1", "Widget").await?;
        delete_product(&db, product.id).await?;
        let result = update_product(&db, product.id, ProductUpdate::default()).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "A1", "Widget").await?;

        let deleted = delete_product(&db, product.id).await?;
        assert!(deleted.is_deleted);
        assert_eq!(deleted.id, product.id);

        // Deleting twice reports the product as gone
        let result = delete_product(&db, product.id).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        // Deleting an unknown id reports the same
        let result = delete_product(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::ProductNotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_integration() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "A1", "Widget").await?;

        decrement_stock(&db, product.id, 3).await?;
        assert_eq!(get_product(&db, product.id).await?.unwrap().quantity, 7);

        // Asking for more than is available leaves the stock untouched
        let result = decrement_stock(&db, product.id, 8).await;
        assert!(matches!(result.unwrap_err(), Error::StockConflict { .. }));
        assert_eq!(get_product(&db, product.id).await?.unwrap().quantity, 7);

        // Draining to exactly zero is allowed
        decrement_stock(&db, product.id, 7).await?;
        assert_eq!(get_product(&db, product.id).await?.unwrap().quantity, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_rejects_non_positive_amounts() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = decrement_stock(&db, 1, 0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: 0 }
        ));

        let result = decrement_stock(&db, 1, -2).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidQuantity { quantity: -2 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_deleted_product() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "A1", "Widget").await?;
        delete_product(&db, product.id).await?;

        let result = decrement_stock(&db, product.id, 1).await;
        assert!(matches!(result.unwrap_err(), Error::StockConflict { .. }));

        Ok(())
    }
}
