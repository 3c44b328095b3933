//! Sale transaction engine - commits whole carts atomically.
//!
//! This module turns a cart of (product, quantity) lines into one invoice plus
//! its sale lines while decrementing inventory, all inside a single database
//! transaction. Validation happens before the transaction opens, the stock
//! check covers the whole cart at once, and every write either lands together
//! or not at all. Line amounts are snapshots of the product prices at commit
//! time, so later product edits never rewrite history.

use crate::{
    entities::{Product, invoice, product, sale},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::{info, warn};

/// Fallback wall-clock bound for a single commit, used when
/// `SALE_COMMIT_TIMEOUT_SECS` is unset or invalid.
pub const DEFAULT_COMMIT_TIMEOUT: Duration = Duration::from_secs(5);

/// One line of a sale cart: a product and how many units to sell.
///
/// The same product may appear on several lines; stock is checked and
/// decremented against the summed quantity, while each line still becomes its
/// own sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    /// Product to sell
    pub product_id: i64,
    /// Number of units, must be positive
    pub quantity: i64,
}

/// Commits a cart as one atomic sale, bounded by the configured timeout.
///
/// The bound is read from `SALE_COMMIT_TIMEOUT_SECS` through
/// [`crate::config::sale_commit_timeout`], falling back to
/// [`DEFAULT_COMMIT_TIMEOUT`]. See [`commit_sale_with_timeout`] for the full
/// semantics.
///
/// # Errors
/// Returns every error [`commit_sale_with_timeout`] can return.
pub async fn commit_sale(db: &DatabaseConnection, lines: &[CartLine]) -> Result<invoice::Model> {
    commit_sale_with_timeout(db, lines, crate::config::sale_commit_timeout()).await
}

/// Commits a cart as one atomic sale, bounded by the given timeout.
///
/// The commit validates the cart, then runs a single database transaction
/// that reads every referenced product once, checks the whole cart against
/// available stock, inserts the invoice and one sale line per cart line with
/// prices snapshotted from that read, and decrements each product's stock
/// through a guarded update. Any failure rolls the whole transaction back;
/// the ledger and the inventory are never left partially updated.
///
/// On success the new invoice is returned with its aggregates:
/// `total_amount` summing the lines' sale totals and `purchase_total`
/// summing their cost totals.
///
/// # Errors
/// Returns an error if:
/// - The cart is empty or a line quantity is not positive
/// - A summed quantity or amount exceeds the representable range
/// - A referenced product does not exist or is deleted
/// - The summed cart quantity for a product exceeds its stock
/// - A concurrent commit consumed the stock mid-transaction ([`Error::StockConflict`], retryable)
/// - The commit exceeded the timeout ([`Error::TransactionTimeout`], retryable)
/// - A database operation fails
pub async fn commit_sale_with_timeout(
    db: &DatabaseConnection,
    lines: &[CartLine],
    timeout: Duration,
) -> Result<invoice::Model> {
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    for line in lines {
        if line.quantity <= 0 {
            return Err(Error::InvalidQuantity {
                quantity: line.quantity,
            });
        }
    }

    // Duplicate lines for the same product are checked and decremented as one
    // summed quantity
    let mut requested: BTreeMap<i64, i64> = BTreeMap::new();
    for line in lines {
        let entry = requested.entry(line.product_id).or_insert(0);
        *entry = entry
            .checked_add(line.quantity)
            .ok_or_else(|| Error::InvalidInput {
                message: format!(
                    "Summed quantity for product {} exceeds the representable range",
                    line.product_id
                ),
            })?;
    }

    match tokio::time::timeout(timeout, commit_cart(db, lines, &requested)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                "Sale commit exceeded {}s and was rolled back",
                timeout.as_secs()
            );
            Err(Error::TransactionTimeout {
                seconds: timeout.as_secs(),
            })
        }
    }
}

/// Sells a quantity of a single product as a one-line cart.
///
/// Quick sales go through the same engine as full carts, so every sale record
/// belongs to an invoice no matter how it was made.
///
/// # Errors
/// Returns every error [`commit_sale`] can return.
pub async fn sell_product(
    db: &DatabaseConnection,
    product_id: i64,
    quantity: i64,
) -> Result<invoice::Model> {
    commit_sale(
        db,
        &[CartLine {
            product_id,
            quantity,
        }],
    )
    .await
}

/// Error for a cart whose amounts do not fit the `Decimal` range.
fn amount_overflow(product: &str) -> Error {
    Error::InvalidInput {
        message: format!("Sale amounts for {product} exceed the representable range"),
    }
}

/// The transactional part of a commit; assumes the cart already passed input
/// validation. Dropping the transaction on any error path rolls it back.
async fn commit_cart(
    db: &DatabaseConnection,
    lines: &[CartLine],
    requested: &BTreeMap<i64, i64>,
) -> Result<invoice::Model> {
    let txn = db.begin().await?;

    // One consistent read of every product in the cart
    let ids: Vec<i64> = requested.keys().copied().collect();
    let products: HashMap<i64, product::Model> = Product::find()
        .filter(product::Column::Id.is_in(ids))
        .filter(product::Column::IsDeleted.eq(false))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| (item.id, item))
        .collect();

    // Whole-cart stock check before any write, against summed quantities
    for (&product_id, &quantity) in requested {
        let item = products
            .get(&product_id)
            .ok_or_else(|| Error::ProductNotFound {
                product: product_id.to_string(),
            })?;

        if item.quantity < quantity {
            return Err(Error::InsufficientStock {
                product: item.name.clone(),
                requested: quantity,
                available: item.quantity,
            });
        }
    }

    // Per-line amounts from the snapshot read above, plus the invoice aggregates
    let mut total_amount = Decimal::ZERO;
    let mut purchase_total = Decimal::ZERO;
    let mut line_amounts: Vec<(i64, i64, Decimal, Decimal)> = Vec::with_capacity(lines.len());
    for line in lines {
        let item = products
            .get(&line.product_id)
            .ok_or_else(|| Error::ProductNotFound {
                product: line.product_id.to_string(),
            })?;

        let units = Decimal::from(line.quantity);
        let line_total = units
            .checked_mul(item.sale_price)
            .ok_or_else(|| amount_overflow(&item.name))?;
        let line_cost = units
            .checked_mul(item.cost_price)
            .ok_or_else(|| amount_overflow(&item.name))?;
        total_amount = total_amount
            .checked_add(line_total)
            .ok_or_else(|| amount_overflow(&item.name))?;
        purchase_total = purchase_total
            .checked_add(line_cost)
            .ok_or_else(|| amount_overflow(&item.name))?;
        line_amounts.push((line.product_id, line.quantity, line_total, line_cost));
    }

    let now = chrono::Utc::now();
    let invoice_row = invoice::ActiveModel {
        total_amount: Set(total_amount),
        purchase_total: Set(purchase_total),
        created_at: Set(now),
        ..Default::default()
    };
    let invoice_row = invoice_row.insert(&txn).await?;

    for (product_id, quantity, line_total, line_cost) in line_amounts {
        let sale_row = sale::ActiveModel {
            invoice_id: Set(invoice_row.id),
            product_id: Set(product_id),
            quantity: Set(quantity),
            total_price: Set(line_total),
            purchase_price: Set(line_cost),
            created_at: Set(now),
            ..Default::default()
        };
        sale_row.insert(&txn).await?;
    }

    // One guarded decrement per product for the summed quantity; zero affected
    // rows means a concurrent commit invalidated the check above
    for (&product_id, &quantity) in requested {
        crate::core::product::decrement_stock(&txn, product_id, quantity).await?;
    }

    txn.commit().await?;

    info!(
        "Committed invoice {} with {} lines, total {}",
        invoice_row.id,
        lines.len(),
        invoice_row.total_amount
    );

    Ok(invoice_row)
}
