//! Unified error types for `Stockbook`.
//!
//! Every fallible operation in the crate returns [`Result`] with this [`Error`]
//! enum, so callers can match on typed failures instead of parsing messages.
//! Validation failures are reported before any database work happens; storage
//! failures are wrapped from `SeaORM` via the `Database` variant.

use rust_decimal::Decimal;
use thiserror::Error;

/// All failure modes surfaced by the inventory and sale operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or seed-file problem (unreadable file, bad TOML, bad env value)
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading configuration
        message: String,
    },

    /// Malformed caller input, such as a blank product code or name
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Which input was rejected and why
        message: String,
    },

    /// A quantity that must be positive (or non-negative) was not
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// A price that must be non-negative was not
    #[error("Invalid price: {price}")]
    InvalidPrice {
        /// The rejected price
        price: Decimal,
    },

    /// Sale price does not exceed cost price, so every sale would lose money
    #[error("Sale price {sale_price} must exceed cost price {cost_price}")]
    UnprofitablePrice {
        /// Proposed sale price
        sale_price: Decimal,
        /// Proposed cost price
        cost_price: Decimal,
    },

    /// Another product, active or deleted, already holds this code
    #[error("Product code already in use: {code}")]
    DuplicateCode {
        /// The conflicting code
        code: String,
    },

    /// A sale was committed with no cart lines
    #[error("Cannot commit a sale with an empty cart")]
    EmptyCart,

    /// The referenced product does not exist or has been deleted
    #[error("Product not found: {product}")]
    ProductNotFound {
        /// Product name or id that failed to resolve
        product: String,
    },

    /// The cart asks for more units than are in stock
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name or id with too little stock
        product: String,
        /// Units requested across the whole cart
        requested: i64,
        /// Units actually available
        available: i64,
    },

    /// A concurrent commit consumed the stock between check and decrement;
    /// the whole cart was rolled back and can be retried
    #[error("Stock for {product} changed during commit, retry the sale")]
    StockConflict {
        /// Product name or id whose stock moved underneath the commit
        product: String,
    },

    /// The sale commit exceeded its wall-clock bound and was rolled back;
    /// the cart can be retried
    #[error("Sale commit timed out after {seconds}s")]
    TransactionTimeout {
        /// The bound that was exceeded, in seconds
        seconds: u64,
    },

    /// Underlying storage failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
