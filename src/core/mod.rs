//! Core business logic - framework-agnostic inventory, sale, and reporting
//! operations.
//!
//! Everything here works against a plain database connection so it can be
//! driven by any front end and exercised directly in tests.

/// Product catalog and stock operations
pub mod product;

/// Reporting projections over the sale ledger
pub mod report;

/// The atomic sale commit engine
pub mod sale;
