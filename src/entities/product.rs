//! Product entity - Represents a stocked item available for sale.
//!
//! Each product carries a unique business `code`, its current stock `quantity`,
//! and a pair of prices: `sale_price` (what the customer pays per unit) and
//! `cost_price` (what a unit cost to acquire). Sale records snapshot these
//! prices at commit time, so editing a product never rewrites history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique business code (e.g., barcode or SKU), reserved even after deletion
    #[sea_orm(unique)]
    pub code: String,
    /// Human-readable name of the product
    pub name: String,
    /// Units currently in stock, never negative
    pub quantity: i64,
    /// Price a customer pays per unit
    pub sale_price: Decimal,
    /// Price paid to acquire one unit, always below `sale_price`
    pub cost_price: Decimal,
    /// Date after which the product should no longer be sold
    pub expiration_date: Date,
    /// Optional reference to a stored product image, managed externally
    pub image_url: Option<String>,
    /// Soft delete flag - if true, product is hidden but sale history keeps resolving
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears in many sale lines
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
