//! Sale entity - Represents one line of a committed sale.
//!
//! Each sale belongs to exactly one invoice and references one product.
//! `total_price` and `purchase_price` are snapshots taken from the product at
//! commit time; later product edits never change them. Sale rows are created
//! only inside a successful commit and never mutated afterwards.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the invoice this line belongs to
    pub invoice_id: i64,
    /// ID of the product that was sold
    pub product_id: i64,
    /// Units sold on this line, always positive
    pub quantity: i64,
    /// `quantity` times the product's `sale_price` at commit time
    pub total_price: Decimal,
    /// `quantity` times the product's `cost_price` at commit time
    pub purchase_price: Decimal,
    /// When the sale was committed
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale line belongs to one invoice
    #[sea_orm(
        belongs_to = "super::invoice::Entity",
        from = "Column::InvoiceId",
        to = "super::invoice::Column::Id"
    )]
    Invoice,
    /// Each sale line references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoice.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
