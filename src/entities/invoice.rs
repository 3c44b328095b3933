//! Invoice entity - Represents one committed sale transaction.
//!
//! An invoice owns the sale lines written in the same commit and stores the
//! cart-wide aggregates: `total_amount` is the sum of its lines' `total_price`
//! and `purchase_total` the sum of their `purchase_price`. Invoices are
//! written once and never mutated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    /// Unique identifier for the invoice
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sum of `total_price` over this invoice's sale lines
    pub total_amount: Decimal,
    /// Sum of `purchase_price` over this invoice's sale lines
    pub purchase_total: Decimal,
    /// When the sale was committed, immutable
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One invoice owns many sale lines
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
