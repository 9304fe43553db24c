use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One day's sales of one sku.
///
/// A unique index on (sku, sold_on) backs the insert-only, first-wins
/// duplicate policy applied at commit time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stock keeping unit (references products by value)
    pub sku: String,

    /// Calendar day of sale (no time component)
    pub sold_on: NaiveDate,

    /// Units sold that day
    pub units: i32,

    /// Selling price per unit on that day
    pub unit_price: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
