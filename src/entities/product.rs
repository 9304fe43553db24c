use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product catalog entity
///
/// `sku` is the business key: imports upsert on it, and it is the
/// authoritative reference target for inventory and sales rows.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Surrogate primary key
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stock keeping unit (unique)
    #[sea_orm(unique)]
    pub sku: String,

    /// Product display name
    pub name: String,

    /// Merchandising category
    pub category: String,

    /// Unit acquisition cost
    pub cost: Decimal,

    /// Unit selling price (>= cost for valid imports)
    pub price: Decimal,

    /// Supplier name
    pub supplier: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
