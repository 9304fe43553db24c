use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Current stock position for one sku.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_levels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Stock keeping unit (unique; references products by value)
    #[sea_orm(unique)]
    pub sku: String,

    /// Units currently on hand
    pub on_hand: i32,

    /// Threshold below which restocking should be triggered
    pub reorder_point: i32,

    /// Supplier lead time in days (1..=90 for valid imports)
    pub lead_time_days: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
