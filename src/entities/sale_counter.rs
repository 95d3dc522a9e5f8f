use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-row counter backing sequential sale numbers. The row is read
/// and bumped inside the sale creation transaction; the unique index on
/// `sales.sale_number` backstops any concurrent writer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_counters")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub current_value: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Primary key of the only counter row.
pub const COUNTER_ROW_ID: i32 = 1;
