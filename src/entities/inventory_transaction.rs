use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Append-only stock ledger entry. Every stock mutation writes one row
/// recording the quantity delta and the before/after snapshots.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product_id: Uuid,
    pub kind: MovementKind,
    /// Signed delta applied to the product stock.
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub cost_price: Option<Decimal>,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
    pub reference_kind: Option<ReferenceKind>,
    pub reference_id: Option<Uuid>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}

/// Kind of stock movement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum MovementKind {
    /// Stock received (restock, return to stock on cancellation).
    #[sea_orm(string_value = "entrada")]
    #[serde(rename = "entrada")]
    Entrada,
    /// Stock removed outside a sale.
    #[sea_orm(string_value = "saida")]
    #[serde(rename = "saida")]
    Saida,
    /// Manual correction to an absolute quantity.
    #[sea_orm(string_value = "ajuste")]
    #[serde(rename = "ajuste")]
    Ajuste,
    /// Stock consumed by a sale.
    #[sea_orm(string_value = "venda")]
    #[serde(rename = "venda")]
    Venda,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "entrada",
            MovementKind::Saida => "saida",
            MovementKind::Ajuste => "ajuste",
            MovementKind::Venda => "venda",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "entrada" => Some(MovementKind::Entrada),
            "saida" => Some(MovementKind::Saida),
            "ajuste" => Some(MovementKind::Ajuste),
            "venda" => Some(MovementKind::Venda),
            _ => None,
        }
    }
}

/// What a ledger entry points back to. Paired with `reference_id`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ReferenceKind {
    #[sea_orm(string_value = "sale")]
    #[serde(rename = "sale")]
    Sale,
    #[sea_orm(string_value = "purchase")]
    #[serde(rename = "purchase")]
    Purchase,
    #[sea_orm(string_value = "adjustment")]
    #[serde(rename = "adjustment")]
    Adjustment,
}
