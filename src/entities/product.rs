use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog product. `images` and `flavors` are JSON arrays of strings,
/// `attributes` is a JSON string-to-string map.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub stock: i32,
    pub min_stock: i32,
    #[sea_orm(unique, nullable)]
    pub barcode: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[sea_orm(column_type = "Json")]
    pub images: Json,
    #[sea_orm(column_type = "Json")]
    pub flavors: Json,
    #[sea_orm(column_type = "Json")]
    pub attributes: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
    #[sea_orm(has_many = "super::inventory_transaction::Entity")]
    InventoryTransactions,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();
        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);
        Ok(active_model)
    }
}

/// Product category enumeration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    Default, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProductCategory {
    #[sea_orm(string_value = "Essências")]
    #[serde(rename = "Essências")]
    Essencias,
    #[sea_orm(string_value = "Tabaco")]
    Tabaco,
    #[sea_orm(string_value = "Acessórios")]
    #[serde(rename = "Acessórios")]
    Acessorios,
    #[sea_orm(string_value = "Narguilés")]
    #[serde(rename = "Narguilés")]
    Narguiles,
    #[sea_orm(string_value = "Carvão")]
    #[serde(rename = "Carvão")]
    Carvao,
    #[sea_orm(string_value = "Bebidas")]
    Bebidas,
    #[sea_orm(string_value = "Pod")]
    #[serde(alias = "pod")]
    Pod,
    #[default]
    #[sea_orm(string_value = "Outros")]
    Outros,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Essencias => "Essências",
            ProductCategory::Tabaco => "Tabaco",
            ProductCategory::Acessorios => "Acessórios",
            ProductCategory::Narguiles => "Narguilés",
            ProductCategory::Carvao => "Carvão",
            ProductCategory::Bebidas => "Bebidas",
            ProductCategory::Pod => "Pod",
            ProductCategory::Outros => "Outros",
        }
    }
}

impl Model {
    /// Gross margin percentage over the sale price.
    pub fn profit_margin(&self) -> Decimal {
        if self.price.is_zero() {
            return Decimal::ZERO;
        }
        if self.cost_price.is_zero() {
            return Decimal::ONE_HUNDRED;
        }
        ((self.price - self.cost_price) / self.price * Decimal::ONE_HUNDRED).round_dp(2)
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    pub fn image_list(&self) -> Vec<String> {
        serde_json::from_value(self.images.clone()).unwrap_or_default()
    }

    pub fn flavor_list(&self) -> Vec<String> {
        serde_json::from_value(self.flavors.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(price: Decimal, cost: Decimal, stock: i32, min_stock: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Essência Zomo Mint".to_string(),
            description: None,
            category: ProductCategory::Essencias,
            price,
            cost_price: cost,
            stock,
            min_stock,
            barcode: None,
            supplier_id: None,
            expiry_date: None,
            is_active: true,
            images: serde_json::json!([]),
            flavors: serde_json::json!([]),
            attributes: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn profit_margin_is_relative_to_sale_price() {
        let p = sample(dec!(20.00), dec!(15.00), 10, 5);
        assert_eq!(p.profit_margin(), dec!(25.00));
    }

    #[test]
    fn zero_cost_price_means_full_margin() {
        let p = sample(dec!(20.00), dec!(0), 10, 5);
        assert_eq!(p.profit_margin(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn low_stock_uses_inclusive_threshold() {
        assert!(sample(dec!(1), dec!(1), 5, 5).is_low_stock());
        assert!(!sample(dec!(1), dec!(1), 6, 5).is_low_stock());
    }
}
