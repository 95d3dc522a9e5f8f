use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed (or cancelled) sale. Line items live in `sale_items`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Sequential human-readable identifier, e.g. `VENDA-000042`.
    #[sea_orm(unique)]
    pub sale_number: String,
    pub client_id: Option<Uuid>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub profit: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SellerId",
        to = "super::user::Column::Id"
    )]
    Seller,
    #[sea_orm(has_many = "super::sale_item::Entity")]
    SaleItems,
}

impl Related<super::sale_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleItems.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
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

/// Accepted payment methods. Stored with the canonical accented labels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    Default, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentMethod {
    #[default]
    #[sea_orm(string_value = "Dinheiro")]
    Dinheiro,
    #[sea_orm(string_value = "Cartão de crédito")]
    #[serde(rename = "Cartão de crédito")]
    CartaoCredito,
    #[sea_orm(string_value = "Cartão de débito")]
    #[serde(rename = "Cartão de débito")]
    CartaoDebito,
    #[sea_orm(string_value = "Pix")]
    Pix,
    #[sea_orm(string_value = "Transferência")]
    #[serde(rename = "Transferência")]
    Transferencia,
    #[sea_orm(string_value = "Outro")]
    Outro,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "Dinheiro",
            PaymentMethod::CartaoCredito => "Cartão de crédito",
            PaymentMethod::CartaoDebito => "Cartão de débito",
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Transferencia => "Transferência",
            PaymentMethod::Outro => "Outro",
        }
    }

    /// Normalize free-form client input. Matching is case-insensitive and
    /// tolerates missing accents; anything unrecognized falls back to
    /// `Dinheiro`.
    pub fn normalize(input: &str) -> Self {
        let folded: String = input
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'à' | 'â' | 'ã' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                other => other,
            })
            .collect();
        match folded.as_str() {
            "dinheiro" => PaymentMethod::Dinheiro,
            "cartao de credito" | "credito" | "cartao credito" => PaymentMethod::CartaoCredito,
            "cartao de debito" | "debito" | "cartao debito" => PaymentMethod::CartaoDebito,
            "pix" => PaymentMethod::Pix,
            "transferencia" => PaymentMethod::Transferencia,
            "outro" => PaymentMethod::Outro,
            _ => PaymentMethod::Dinheiro,
        }
    }
}

/// Payment settlement status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
    Default, utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pendente")]
    Pendente,
    #[default]
    #[sea_orm(string_value = "Pago")]
    Pago,
    #[sea_orm(string_value = "Parcial")]
    Parcial,
    #[sea_orm(string_value = "Cancelado")]
    Cancelado,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pendente => "Pendente",
            PaymentStatus::Pago => "Pago",
            PaymentStatus::Parcial => "Parcial",
            PaymentStatus::Cancelado => "Cancelado",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "Pendente" => Some(PaymentStatus::Pendente),
            "Pago" => Some(PaymentStatus::Pago),
            "Parcial" => Some(PaymentStatus::Parcial),
            "Cancelado" => Some(PaymentStatus::Cancelado),
            _ => None,
        }
    }
}

/// Formats the sequential counter value as a sale number.
pub fn format_sale_number(seq: i64) -> String {
    format!("VENDA-{:06}", seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_method_normalization_is_accent_and_case_insensitive() {
        assert_eq!(PaymentMethod::normalize("PIX"), PaymentMethod::Pix);
        assert_eq!(
            PaymentMethod::normalize("cartao de credito"),
            PaymentMethod::CartaoCredito
        );
        assert_eq!(
            PaymentMethod::normalize("Cartão de Débito"),
            PaymentMethod::CartaoDebito
        );
        assert_eq!(
            PaymentMethod::normalize("TRANSFERÊNCIA"),
            PaymentMethod::Transferencia
        );
    }

    #[test]
    fn unknown_payment_method_falls_back_to_cash() {
        assert_eq!(PaymentMethod::normalize("bogus"), PaymentMethod::Dinheiro);
        assert_eq!(PaymentMethod::normalize(""), PaymentMethod::Dinheiro);
    }

    #[test]
    fn sale_numbers_are_zero_padded_to_six_digits() {
        assert_eq!(format_sale_number(1), "VENDA-000001");
        assert_eq!(format_sale_number(42), "VENDA-000042");
        assert_eq!(format_sale_number(1_234_567), "VENDA-1234567");
    }
}
