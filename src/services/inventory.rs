//! Stock ledger primitives shared by the product and sale services.
//!
//! Every stock mutation goes through [`record_movement`] so the ledger
//! invariant holds: `new_stock - previous_stock` always equals the signed
//! delta applied to the product row, and rows are never updated after
//! insertion.

use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::entities::inventory_transaction::{self, MovementKind, ReferenceKind};
use crate::errors::ServiceError;

/// Inputs for one ledger entry.
#[derive(Debug, Clone)]
pub struct Movement {
    pub product_id: Uuid,
    pub kind: MovementKind,
    /// Signed delta. Positive for entrada, negative for saida/venda,
    /// either sign for ajuste.
    pub quantity: i32,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub cost_price: Option<Decimal>,
    pub reason: Option<String>,
    pub reference: Option<(ReferenceKind, Uuid)>,
    pub user_id: Uuid,
}

/// Appends one ledger row. Callers update the product stock themselves,
/// inside the same transaction.
pub async fn record_movement<C>(conn: &C, movement: Movement) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if movement.new_stock - movement.previous_stock != movement.quantity {
        return Err(ServiceError::InternalError(format!(
            "inconsistent stock movement for product {}: {} -> {} with delta {}",
            movement.product_id, movement.previous_stock, movement.new_stock, movement.quantity
        )));
    }

    let (reference_kind, reference_id) = match movement.reference {
        Some((kind, id)) => (Some(kind), Some(id)),
        None => (None, None),
    };

    let entry = inventory_transaction::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(movement.product_id),
        kind: Set(movement.kind),
        quantity: Set(movement.quantity),
        previous_stock: Set(movement.previous_stock),
        new_stock: Set(movement.new_stock),
        cost_price: Set(movement.cost_price),
        reason: Set(movement.reason),
        reference_kind: Set(reference_kind),
        reference_id: Set(reference_id),
        user_id: Set(movement.user_id),
        ..Default::default()
    };
    entry.insert(conn).await?;
    Ok(())
}

/// Lists ledger entries for a product, newest first.
pub async fn product_history<C>(
    conn: &C,
    product_id: Uuid,
    page: u64,
    limit: u64,
) -> Result<(Vec<inventory_transaction::Model>, u64), ServiceError>
where
    C: ConnectionTrait,
{
    use sea_orm::{PaginatorTrait, QuerySelect};

    let filter = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(product_id));

    let total = filter.clone().count(conn).await?;
    let items = filter
        .order_by_desc(inventory_transaction::Column::CreatedAt)
        .offset(limit.saturating_mul(page.saturating_sub(1)))
        .limit(limit)
        .all(conn)
        .await?;

    Ok((items, total))
}

/// Counts sale-kind movements for a product. Non-zero means the product
/// participated in sales and must be soft-deleted instead of removed.
pub async fn sale_movement_count<C>(conn: &C, product_id: Uuid) -> Result<u64, ServiceError>
where
    C: ConnectionTrait,
{
    use sea_orm::PaginatorTrait;

    let count = inventory_transaction::Entity::find()
        .filter(inventory_transaction::Column::ProductId.eq(product_id))
        .filter(inventory_transaction::Column::Kind.eq(MovementKind::Venda))
        .count(conn)
        .await?;
    Ok(count)
}
