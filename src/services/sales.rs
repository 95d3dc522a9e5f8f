use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_transaction::{MovementKind, ReferenceKind};
use crate::entities::sale::{self, format_sale_number, PaymentMethod, PaymentStatus};
use crate::entities::sale_counter::{self, COUNTER_ROW_ID};
use crate::entities::sale_item;
use crate::entities::{client, product};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::inventory::{self, Movement};
use crate::services::Page;

/// One requested sale line. `price` overrides the catalog price when
/// given; `discount` applies to this line's stored total only.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewSale {
    pub client_id: Option<Uuid>,
    pub items: Vec<NewSaleItem>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub client_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub page: u64,
    pub limit: u64,
}

/// Aggregate totals over a filtered set of sales.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SaleTotals {
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub total_profit: Decimal,
}

/// One bucket of the per-day report.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub count: u64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct PeriodReport {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub totals: SaleTotals,
    pub sales_by_day: Vec<DailySales>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub total_quantity: i64,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub category: Option<crate::entities::product::ProductCategory>,
    pub stock: Option<i32>,
}

/// Reporting period presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    Yesterday,
    Week,
    Month,
    Year,
}

#[derive(Clone)]
pub struct SaleService {
    db: Arc<DbPool>,
    events: Arc<EventSender>,
}

impl SaleService {
    pub fn new(db: Arc<DbPool>, events: Arc<EventSender>) -> Self {
        Self { db, events }
    }

    /// Creates a sale: reserves the next sale number, snapshots product
    /// data into line items, decrements stock with a ledger entry per
    /// line, and updates the client's totals and loyalty points. The
    /// whole workflow runs in one transaction; any failure leaves no
    /// trace of the sale.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create_sale(
        &self,
        input: NewSale,
        seller_id: Uuid,
    ) -> Result<(sale::Model, Vec<sale_item::Model>), ServiceError> {
        if input.items.is_empty() {
            return Err(ServiceError::ValidationError(
                "no items added to the sale".to_string(),
            ));
        }
        for item in &input.items {
            if item.quantity < 1 {
                return Err(ServiceError::ValidationError(
                    "item quantity must be at least 1".to_string(),
                ));
            }
        }
        let discount = input.discount.unwrap_or(Decimal::ZERO);
        let tax = input.tax.unwrap_or(Decimal::ZERO);
        if discount < Decimal::ZERO || tax < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "discount and tax cannot be negative".to_string(),
            ));
        }

        let payment_method = input
            .payment_method
            .as_deref()
            .map(PaymentMethod::normalize)
            .unwrap_or_default();
        let payment_status = input.payment_status.unwrap_or_default();

        let txn = self.db.begin().await?;

        let sale_number = next_sale_number(&txn).await?;
        let sale_id = Uuid::new_v4();

        let mut subtotal = Decimal::ZERO;
        let mut profit = Decimal::ZERO;
        let mut lines: Vec<sale_item::ActiveModel> = Vec::with_capacity(input.items.len());
        let mut stock_updates: Vec<(product::Model, i32)> = Vec::with_capacity(input.items.len());

        for item in &input.items {
            let prod = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("product {} not found", item.product_id))
                })?;

            if prod.stock < item.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "insufficient stock for {}. Available: {}",
                    prod.name, prod.stock
                )));
            }

            let quantity = Decimal::from(item.quantity);
            let unit_price = item.price.unwrap_or(prod.price);
            let line_total = unit_price * quantity;
            let line_cost = prod.cost_price * quantity;
            let line_discount = item.discount.unwrap_or(Decimal::ZERO);

            subtotal += line_total;
            profit += line_total - line_cost;

            lines.push(sale_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                sale_id: Set(sale_id),
                product_id: Set(prod.id),
                name: Set(prod.name.clone()),
                quantity: Set(item.quantity),
                price: Set(unit_price),
                cost_price: Set(prod.cost_price),
                discount: Set(line_discount),
                total: Set(line_total - line_discount),
                ..Default::default()
            });

            let new_stock = prod.stock - item.quantity;
            stock_updates.push((prod, new_stock));
        }

        let total = subtotal - discount + tax;
        let profit = profit - discount;

        let sale_model = sale::ActiveModel {
            id: Set(sale_id),
            sale_number: Set(sale_number.clone()),
            client_id: Set(input.client_id),
            subtotal: Set(subtotal),
            discount: Set(discount),
            tax: Set(tax),
            total: Set(total),
            profit: Set(profit),
            payment_method: Set(payment_method),
            payment_status: Set(payment_status),
            notes: Set(input.notes),
            seller_id: Set(seller_id),
            ..Default::default()
        };
        let created = sale_model.insert(&txn).await?;

        let mut created_items = Vec::with_capacity(lines.len());
        for line in lines {
            created_items.push(line.insert(&txn).await?);
        }

        let mut low_stock_events = Vec::new();
        for (prod, new_stock) in stock_updates {
            inventory::record_movement(
                &txn,
                Movement {
                    product_id: prod.id,
                    kind: MovementKind::Venda,
                    quantity: new_stock - prod.stock,
                    previous_stock: prod.stock,
                    new_stock,
                    cost_price: Some(prod.cost_price),
                    reason: Some("sale".to_string()),
                    reference: Some((ReferenceKind::Sale, sale_id)),
                    user_id: seller_id,
                },
            )
            .await?;

            if new_stock <= prod.min_stock {
                low_stock_events.push(Event::LowStock {
                    product_id: prod.id,
                    stock: new_stock,
                    min_stock: prod.min_stock,
                });
            }

            let mut model: product::ActiveModel = prod.into();
            model.stock = Set(new_stock);
            model.update(&txn).await?;
        }

        if let Some(client_id) = input.client_id {
            apply_client_purchase(&txn, client_id, total).await?;
        }

        txn.commit().await?;

        info!(sale_id = %created.id, sale_number = %created.sale_number, %total, "Sale created");
        self.events
            .send_or_log(Event::SaleCreated {
                sale_id: created.id,
                sale_number: created.sale_number.clone(),
            })
            .await;
        for event in low_stock_events {
            self.events.send_or_log(event).await;
        }

        Ok((created, created_items))
    }

    /// Cancels a sale: marks it Cancelado, returns every line's quantity
    /// to current stock with a ledger entry, and rolls back the client's
    /// totals and loyalty points (both floored at zero). Transactional;
    /// cancelling twice is a conflict.
    #[instrument(skip(self))]
    pub async fn cancel_sale(
        &self,
        sale_id: Uuid,
        user_id: Uuid,
    ) -> Result<sale::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = sale::Entity::find_by_id(sale_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("sale not found".to_string()))?;

        if existing.payment_status == PaymentStatus::Cancelado {
            return Err(ServiceError::Conflict(
                "sale is already cancelled".to_string(),
            ));
        }

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.eq(sale_id))
            .all(&txn)
            .await?;

        let total = existing.total;
        let client_id = existing.client_id;

        let mut model: sale::ActiveModel = existing.into();
        model.payment_status = Set(PaymentStatus::Cancelado);
        let updated = model.update(&txn).await?;

        for item in &items {
            // Restock against the CURRENT stock level, which may have
            // moved since the sale.
            let prod = product::Entity::find_by_id(item.product_id).one(&txn).await?;
            let Some(prod) = prod else {
                continue;
            };

            let previous_stock = prod.stock;
            let new_stock = previous_stock + item.quantity;

            inventory::record_movement(
                &txn,
                Movement {
                    product_id: prod.id,
                    kind: MovementKind::Entrada,
                    quantity: item.quantity,
                    previous_stock,
                    new_stock,
                    cost_price: Some(item.cost_price),
                    reason: Some("sale cancellation".to_string()),
                    reference: Some((ReferenceKind::Sale, sale_id)),
                    user_id,
                },
            )
            .await?;

            let mut model: product::ActiveModel = prod.into();
            model.stock = Set(new_stock);
            model.update(&txn).await?;
        }

        if let Some(client_id) = client_id {
            revert_client_purchase(&txn, client_id, total).await?;
        }

        txn.commit().await?;

        info!(%sale_id, sale_number = %updated.sale_number, "Sale cancelled");
        self.events
            .send_or_log(Event::SaleCancelled {
                sale_id,
                sale_number: updated.sale_number.clone(),
            })
            .await;

        Ok(updated)
    }

    pub async fn get_sale(
        &self,
        sale_id: Uuid,
    ) -> Result<(sale::Model, Vec<sale_item::Model>), ServiceError> {
        let found = sale::Entity::find_by_id(sale_id)
            .find_with_related(sale_item::Entity)
            .all(&*self.db)
            .await?;
        found
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::NotFound("sale not found".to_string()))
    }

    /// Lists sales (without items) matching the filter, newest first,
    /// plus aggregate totals over the whole filtered set.
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        filter: SaleFilter,
    ) -> Result<(Page<sale::Model>, SaleTotals), ServiceError> {
        let condition = sale_filter_condition(&filter);

        let query = sale::Entity::find().filter(condition.clone());
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(sale::Column::CreatedAt)
            .offset(filter.limit.saturating_mul(filter.page.saturating_sub(1)))
            .limit(filter.limit)
            .all(&*self.db)
            .await?;

        let totals = self.totals_for(condition).await?;

        Ok((Page { items, total }, totals))
    }

    /// Updates payment status and/or method of a sale.
    pub async fn update_payment(
        &self,
        sale_id: Uuid,
        payment_status: Option<PaymentStatus>,
        payment_method: Option<PaymentMethod>,
    ) -> Result<sale::Model, ServiceError> {
        let existing = sale::Entity::find_by_id(sale_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("sale not found".to_string()))?;

        let old_status = existing.payment_status;
        let mut model: sale::ActiveModel = existing.into();
        if let Some(status) = payment_status {
            model.payment_status = Set(status);
        }
        if let Some(method) = payment_method {
            model.payment_method = Set(method);
        }
        let updated = model.update(&*self.db).await?;

        if let Some(status) = payment_status {
            if status != old_status {
                self.events
                    .send_or_log(Event::PaymentStatusChanged {
                        sale_id,
                        old_status: old_status.as_str().to_string(),
                        new_status: status.as_str().to_string(),
                    })
                    .await;
            }
        }

        Ok(updated)
    }

    /// Period report: totals and per-day buckets over non-cancelled
    /// sales. `None` means the last 30 days.
    #[instrument(skip(self))]
    pub async fn sales_by_period(
        &self,
        period: Option<Period>,
    ) -> Result<PeriodReport, ServiceError> {
        let (start_date, end_date) = period_bounds(period, Utc::now());

        let condition = Condition::all()
            .add(sale::Column::CreatedAt.gte(start_date))
            .add(sale::Column::CreatedAt.lte(end_date))
            .add(sale::Column::PaymentStatus.ne(PaymentStatus::Cancelado));

        let rows: Vec<(DateTime<Utc>, Decimal, Decimal)> = sale::Entity::find()
            .filter(condition)
            .select_only()
            .column(sale::Column::CreatedAt)
            .column(sale::Column::Total)
            .column(sale::Column::Profit)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let totals = fold_totals(rows.iter().map(|(_, t, p)| (*t, *p)));
        let sales_by_day = bucket_by_day(&rows);

        Ok(PeriodReport {
            start_date,
            end_date,
            totals,
            sales_by_day,
        })
    }

    /// Best-selling products by quantity over non-cancelled sales,
    /// optionally bounded by a date range.
    #[instrument(skip(self))]
    pub async fn top_products(
        &self,
        limit: usize,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<TopProduct>, ServiceError> {
        let mut condition =
            Condition::all().add(sale::Column::PaymentStatus.ne(PaymentStatus::Cancelado));
        if let Some(start) = start_date {
            condition = condition.add(sale::Column::CreatedAt.gte(start));
        }
        if let Some(end) = end_date {
            condition = condition.add(sale::Column::CreatedAt.lte(end_of_day(end)));
        }

        let pairs = sale::Entity::find()
            .filter(condition)
            .find_with_related(sale_item::Entity)
            .all(&*self.db)
            .await?;

        struct Acc {
            name: String,
            quantity: i64,
            sales: u64,
            revenue: Decimal,
        }
        let mut by_product: HashMap<Uuid, Acc> = HashMap::new();
        for (_, items) in &pairs {
            for item in items {
                let entry = by_product.entry(item.product_id).or_insert_with(|| Acc {
                    name: item.name.clone(),
                    quantity: 0,
                    sales: 0,
                    revenue: Decimal::ZERO,
                });
                entry.quantity += i64::from(item.quantity);
                entry.sales += 1;
                entry.revenue += item.price * Decimal::from(item.quantity);
            }
        }

        let mut ranked: Vec<(Uuid, Acc)> = by_product.into_iter().collect();
        ranked.sort_by(|a, b| b.1.quantity.cmp(&a.1.quantity));
        ranked.truncate(limit);

        let mut result = Vec::with_capacity(ranked.len());
        for (product_id, acc) in ranked {
            let details = product::Entity::find_by_id(product_id)
                .one(&*self.db)
                .await?;
            result.push(TopProduct {
                product_id,
                name: acc.name,
                total_quantity: acc.quantity,
                total_sales: acc.sales,
                total_revenue: acc.revenue,
                category: details.as_ref().map(|p| p.category),
                stock: details.as_ref().map(|p| p.stock),
            });
        }
        Ok(result)
    }

    async fn totals_for(&self, condition: Condition) -> Result<SaleTotals, ServiceError> {
        let rows: Vec<(Decimal, Decimal)> = sale::Entity::find()
            .filter(condition)
            .select_only()
            .column(sale::Column::Total)
            .column(sale::Column::Profit)
            .into_tuple()
            .all(&*self.db)
            .await?;
        Ok(fold_totals(rows.into_iter()))
    }
}

/// Bumps the counter row and formats the reserved sale number. Runs
/// inside the sale creation transaction. The increment happens in SQL,
/// so the row lock it takes serializes concurrent transactions: each one
/// reads back its own bumped value and no two sales share a number. The
/// unique index on `sales.sale_number` backstops it all the same.
async fn next_sale_number(txn: &DatabaseTransaction) -> Result<String, ServiceError> {
    sale_counter::Entity::update_many()
        .col_expr(
            sale_counter::Column::CurrentValue,
            Expr::col(sale_counter::Column::CurrentValue).add(1),
        )
        .filter(sale_counter::Column::Id.eq(COUNTER_ROW_ID))
        .exec(txn)
        .await?;

    let counter = sale_counter::Entity::find_by_id(COUNTER_ROW_ID)
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::InternalError("sale counter row missing".to_string()))?;

    Ok(format_sale_number(counter.current_value))
}

async fn apply_client_purchase(
    txn: &DatabaseTransaction,
    client_id: Uuid,
    total: Decimal,
) -> Result<(), ServiceError> {
    let Some(found) = client::Entity::find_by_id(client_id).one(txn).await? else {
        return Ok(());
    };

    // 1 loyalty point per R$ 10.00.
    let points = loyalty_points_for(total);

    let new_points = found.loyalty_points + points;
    let new_total = found.total_purchased + total;

    let mut model: client::ActiveModel = found.into();
    model.total_purchased = Set(new_total);
    model.last_purchase = Set(Some(Utc::now()));
    model.loyalty_points = Set(new_points);
    model.update(txn).await?;
    Ok(())
}

async fn revert_client_purchase(
    txn: &DatabaseTransaction,
    client_id: Uuid,
    total: Decimal,
) -> Result<(), ServiceError> {
    let Some(found) = client::Entity::find_by_id(client_id).one(txn).await? else {
        return Ok(());
    };

    let points = loyalty_points_for(total);

    let new_total = (found.total_purchased - total).max(Decimal::ZERO);
    let new_points = (found.loyalty_points - points).max(0);

    let mut model: client::ActiveModel = found.into();
    model.total_purchased = Set(new_total);
    model.loyalty_points = Set(new_points);
    model.update(txn).await?;
    Ok(())
}

fn loyalty_points_for(total: Decimal) -> i32 {
    (total / Decimal::TEN)
        .floor()
        .to_i32()
        .unwrap_or(0)
        .max(0)
}

fn sale_filter_condition(filter: &SaleFilter) -> Condition {
    let mut condition = Condition::all();
    if let Some(start) = filter.start_date {
        condition = condition.add(sale::Column::CreatedAt.gte(start));
    }
    if let Some(end) = filter.end_date {
        condition = condition.add(sale::Column::CreatedAt.lte(end_of_day(end)));
    }
    if let Some(client_id) = filter.client_id {
        condition = condition.add(sale::Column::ClientId.eq(client_id));
    }
    if let Some(seller_id) = filter.seller_id {
        condition = condition.add(sale::Column::SellerId.eq(seller_id));
    }
    if let Some(method) = filter.payment_method {
        condition = condition.add(sale::Column::PaymentMethod.eq(method));
    }
    if let Some(status) = filter.payment_status {
        condition = condition.add(sale::Column::PaymentStatus.eq(status));
    }
    condition
}

fn fold_totals(rows: impl Iterator<Item = (Decimal, Decimal)>) -> SaleTotals {
    let mut totals = SaleTotals::default();
    for (total, profit) in rows {
        totals.total_sales += 1;
        totals.total_revenue += total;
        totals.total_profit += profit;
    }
    totals
}

fn bucket_by_day(rows: &[(DateTime<Utc>, Decimal, Decimal)]) -> Vec<DailySales> {
    let mut buckets: HashMap<NaiveDate, DailySales> = HashMap::new();
    for (created_at, total, profit) in rows {
        let date = created_at.date_naive();
        let entry = buckets.entry(date).or_insert_with(|| DailySales {
            date,
            count: 0,
            revenue: Decimal::ZERO,
            profit: Decimal::ZERO,
        });
        entry.count += 1;
        entry.revenue += *total;
        entry.profit += *profit;
    }
    let mut days: Vec<DailySales> = buckets.into_values().collect();
    days.sort_by_key(|d| d.date);
    days
}

fn start_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(dt)
}

fn end_of_day(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|naive| naive.and_utc())
        .unwrap_or(dt)
}

/// Resolves a period preset to inclusive UTC bounds. Defaults to the
/// last 30 days.
fn period_bounds(period: Option<Period>, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = end_of_day(now);
    match period {
        Some(Period::Today) => (start_of_day(now), end),
        Some(Period::Yesterday) => {
            let yesterday = now - Duration::days(1);
            (start_of_day(yesterday), end_of_day(yesterday))
        }
        Some(Period::Week) => (start_of_day(now - Duration::days(7)), end),
        Some(Period::Month) => {
            let start = now
                .date_naive()
                .checked_sub_months(chrono::Months::new(1))
                .unwrap_or_else(|| now.date_naive() - Duration::days(30));
            (
                start.and_hms_opt(0, 0, 0).map(|n| n.and_utc()).unwrap_or(now),
                end,
            )
        }
        Some(Period::Year) => {
            let start = now
                .date_naive()
                .with_year(now.year() - 1)
                .unwrap_or_else(|| now.date_naive() - Duration::days(365));
            (
                start.and_hms_opt(0, 0, 0).map(|n| n.and_utc()).unwrap_or(now),
                end,
            )
        }
        None => (start_of_day(now - Duration::days(30)), end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn loyalty_points_floor_to_ten_real_steps() {
        assert_eq!(loyalty_points_for(dec!(105.00)), 10);
        assert_eq!(loyalty_points_for(dec!(9.99)), 0);
        assert_eq!(loyalty_points_for(dec!(10)), 1);
        assert_eq!(loyalty_points_for(dec!(-5)), 0);
    }

    #[test]
    fn totals_fold_sums_revenue_and_profit() {
        let totals = fold_totals(
            vec![(dec!(100), dec!(40)), (dec!(50.50), dec!(10.25))].into_iter(),
        );
        assert_eq!(
            totals,
            SaleTotals {
                total_sales: 2,
                total_revenue: dec!(150.50),
                total_profit: dec!(50.25),
            }
        );
    }

    #[test]
    fn daily_buckets_are_sorted_and_aggregated() {
        let d1 = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let d3 = Utc.with_ymd_and_hms(2024, 3, 2, 20, 0, 0).unwrap();
        let days = bucket_by_day(&[
            (d1, dec!(10), dec!(4)),
            (d2, dec!(20), dec!(8)),
            (d3, dec!(30), dec!(12)),
        ]);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, d2.date_naive());
        assert_eq!(days[0].count, 1);
        assert_eq!(days[1].revenue, dec!(40));
        assert_eq!(days[1].profit, dec!(16));
    }

    #[test]
    fn period_bounds_cover_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();

        let (start, end) = period_bounds(Some(Period::Today), now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
        assert!(end > now);

        let (start, end) = period_bounds(Some(Period::Yesterday), now);
        assert_eq!(start.date_naive(), now.date_naive() - Duration::days(1));
        assert_eq!(end.date_naive(), now.date_naive() - Duration::days(1));

        let (start, _) = period_bounds(None, now);
        assert_eq!(start.date_naive(), now.date_naive() - Duration::days(30));
    }
}
