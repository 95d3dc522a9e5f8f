use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tracing::instrument;
use uuid::Uuid;

use crate::config::StockConfig;
use crate::db::DbPool;
use crate::entities::product::{self, ProductCategory};
use crate::entities::sale::{self, PaymentMethod, PaymentStatus};
use crate::entities::{client, inventory_transaction, sale_item, supplier};
use crate::errors::ServiceError;

/// Grouping granularity for the sales analysis report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SalesSummary {
    pub count: u64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryRevenue {
    pub category: ProductCategory,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardDay {
    pub date: NaiveDate,
    pub count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardTopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardTopClient {
    pub client_id: Uuid,
    pub name: String,
    pub total_spent: Decimal,
    pub order_count: u64,
}

/// Everything the dashboard landing page needs in one response.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_clients: u64,
    pub total_suppliers: u64,
    pub low_stock_count: u64,
    pub today: SalesSummary,
    pub month: SalesSummary,
    pub payment_methods: Vec<MethodTotal>,
    pub category_sales: Vec<CategoryRevenue>,
    pub sales_by_day: Vec<DashboardDay>,
    pub top_products: Vec<DashboardTopProduct>,
    pub top_clients: Vec<DashboardTopClient>,
    pub recent_sales: Vec<sale::Model>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisBucket {
    /// Bucket label: the day, ISO week, month or year the sales fall in.
    pub period: String,
    pub count: u64,
    pub revenue: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalysis {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub totals: SalesSummary,
    pub average_ticket: Decimal,
    pub buckets: Vec<AnalysisBucket>,
    pub category_sales: Vec<CategoryRevenue>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInventory {
    pub category: ProductCategory,
    pub products: u64,
    pub total_stock: i64,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub average_price: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAnalysis {
    pub by_category: Vec<CategoryInventory>,
    pub out_of_stock: u64,
    pub low_stock: Vec<product::Model>,
    /// Products at or below the global critical threshold, regardless
    /// of their own minimum.
    pub critical_stock: Vec<product::Model>,
    pub recent_movements: Vec<inventory_transaction::Model>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub potential_profit: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRanking {
    pub client_id: Uuid,
    pub name: String,
    pub total_spent: Decimal,
    pub order_count: u64,
    pub average_ticket: Decimal,
}

/// Count of clients whose loyalty balance falls in a points range.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct LoyaltyBucket {
    pub range: &'static str,
    pub clients: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAnalysis {
    pub total_clients: u64,
    pub new_this_month: u64,
    pub active_this_month: u64,
    pub average_ticket: Decimal,
    pub top_clients: Vec<ClientRanking>,
    pub loyalty_distribution: Vec<LoyaltyBucket>,
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<DbPool>,
    stock: StockConfig,
}

impl ReportService {
    pub fn new(db: Arc<DbPool>, stock: StockConfig) -> Self {
        Self { db, stock }
    }

    #[instrument(skip(self))]
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let now = Utc::now();
        let today_start = start_of_day(now);
        let month_start = start_of_month(now);
        let week_start = start_of_day(now - Duration::days(6));

        let total_products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .count(&*self.db)
            .await?;
        let total_clients = client::Entity::find()
            .filter(client::Column::IsActive.eq(true))
            .count(&*self.db)
            .await?;
        let total_suppliers = supplier::Entity::find()
            .filter(supplier::Column::IsActive.eq(true))
            .count(&*self.db)
            .await?;
        let low_stock_count = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(Expr::col(product::Column::Stock).lte(Expr::col(product::Column::MinStock)))
            .count(&*self.db)
            .await?;

        // One fetch covers today, the month, the weekly chart and the
        // per-method breakdown.
        let month_sales = sale::Entity::find()
            .filter(active_sales_since(month_start.min(week_start)))
            .all(&*self.db)
            .await?;

        let mut today = SalesSummary::default();
        let mut month = SalesSummary::default();
        let mut methods: HashMap<PaymentMethod, MethodTotal> = HashMap::new();
        let mut days: HashMap<NaiveDate, DashboardDay> = HashMap::new();
        let mut month_sale_ids = Vec::new();

        for s in &month_sales {
            if s.created_at >= today_start {
                today.count += 1;
                today.revenue += s.total;
                today.profit += s.profit;
            }
            if s.created_at >= month_start {
                month.count += 1;
                month.revenue += s.total;
                month.profit += s.profit;
                month_sale_ids.push(s.id);

                let entry = methods
                    .entry(s.payment_method)
                    .or_insert_with(|| MethodTotal {
                        method: s.payment_method,
                        count: 0,
                        revenue: Decimal::ZERO,
                    });
                entry.count += 1;
                entry.revenue += s.total;
            }
            if s.created_at >= week_start {
                let date = s.created_at.date_naive();
                let entry = days.entry(date).or_insert_with(|| DashboardDay {
                    date,
                    count: 0,
                    revenue: Decimal::ZERO,
                });
                entry.count += 1;
                entry.revenue += s.total;
            }
        }

        let mut payment_methods: Vec<MethodTotal> = methods.into_values().collect();
        payment_methods.sort_by(|a, b| b.revenue.cmp(&a.revenue));

        let mut sales_by_day: Vec<DashboardDay> = days.into_values().collect();
        sales_by_day.sort_by_key(|d| d.date);

        let (category_sales, top_products) =
            self.item_breakdown(&month_sale_ids).await?;

        let top_clients = self.top_clients_since(month_start, 5).await?;

        let recent_sales = sale::Entity::find()
            .order_by_desc(sale::Column::CreatedAt)
            .limit(5)
            .all(&*self.db)
            .await?;

        Ok(DashboardStats {
            total_products,
            total_clients,
            total_suppliers,
            low_stock_count,
            today,
            month,
            payment_methods,
            category_sales,
            sales_by_day,
            top_products,
            top_clients,
            recent_sales,
        })
    }

    /// Sales over a range, bucketed by the requested granularity.
    #[instrument(skip(self))]
    pub async fn sales_analysis(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        group_by: GroupBy,
    ) -> Result<SalesAnalysis, ServiceError> {
        let now = Utc::now();
        let start = start_date
            .map(start_of_day)
            .unwrap_or_else(|| start_of_day(now - Duration::days(30)));
        let end = end_date.map(end_of_day).unwrap_or_else(|| end_of_day(now));

        let sales = sale::Entity::find()
            .filter(active_sales_since(start))
            .filter(sale::Column::CreatedAt.lte(end))
            .all(&*self.db)
            .await?;

        let mut totals = SalesSummary::default();
        let mut buckets: HashMap<String, AnalysisBucket> = HashMap::new();
        let mut sale_ids = Vec::with_capacity(sales.len());

        for s in &sales {
            totals.count += 1;
            totals.revenue += s.total;
            totals.profit += s.profit;
            sale_ids.push(s.id);

            let period = bucket_label(s.created_at, group_by);
            let entry = buckets.entry(period.clone()).or_insert_with(|| AnalysisBucket {
                period,
                count: 0,
                revenue: Decimal::ZERO,
                profit: Decimal::ZERO,
            });
            entry.count += 1;
            entry.revenue += s.total;
            entry.profit += s.profit;
        }

        let mut buckets: Vec<AnalysisBucket> = buckets.into_values().collect();
        buckets.sort_by(|a, b| a.period.cmp(&b.period));

        let average_ticket = if totals.count > 0 {
            (totals.revenue / Decimal::from(totals.count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let (category_sales, _) = self.item_breakdown(&sale_ids).await?;

        Ok(SalesAnalysis {
            start_date: start,
            end_date: end,
            totals,
            average_ticket,
            buckets,
            category_sales,
        })
    }

    /// Current stock valuation per category plus the low- and
    /// out-of-stock picture. Inactive products are excluded.
    #[instrument(skip(self))]
    pub async fn inventory_analysis(&self) -> Result<InventoryAnalysis, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        struct Acc {
            products: u64,
            stock: i64,
            value: Decimal,
            cost: Decimal,
            price_sum: Decimal,
        }
        let mut by_category: HashMap<ProductCategory, Acc> = HashMap::new();
        let mut out_of_stock = 0u64;
        let mut low_stock = Vec::new();
        let mut critical_stock = Vec::new();
        let mut total_value = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;

        for p in &products {
            let stock = Decimal::from(p.stock);
            let value = p.price * stock;
            let cost = p.cost_price * stock;

            let entry = by_category.entry(p.category).or_insert_with(|| Acc {
                products: 0,
                stock: 0,
                value: Decimal::ZERO,
                cost: Decimal::ZERO,
                price_sum: Decimal::ZERO,
            });
            entry.products += 1;
            entry.stock += i64::from(p.stock);
            entry.value += value;
            entry.cost += cost;
            entry.price_sum += p.price;

            total_value += value;
            total_cost += cost;

            if p.stock == 0 {
                out_of_stock += 1;
            } else {
                if p.stock <= p.min_stock {
                    low_stock.push(p.clone());
                }
                if p.stock <= self.stock.critical_threshold {
                    critical_stock.push(p.clone());
                }
            }
        }
        low_stock.sort_by_key(|p| p.stock);
        critical_stock.sort_by_key(|p| p.stock);

        let recent_movements = inventory_transaction::Entity::find()
            .order_by_desc(inventory_transaction::Column::CreatedAt)
            .limit(10)
            .all(&*self.db)
            .await?;

        let mut by_category: Vec<CategoryInventory> = by_category
            .into_iter()
            .map(|(category, acc)| CategoryInventory {
                category,
                products: acc.products,
                total_stock: acc.stock,
                total_value: acc.value,
                total_cost: acc.cost,
                average_price: (acc.price_sum / Decimal::from(acc.products)).round_dp(2),
            })
            .collect();
        by_category.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()));

        Ok(InventoryAnalysis {
            by_category,
            out_of_stock,
            low_stock,
            critical_stock,
            recent_movements,
            total_value,
            total_cost,
            potential_profit: total_value - total_cost,
        })
    }

    /// Client base snapshot: size, growth and activity this month, and
    /// the ten best clients by lifetime spend.
    #[instrument(skip(self))]
    pub async fn client_analysis(&self) -> Result<ClientAnalysis, ServiceError> {
        let month_start = start_of_month(Utc::now());

        let total_clients = client::Entity::find().count(&*self.db).await?;
        let new_this_month = client::Entity::find()
            .filter(client::Column::CreatedAt.gte(month_start))
            .count(&*self.db)
            .await?;
        let active_this_month = client::Entity::find()
            .filter(client::Column::LastPurchase.gte(month_start))
            .count(&*self.db)
            .await?;

        let rows: Vec<(Option<Uuid>, Decimal)> = sale::Entity::find()
            .filter(sale::Column::PaymentStatus.ne(PaymentStatus::Cancelado))
            .filter(sale::Column::ClientId.is_not_null())
            .select_only()
            .column(sale::Column::ClientId)
            .column(sale::Column::Total)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut spent: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
        let mut overall_revenue = Decimal::ZERO;
        let mut overall_count = 0u64;
        for (client_id, total) in rows {
            overall_revenue += total;
            overall_count += 1;
            if let Some(client_id) = client_id {
                let entry = spent.entry(client_id).or_insert((Decimal::ZERO, 0));
                entry.0 += total;
                entry.1 += 1;
            }
        }

        let mut ranked: Vec<(Uuid, (Decimal, u64))> = spent.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));
        ranked.truncate(10);

        let mut top_clients = Vec::with_capacity(ranked.len());
        for (client_id, (total_spent, order_count)) in ranked {
            let Some(found) = client::Entity::find_by_id(client_id).one(&*self.db).await? else {
                continue;
            };
            top_clients.push(ClientRanking {
                client_id,
                name: found.name,
                total_spent,
                order_count,
                average_ticket: (total_spent / Decimal::from(order_count)).round_dp(2),
            });
        }

        let average_ticket = if overall_count > 0 {
            (overall_revenue / Decimal::from(overall_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        let points: Vec<i32> = client::Entity::find()
            .select_only()
            .column(client::Column::LoyaltyPoints)
            .into_tuple()
            .all(&*self.db)
            .await?;
        let loyalty_distribution = loyalty_distribution(&points);

        Ok(ClientAnalysis {
            total_clients,
            new_this_month,
            active_this_month,
            average_ticket,
            top_clients,
            loyalty_distribution,
        })
    }

    /// Per-category revenue and the five best-selling products over a
    /// set of sales.
    async fn item_breakdown(
        &self,
        sale_ids: &[Uuid],
    ) -> Result<(Vec<CategoryRevenue>, Vec<DashboardTopProduct>), ServiceError> {
        if sale_ids.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let items = sale_item::Entity::find()
            .filter(sale_item::Column::SaleId.is_in(sale_ids.iter().copied()))
            .all(&*self.db)
            .await?;

        let product_ids: Vec<Uuid> = {
            let mut ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
            ids.sort();
            ids.dedup();
            ids
        };
        let categories: HashMap<Uuid, ProductCategory> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.category))
            .collect();

        let mut by_category: HashMap<ProductCategory, CategoryRevenue> = HashMap::new();
        let mut by_product: HashMap<Uuid, DashboardTopProduct> = HashMap::new();

        for item in &items {
            let quantity = i64::from(item.quantity);
            let revenue = item.price * Decimal::from(item.quantity);

            let category = categories
                .get(&item.product_id)
                .copied()
                .unwrap_or_default();
            let entry = by_category
                .entry(category)
                .or_insert_with(|| CategoryRevenue {
                    category,
                    quantity: 0,
                    revenue: Decimal::ZERO,
                });
            entry.quantity += quantity;
            entry.revenue += revenue;

            let entry = by_product
                .entry(item.product_id)
                .or_insert_with(|| DashboardTopProduct {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    quantity: 0,
                    revenue: Decimal::ZERO,
                });
            entry.quantity += quantity;
            entry.revenue += revenue;
        }

        let mut category_sales: Vec<CategoryRevenue> = by_category.into_values().collect();
        category_sales.sort_by(|a, b| b.revenue.cmp(&a.revenue));

        let mut top_products: Vec<DashboardTopProduct> = by_product.into_values().collect();
        top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
        top_products.truncate(5);

        Ok((category_sales, top_products))
    }

    async fn top_clients_since(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DashboardTopClient>, ServiceError> {
        let rows: Vec<(Option<Uuid>, Decimal)> = sale::Entity::find()
            .filter(active_sales_since(since))
            .filter(sale::Column::ClientId.is_not_null())
            .select_only()
            .column(sale::Column::ClientId)
            .column(sale::Column::Total)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut spent: HashMap<Uuid, (Decimal, u64)> = HashMap::new();
        for (client_id, total) in rows {
            let Some(client_id) = client_id else { continue };
            let entry = spent.entry(client_id).or_insert((Decimal::ZERO, 0));
            entry.0 += total;
            entry.1 += 1;
        }

        let mut ranked: Vec<(Uuid, (Decimal, u64))> = spent.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0));
        ranked.truncate(limit);

        let mut result = Vec::with_capacity(ranked.len());
        for (client_id, (total_spent, order_count)) in ranked {
            let Some(found) = client::Entity::find_by_id(client_id).one(&*self.db).await? else {
                continue;
            };
            result.push(DashboardTopClient {
                client_id,
                name: found.name,
                total_spent,
                order_count,
            });
        }
        Ok(result)
    }
}

fn active_sales_since(since: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(sale::Column::CreatedAt.gte(since))
        .add(sale::Column::PaymentStatus.ne(PaymentStatus::Cancelado))
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

fn start_of_month(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(dt)
}

fn loyalty_distribution(points: &[i32]) -> Vec<LoyaltyBucket> {
    let ranges: [(&'static str, std::ops::RangeInclusive<i32>); 4] = [
        ("0", 0..=0),
        ("1-99", 1..=99),
        ("100-499", 100..=499),
        ("500+", 500..=i32::MAX),
    ];
    ranges
        .into_iter()
        .map(|(range, bounds)| LoyaltyBucket {
            range,
            clients: points.iter().filter(|p| bounds.contains(p)).count() as u64,
        })
        .collect()
}

fn bucket_label(dt: DateTime<Utc>, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => dt.format("%Y-%m-%d").to_string(),
        GroupBy::Week => {
            let week = dt.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        GroupBy::Month => dt.format("%Y-%m").to_string(),
        GroupBy::Year => dt.format("%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bucket_labels_follow_granularity() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(bucket_label(dt, GroupBy::Day), "2024-03-15");
        assert_eq!(bucket_label(dt, GroupBy::Week), "2024-W11");
        assert_eq!(bucket_label(dt, GroupBy::Month), "2024-03");
        assert_eq!(bucket_label(dt, GroupBy::Year), "2024");
    }

    #[test]
    fn loyalty_buckets_cover_the_whole_range() {
        let buckets = loyalty_distribution(&[0, 0, 5, 120, 800]);
        let clients: Vec<u64> = buckets.iter().map(|b| b.clients).collect();
        assert_eq!(clients, vec![2, 1, 1, 1]);
        assert_eq!(clients.iter().sum::<u64>(), 5);
    }

    #[test]
    fn month_starts_on_the_first() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 18, 45, 0).unwrap();
        assert_eq!(
            start_of_month(dt),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
    }
}
