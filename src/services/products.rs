use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::inventory_transaction::MovementKind;
use crate::entities::product::{self, ProductCategory};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::inventory::{self, Movement};
use crate::services::{DeleteOutcome, Page};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub stock: i32,
    pub min_stock: Option<i32>,
    pub barcode: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub images: Vec<String>,
    pub flavors: Vec<String>,
    pub attributes: BTreeMap<String, String>,
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    pub barcode: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub images: Option<Vec<String>>,
    pub flavors: Option<Vec<String>>,
    pub attributes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub keyword: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
    pub low_stock: bool,
    pub page: u64,
    pub limit: u64,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
    events: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>, events: Arc<EventSender>) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: NewProduct,
        user_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        if input.price < Decimal::ZERO || input.cost_price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price and cost price cannot be negative".to_string(),
            ));
        }
        if input.stock < 0 {
            return Err(ServiceError::ValidationError(
                "stock cannot be negative".to_string(),
            ));
        }

        if let Some(barcode) = input.barcode.as_deref() {
            let existing = product::Entity::find()
                .filter(product::Column::Barcode.eq(barcode))
                .one(&*self.db)
                .await?;
            if existing.is_some() {
                return Err(ServiceError::Conflict(
                    "a product with this barcode already exists".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            description: Set(input.description),
            category: Set(input.category),
            price: Set(input.price),
            cost_price: Set(input.cost_price),
            stock: Set(input.stock),
            min_stock: Set(input.min_stock.unwrap_or(5)),
            barcode: Set(input.barcode),
            supplier_id: Set(input.supplier_id),
            expiry_date: Set(input.expiry_date),
            is_active: Set(true),
            images: Set(serde_json::json!(input.images)),
            flavors: Set(serde_json::json!(input.flavors)),
            attributes: Set(serde_json::json!(input.attributes)),
            ..Default::default()
        };
        let created = model.insert(&txn).await?;

        // Initial stock shows up in the ledger like any other entrada.
        if created.stock > 0 {
            inventory::record_movement(
                &txn,
                Movement {
                    product_id: created.id,
                    kind: MovementKind::Entrada,
                    quantity: created.stock,
                    previous_stock: 0,
                    new_stock: created.stock,
                    cost_price: Some(created.cost_price),
                    reason: Some("initial stock".to_string()),
                    reference: None,
                    user_id,
                },
            )
            .await?;
        }

        txn.commit().await?;

        info!(product_id = %created.id, "Product created");
        self.events.send_or_log(Event::ProductCreated(created.id)).await;
        Ok(created)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
    ) -> Result<Page<product::Model>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let pattern = format!("%{}%", keyword.trim());
            condition = condition.add(
                Condition::any()
                    .add(product::Column::Name.like(pattern.clone()))
                    .add(product::Column::Description.like(pattern)),
            );
        }
        if let Some(category) = filter.category {
            condition = condition.add(product::Column::Category.eq(category));
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(product::Column::IsActive.eq(is_active));
        }
        if filter.low_stock {
            condition = condition.add(
                Expr::col(product::Column::Stock).lte(Expr::col(product::Column::MinStock)),
            );
        }

        let query = product::Entity::find().filter(condition);
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(product::Column::CreatedAt)
            .offset(filter.limit.saturating_mul(filter.page.saturating_sub(1)))
            .limit(filter.limit)
            .all(&*self.db)
            .await?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: Uuid,
        patch: ProductPatch,
        user_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;

        if let Some(barcode) = patch.barcode.as_deref() {
            if existing.barcode.as_deref() != Some(barcode) {
                let clash = product::Entity::find()
                    .filter(product::Column::Barcode.eq(barcode))
                    .filter(product::Column::Id.ne(id))
                    .one(&*self.db)
                    .await?;
                if clash.is_some() {
                    return Err(ServiceError::Conflict(
                        "a product with this barcode already exists".to_string(),
                    ));
                }
            }
        }
        if let Some(price) = patch.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price cannot be negative".to_string(),
                ));
            }
        }
        if let Some(cost) = patch.cost_price {
            if cost < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "cost price cannot be negative".to_string(),
                ));
            }
        }

        let previous_stock = existing.stock;
        let new_stock = patch.stock.unwrap_or(previous_stock);
        if new_stock < 0 {
            return Err(ServiceError::ValidationError(
                "stock cannot be negative".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        // Editing stock through a product update is an explicit ajuste.
        if new_stock != previous_stock {
            inventory::record_movement(
                &txn,
                Movement {
                    product_id: id,
                    kind: MovementKind::Ajuste,
                    quantity: new_stock - previous_stock,
                    previous_stock,
                    new_stock,
                    cost_price: Some(existing.cost_price),
                    reason: Some("stock adjusted while editing product".to_string()),
                    reference: None,
                    user_id,
                },
            )
            .await?;
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(description) = patch.description {
            model.description = Set(Some(description));
        }
        if let Some(category) = patch.category {
            model.category = Set(category);
        }
        if let Some(price) = patch.price {
            model.price = Set(price);
        }
        if let Some(cost_price) = patch.cost_price {
            model.cost_price = Set(cost_price);
        }
        model.stock = Set(new_stock);
        if let Some(min_stock) = patch.min_stock {
            model.min_stock = Set(min_stock);
        }
        if let Some(barcode) = patch.barcode {
            model.barcode = Set(Some(barcode));
        }
        if let Some(supplier_id) = patch.supplier_id {
            model.supplier_id = Set(Some(supplier_id));
        }
        if let Some(expiry_date) = patch.expiry_date {
            model.expiry_date = Set(Some(expiry_date));
        }
        if let Some(is_active) = patch.is_active {
            model.is_active = Set(is_active);
        }
        if let Some(images) = patch.images {
            model.images = Set(serde_json::json!(images));
        }
        if let Some(flavors) = patch.flavors {
            model.flavors = Set(serde_json::json!(flavors));
        }
        if let Some(attributes) = patch.attributes {
            model.attributes = Set(serde_json::json!(attributes));
        }

        let updated = model.update(&txn).await?;
        txn.commit().await?;

        self.events.send_or_log(Event::ProductUpdated(id)).await;
        Ok(updated)
    }

    /// Removes a product, or deactivates it when sales reference it so
    /// sale history stays intact.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let existing = self.get_product(id).await?;
        let referenced = inventory::sale_movement_count(&*self.db, id).await? > 0;

        if referenced {
            let mut model: product::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(&*self.db).await?;
            self.events.send_or_log(Event::ProductDeactivated(id)).await;
            return Ok(DeleteOutcome::Deactivated);
        }

        let txn = self.db.begin().await?;
        crate::entities::inventory_transaction::Entity::delete_many()
            .filter(crate::entities::inventory_transaction::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        self.events.send_or_log(Event::ProductDeleted(id)).await;
        Ok(DeleteOutcome::Removed)
    }

    /// Applies a manual stock movement and records it in the ledger.
    /// Returns the updated product.
    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        id: Uuid,
        kind: MovementKind,
        quantity: i32,
        reason: Option<String>,
        user_id: Uuid,
    ) -> Result<product::Model, ServiceError> {
        if kind == MovementKind::Venda {
            return Err(ServiceError::ValidationError(
                "sale movements are created by the sale workflow".to_string(),
            ));
        }
        if quantity < 0 || (quantity == 0 && kind != MovementKind::Ajuste) {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let existing = product::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("product not found".to_string()))?;

        let previous_stock = existing.stock;
        let new_stock = match kind {
            MovementKind::Entrada => previous_stock + quantity,
            MovementKind::Saida => {
                let remaining = previous_stock - quantity;
                if remaining < 0 {
                    return Err(ServiceError::InsufficientStock(format!(
                        "insufficient stock for {}. Available: {}",
                        existing.name, previous_stock
                    )));
                }
                remaining
            }
            // Ajuste sets the absolute stock level.
            MovementKind::Ajuste => quantity,
            MovementKind::Venda => unreachable!(),
        };

        inventory::record_movement(
            &txn,
            Movement {
                product_id: id,
                kind,
                quantity: match kind {
                    MovementKind::Entrada => quantity,
                    MovementKind::Saida => -quantity,
                    _ => new_stock - previous_stock,
                },
                previous_stock,
                new_stock,
                cost_price: Some(existing.cost_price),
                reason: reason.or_else(|| Some(format!("stock movement: {}", kind.as_str()))),
                reference: None,
                user_id,
            },
        )
        .await?;

        let min_stock = existing.min_stock;
        let mut model: product::ActiveModel = existing.into();
        model.stock = Set(new_stock);
        let updated = model.update(&txn).await?;

        txn.commit().await?;

        self.events
            .send_or_log(Event::StockAdjusted {
                product_id: id,
                previous_stock,
                new_stock,
            })
            .await;
        if new_stock <= min_stock {
            self.events
                .send_or_log(Event::LowStock {
                    product_id: id,
                    stock: new_stock,
                    min_stock,
                })
                .await;
        }

        Ok(updated)
    }

    /// Active products at or below their minimum stock, lowest first.
    pub async fn low_stock_products(&self) -> Result<Vec<product::Model>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .filter(Expr::col(product::Column::Stock).lte(Expr::col(product::Column::MinStock)))
            .order_by_asc(product::Column::Stock)
            .all(&*self.db)
            .await?;
        Ok(products)
    }

    /// Number of active products per category, sorted by label.
    pub async fn categories_summary(&self) -> Result<Vec<CategoryCount>, ServiceError> {
        let rows: Vec<(ProductCategory, i64)> = product::Entity::find()
            .filter(product::Column::IsActive.eq(true))
            .select_only()
            .column(product::Column::Category)
            .column_as(product::Column::Id.count(), "count")
            .group_by(product::Column::Category)
            .into_tuple()
            .all(&*self.db)
            .await?;

        let mut summary: Vec<CategoryCount> = rows
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect();
        summary.sort_by(|a, b| a.category.as_str().cmp(b.category.as_str()));
        Ok(summary)
    }

    /// Appends an image URL, or replaces the one at `index` when given.
    /// An out-of-range index appends.
    pub async fn add_image(
        &self,
        id: Uuid,
        image_url: String,
        index: Option<usize>,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut images = existing.image_list();

        match index {
            Some(i) if i < images.len() => images[i] = image_url,
            _ => images.push(image_url),
        }

        self.store_images(existing, images).await
    }

    /// Removes the image at `index`.
    pub async fn remove_image(&self, id: Uuid, index: usize) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let mut images = existing.image_list();

        if index >= images.len() {
            return Err(ServiceError::NotFound("image not found".to_string()));
        }
        images.remove(index);

        self.store_images(existing, images).await
    }

    /// Reorders images by a permutation of current indices: `order[i]`
    /// names the current index of the image that should land at position
    /// `i`. The permutation must cover every image exactly once.
    pub async fn reorder_images(
        &self,
        id: Uuid,
        order: Vec<usize>,
    ) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        let images = existing.image_list();

        if images.is_empty() {
            return Err(ServiceError::ValidationError(
                "product has no images".to_string(),
            ));
        }
        if order.len() != images.len() {
            return Err(ServiceError::ValidationError(
                "order must list every image index exactly once".to_string(),
            ));
        }
        let mut seen = vec![false; images.len()];
        for &i in &order {
            if i >= images.len() || seen[i] {
                return Err(ServiceError::ValidationError(
                    "order must list every image index exactly once".to_string(),
                ));
            }
            seen[i] = true;
        }

        let reordered: Vec<String> = order.into_iter().map(|i| images[i].clone()).collect();
        self.store_images(existing, reordered).await
    }

    async fn store_images(
        &self,
        existing: product::Model,
        images: Vec<String>,
    ) -> Result<product::Model, ServiceError> {
        let id = existing.id;
        let mut model: product::ActiveModel = existing.into();
        model.images = Set(serde_json::json!(images));
        let updated = model.update(&*self.db).await?;
        self.events.send_or_log(Event::ProductUpdated(id)).await;
        Ok(updated)
    }

    /// Renders the sharable price list of in-stock active products,
    /// grouped by category.
    pub async fn price_table(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<String, ServiceError> {
        let mut condition = Condition::all()
            .add(product::Column::IsActive.eq(true))
            .add(product::Column::Stock.gt(0));
        if let Some(category) = category {
            condition = condition.add(product::Column::Category.eq(category));
        }

        let products = product::Entity::find()
            .filter(condition)
            .order_by_asc(product::Column::Category)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(render_price_table(&products))
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryCount {
    pub category: ProductCategory,
    pub count: i64,
}

fn category_emoji(category: ProductCategory) -> &'static str {
    match category {
        ProductCategory::Essencias => "💨",
        ProductCategory::Tabaco => "🚬",
        ProductCategory::Acessorios => "🔧",
        ProductCategory::Narguiles => "💭",
        ProductCategory::Carvao => "🔥",
        ProductCategory::Bebidas => "🥤",
        ProductCategory::Pod => "🔥",
        ProductCategory::Outros => "🎁",
    }
}

fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let s = format!("{:.2}", rounded);
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let (neg, digits) = match int_part.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, int_part),
    };

    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!(
        "{}R$ {},{}",
        if neg { "-" } else { "" },
        grouped,
        frac_part
    )
}

/// Builds the WhatsApp-style price table text.
pub fn render_price_table(products: &[product::Model]) -> String {
    if products.is_empty() {
        return "Nenhum produto disponível no momento".to_string();
    }

    // Keep category order of first appearance (products arrive sorted).
    let mut categories: Vec<ProductCategory> = Vec::new();
    for p in products {
        if !categories.contains(&p.category) {
            categories.push(p.category);
        }
    }

    let mut table = String::new();
    for category in categories {
        let emoji = category_emoji(category);
        table.push_str(&format!(
            "\n━━━━━━━━━\n{} *{}* {}\n━━━━━━━━━\n\n",
            emoji,
            category.as_str().to_uppercase(),
            emoji
        ));

        for product in products.iter().filter(|p| p.category == category) {
            table.push_str(&format!(
                "*{}:* *{}*\n",
                product.name.to_uppercase(),
                format_brl(product.price)
            ));

            let flavors = product.flavor_list();
            if matches!(category, ProductCategory::Pod | ProductCategory::Essencias)
                && !flavors.is_empty()
            {
                table.push_str("_Sabores disponíveis:_\n\n");
                for flavor in &flavors {
                    table.push_str(&format!("   • *{}*\n", flavor));
                }
            }

            if product.is_low_stock() {
                table.push_str("⚠️ *Últimas unidades!* ⚠️\n");
            }
            table.push('\n');
        }
    }

    table.push_str("\n━━━━━━━━━\n");
    table.push_str("💬 *Avise qual tiver interesse!*\n");
    table.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_product(name: &str, category: ProductCategory, price: Decimal) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category,
            price,
            cost_price: dec!(1),
            stock: 10,
            min_stock: 2,
            barcode: None,
            supplier_id: None,
            expiry_date: None,
            is_active: true,
            images: serde_json::json!([]),
            flavors: serde_json::json!(["Menta", "Uva"]),
            attributes: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn brl_formatting_uses_comma_decimals_and_dot_grouping() {
        assert_eq!(format_brl(dec!(15)), "R$ 15,00");
        assert_eq!(format_brl(dec!(1234.5)), "R$ 1.234,50");
        assert_eq!(format_brl(dec!(1234567.89)), "R$ 1.234.567,89");
    }

    #[test]
    fn price_table_handles_empty_catalog() {
        assert_eq!(
            render_price_table(&[]),
            "Nenhum produto disponível no momento"
        );
    }

    #[test]
    fn price_table_groups_by_category_and_lists_flavors() {
        let products = vec![
            sample_product("Zomo Mint", ProductCategory::Essencias, dec!(15)),
            sample_product("Carvão Coco", ProductCategory::Carvao, dec!(12.5)),
        ];
        let table = render_price_table(&products);
        assert!(table.contains("*ESSÊNCIAS*"));
        assert!(table.contains("*ZOMO MINT:* *R$ 15,00*"));
        assert!(table.contains("• *Menta*"));
        assert!(table.contains("*CARVÃO*"));
        // Flavors only render for essências and pods.
        let carvao_section = table.split("*CARVÃO*").nth(1).unwrap();
        assert!(!carvao_section.contains("Sabores"));
    }
}
