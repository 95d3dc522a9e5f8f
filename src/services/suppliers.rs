use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product::{self, ProductCategory};
use crate::entities::supplier::{self, Address, ContactPerson};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{DeleteOutcome, Page};

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub company_name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub contact_person: Option<ContactPerson>,
    pub categories: Vec<ProductCategory>,
    pub payment_terms: Option<String>,
    pub min_order_value: Option<Decimal>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SupplierPatch {
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub contact_person: Option<ContactPerson>,
    pub categories: Option<Vec<ProductCategory>>,
    pub payment_terms: Option<String>,
    pub min_order_value: Option<Decimal>,
    pub observations: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SupplierFilter {
    pub keyword: Option<String>,
    pub category: Option<ProductCategory>,
    pub is_active: Option<bool>,
    pub page: u64,
    pub limit: u64,
}

/// Active-supplier count per product category.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SupplierCategoryCount {
    pub category: ProductCategory,
    pub count: u64,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
    events: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>, events: Arc<EventSender>) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(
        &self,
        input: NewSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        if let Some(document) = input.document.as_deref() {
            self.ensure_document_free(document, None).await?;
        }

        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            company_name: Set(input.company_name),
            document: Set(input.document),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(serde_json::to_value(input.address.unwrap_or_default())
                .unwrap_or(serde_json::Value::Null)),
            contact_person: Set(serde_json::to_value(
                input.contact_person.unwrap_or_default(),
            )
            .unwrap_or(serde_json::Value::Null)),
            categories: Set(category_labels(&input.categories)),
            payment_terms: Set(input.payment_terms),
            min_order_value: Set(input.min_order_value.unwrap_or(Decimal::ZERO)),
            observations: Set(input.observations),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        info!(supplier_id = %created.id, "Supplier created");
        self.events
            .send_or_log(Event::SupplierCreated(created.id))
            .await;
        Ok(created)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("supplier not found".to_string()))
    }

    /// Lists suppliers ordered by name. A keyword matches name, company
    /// name, email or document; a category matches the supplier's
    /// category list.
    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        filter: SupplierFilter,
    ) -> Result<Page<supplier::Model>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(keyword) = filter.keyword.as_deref() {
            let pattern = format!("%{}%", keyword);
            condition = condition.add(
                Condition::any()
                    .add(supplier::Column::Name.like(&pattern))
                    .add(supplier::Column::CompanyName.like(&pattern))
                    .add(supplier::Column::Email.like(&pattern))
                    .add(supplier::Column::Document.like(&pattern)),
            );
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(supplier::Column::IsActive.eq(is_active));
        }

        let query = supplier::Entity::find().filter(condition);

        // The category list lives in a JSON column, so that filter (and
        // the pagination over it) is applied in memory over the
        // condition-filtered set.
        if let Some(category) = filter.category {
            let label = category.as_str();
            let mut matching: Vec<supplier::Model> = query
                .order_by_asc(supplier::Column::Name)
                .all(&*self.db)
                .await?;
            matching.retain(|s| supplier_covers(s, label));
            let total = matching.len() as u64;
            let items = matching
                .into_iter()
                .skip((filter.limit.saturating_mul(filter.page.saturating_sub(1))) as usize)
                .take(filter.limit as usize)
                .collect();
            return Ok(Page { items, total });
        }

        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(supplier::Column::Name)
            .offset(filter.limit.saturating_mul(filter.page.saturating_sub(1)))
            .limit(filter.limit)
            .all(&*self.db)
            .await?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self, patch))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        patch: SupplierPatch,
    ) -> Result<supplier::Model, ServiceError> {
        let existing = self.get_supplier(id).await?;

        if let Some(document) = patch.document.as_deref() {
            self.ensure_document_free(document, Some(id)).await?;
        }

        let mut model: supplier::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(company_name) = patch.company_name {
            model.company_name = Set(Some(company_name));
        }
        if let Some(document) = patch.document {
            model.document = Set(Some(document));
        }
        if let Some(email) = patch.email {
            model.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            model.phone = Set(Some(phone));
        }
        if let Some(address) = patch.address {
            model.address =
                Set(serde_json::to_value(address).unwrap_or(serde_json::Value::Null));
        }
        if let Some(contact_person) = patch.contact_person {
            model.contact_person =
                Set(serde_json::to_value(contact_person).unwrap_or(serde_json::Value::Null));
        }
        if let Some(categories) = patch.categories {
            model.categories = Set(category_labels(&categories));
        }
        if let Some(payment_terms) = patch.payment_terms {
            model.payment_terms = Set(Some(payment_terms));
        }
        if let Some(min_order_value) = patch.min_order_value {
            model.min_order_value = Set(min_order_value);
        }
        if let Some(observations) = patch.observations {
            model.observations = Set(Some(observations));
        }
        if let Some(is_active) = patch.is_active {
            model.is_active = Set(is_active);
        }
        let updated = model.update(&*self.db).await?;

        self.events
            .send_or_log(Event::SupplierUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a supplier, or deactivates it when products still point
    /// at it.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let existing = self.get_supplier(id).await?;

        let products = product::Entity::find()
            .filter(product::Column::SupplierId.eq(id))
            .count(&*self.db)
            .await?;

        if products > 0 {
            let mut model: supplier::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(&*self.db).await?;

            info!(supplier_id = %id, products, "Supplier has products, deactivated instead of deleted");
            self.events
                .send_or_log(Event::SupplierDeactivated(id))
                .await;
            return Ok(DeleteOutcome::Deactivated);
        }

        existing.delete(&*self.db).await?;
        info!(supplier_id = %id, "Supplier deleted");
        self.events.send_or_log(Event::SupplierDeleted(id)).await;
        Ok(DeleteOutcome::Removed)
    }

    /// Paginated catalog of one supplier's products, ordered by name.
    pub async fn supplier_products(
        &self,
        id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<Page<product::Model>, ServiceError> {
        self.get_supplier(id).await?;

        let query = product::Entity::find().filter(product::Column::SupplierId.eq(id));
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(product::Column::Name)
            .offset(limit.saturating_mul(page.saturating_sub(1)))
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok(Page { items, total })
    }

    /// Active-supplier counts across every product category, including
    /// categories no supplier covers.
    #[instrument(skip(self))]
    pub async fn suppliers_by_category(
        &self,
    ) -> Result<Vec<SupplierCategoryCount>, ServiceError> {
        let active = supplier::Entity::find()
            .filter(supplier::Column::IsActive.eq(true))
            .all(&*self.db)
            .await?;

        use sea_orm::Iterable;
        let mut result = Vec::new();
        for category in ProductCategory::iter() {
            let label = category.as_str();
            let count = active.iter().filter(|s| supplier_covers(s, label)).count() as u64;
            result.push(SupplierCategoryCount { category, count });
        }
        Ok(result)
    }

    async fn ensure_document_free(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut condition = Condition::all().add(supplier::Column::Document.eq(document));
        if let Some(id) = exclude {
            condition = condition.add(supplier::Column::Id.ne(id));
        }
        let clash = supplier::Entity::find()
            .filter(condition)
            .count(&*self.db)
            .await?;
        if clash > 0 {
            return Err(ServiceError::Conflict(
                "a supplier with this document already exists".to_string(),
            ));
        }
        Ok(())
    }
}

fn category_labels(categories: &[ProductCategory]) -> serde_json::Value {
    serde_json::Value::Array(
        categories
            .iter()
            .map(|c| serde_json::Value::String(c.as_str().to_string()))
            .collect(),
    )
}

fn supplier_covers(supplier: &supplier::Model, label: &str) -> bool {
    supplier
        .categories
        .as_array()
        .map(|list| list.iter().any(|v| v.as_str() == Some(label)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supplier_with_categories(value: serde_json::Value) -> supplier::Model {
        supplier::Model {
            id: Uuid::new_v4(),
            name: "Fumaça Fina".to_string(),
            company_name: None,
            document: None,
            email: None,
            phone: None,
            address: serde_json::Value::Null,
            contact_person: serde_json::Value::Null,
            categories: value,
            payment_terms: None,
            min_order_value: Decimal::ZERO,
            observations: None,
            is_active: true,
            last_purchase: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn category_match_reads_json_labels() {
        let supplier = supplier_with_categories(serde_json::json!(["Tabaco", "Carvão"]));
        assert!(supplier_covers(&supplier, "Tabaco"));
        assert!(supplier_covers(&supplier, "Carvão"));
        assert!(!supplier_covers(&supplier, "Pod"));
    }

    #[test]
    fn category_match_tolerates_malformed_column() {
        let supplier = supplier_with_categories(serde_json::Value::Null);
        assert!(!supplier_covers(&supplier, "Tabaco"));
    }
}
