use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::client::{self, Address};
use crate::entities::product::ProductCategory;
use crate::entities::sale::{self, PaymentStatus};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::{DeleteOutcome, Page};

#[derive(Debug, Clone)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub document: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub favorite_category: Option<ProductCategory>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    pub document: Option<String>,
    pub birthday: Option<DateTime<Utc>>,
    pub observations: Option<String>,
    pub favorite_category: Option<ProductCategory>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub page: u64,
    pub limit: u64,
}

/// Direction of a manual loyalty adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyOp {
    Add,
    Remove,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct TopClient {
    pub client_id: Uuid,
    pub name: String,
    pub total_spent: Decimal,
    pub order_count: u64,
    pub last_purchase: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbPool>,
    events: Arc<EventSender>,
}

impl ClientService {
    pub fn new(db: Arc<DbPool>, events: Arc<EventSender>) -> Self {
        Self { db, events }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_client(&self, input: NewClient) -> Result<client::Model, ServiceError> {
        if let Some(document) = input.document.as_deref() {
            self.ensure_document_free(document, None).await?;
        }
        if let Some(email) = input.email.as_deref() {
            self.ensure_email_free(email, None).await?;
        }

        let model = client::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(serde_json::to_value(input.address.unwrap_or_default())
                .unwrap_or(serde_json::Value::Null)),
            document: Set(input.document),
            birthday: Set(input.birthday),
            observations: Set(input.observations),
            favorite_category: Set(input.favorite_category),
            favorite_products: Set(serde_json::json!([])),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        info!(client_id = %created.id, "Client created");
        self.events
            .send_or_log(Event::ClientCreated(created.id))
            .await;
        Ok(created)
    }

    pub async fn get_client(&self, id: Uuid) -> Result<client::Model, ServiceError> {
        client::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("client not found".to_string()))
    }

    /// Lists clients ordered by name. A keyword matches name, email,
    /// phone or document.
    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        filter: ClientFilter,
    ) -> Result<Page<client::Model>, ServiceError> {
        let mut condition = Condition::all();
        if let Some(keyword) = filter.keyword.as_deref() {
            let pattern = format!("%{}%", keyword);
            condition = condition.add(
                Condition::any()
                    .add(client::Column::Name.like(&pattern))
                    .add(client::Column::Email.like(&pattern))
                    .add(client::Column::Phone.like(&pattern))
                    .add(client::Column::Document.like(&pattern)),
            );
        }
        if let Some(is_active) = filter.is_active {
            condition = condition.add(client::Column::IsActive.eq(is_active));
        }

        let query = client::Entity::find().filter(condition);
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(client::Column::Name)
            .offset(filter.limit.saturating_mul(filter.page.saturating_sub(1)))
            .limit(filter.limit)
            .all(&*self.db)
            .await?;

        Ok(Page { items, total })
    }

    #[instrument(skip(self, patch))]
    pub async fn update_client(
        &self,
        id: Uuid,
        patch: ClientPatch,
    ) -> Result<client::Model, ServiceError> {
        let existing = self.get_client(id).await?;

        if let Some(document) = patch.document.as_deref() {
            self.ensure_document_free(document, Some(id)).await?;
        }
        if let Some(email) = patch.email.as_deref() {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let mut model: client::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            model.name = Set(name);
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
        if let Some(document) = patch.document {
            model.document = Set(Some(document));
        }
        if let Some(birthday) = patch.birthday {
            model.birthday = Set(Some(birthday));
        }
        if let Some(observations) = patch.observations {
            model.observations = Set(Some(observations));
        }
        if let Some(favorite_category) = patch.favorite_category {
            model.favorite_category = Set(Some(favorite_category));
        }
        if let Some(is_active) = patch.is_active {
            model.is_active = Set(is_active);
        }
        let updated = model.update(&*self.db).await?;

        self.events
            .send_or_log(Event::ClientUpdated(updated.id))
            .await;
        Ok(updated)
    }

    /// Deletes a client, or deactivates it when sales reference it so
    /// history keeps the name.
    #[instrument(skip(self))]
    pub async fn delete_client(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let existing = self.get_client(id).await?;

        let sales = sale::Entity::find()
            .filter(sale::Column::ClientId.eq(id))
            .count(&*self.db)
            .await?;

        if sales > 0 {
            let mut model: client::ActiveModel = existing.into();
            model.is_active = Set(false);
            model.update(&*self.db).await?;

            info!(client_id = %id, sales, "Client has sales, deactivated instead of deleted");
            self.events.send_or_log(Event::ClientDeactivated(id)).await;
            return Ok(DeleteOutcome::Deactivated);
        }

        existing.delete(&*self.db).await?;
        info!(client_id = %id, "Client deleted");
        self.events.send_or_log(Event::ClientDeleted(id)).await;
        Ok(DeleteOutcome::Removed)
    }

    /// Paginated purchase history for one client, newest first, plus
    /// the sum spent over the whole history.
    pub async fn client_sales(
        &self,
        id: Uuid,
        page: u64,
        limit: u64,
    ) -> Result<(Page<sale::Model>, Decimal), ServiceError> {
        self.get_client(id).await?;

        let query = sale::Entity::find().filter(sale::Column::ClientId.eq(id));
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .clone()
            .order_by_desc(sale::Column::CreatedAt)
            .offset(limit.saturating_mul(page.saturating_sub(1)))
            .limit(limit)
            .all(&*self.db)
            .await?;

        let totals: Vec<Decimal> = query
            .select_only()
            .column(sale::Column::Total)
            .into_tuple()
            .all(&*self.db)
            .await?;
        let total_purchased = totals.into_iter().sum();

        Ok((Page { items, total }, total_purchased))
    }

    /// Manual loyalty adjustment. Removing more points than the client
    /// has is an error.
    #[instrument(skip(self))]
    pub async fn update_loyalty(
        &self,
        id: Uuid,
        points: i32,
        op: LoyaltyOp,
    ) -> Result<client::Model, ServiceError> {
        if points <= 0 {
            return Err(ServiceError::ValidationError(
                "points must be a positive number".to_string(),
            ));
        }

        let existing = self.get_client(id).await?;

        let new_points = match op {
            LoyaltyOp::Add => existing.loyalty_points + points,
            LoyaltyOp::Remove => {
                if existing.loyalty_points < points {
                    return Err(ServiceError::ValidationError(
                        "client does not have enough points".to_string(),
                    ));
                }
                existing.loyalty_points - points
            }
        };

        let mut model: client::ActiveModel = existing.into();
        model.loyalty_points = Set(new_points);
        let updated = model.update(&*self.db).await?;

        self.events
            .send_or_log(Event::LoyaltyPointsChanged {
                client_id: id,
                points: new_points,
            })
            .await;
        Ok(updated)
    }

    /// Clients ranked by total spent on non-cancelled sales.
    #[instrument(skip(self))]
    pub async fn top_clients(&self, limit: usize) -> Result<Vec<TopClient>, ServiceError> {
        let rows: Vec<(Option<Uuid>, Decimal, DateTime<Utc>)> = sale::Entity::find()
            .filter(sale::Column::PaymentStatus.ne(PaymentStatus::Cancelado))
            .filter(sale::Column::ClientId.is_not_null())
            .select_only()
            .column(sale::Column::ClientId)
            .column(sale::Column::Total)
            .column(sale::Column::CreatedAt)
            .into_tuple()
            .all(&*self.db)
            .await?;

        struct Acc {
            spent: Decimal,
            orders: u64,
            last: DateTime<Utc>,
        }
        let mut by_client: HashMap<Uuid, Acc> = HashMap::new();
        for (client_id, total, created_at) in rows {
            let Some(client_id) = client_id else { continue };
            let entry = by_client.entry(client_id).or_insert_with(|| Acc {
                spent: Decimal::ZERO,
                orders: 0,
                last: created_at,
            });
            entry.spent += total;
            entry.orders += 1;
            if created_at > entry.last {
                entry.last = created_at;
            }
        }

        let mut ranked: Vec<(Uuid, Acc)> = by_client.into_iter().collect();
        ranked.sort_by(|a, b| b.1.spent.cmp(&a.1.spent));
        ranked.truncate(limit);

        let mut result = Vec::with_capacity(ranked.len());
        for (client_id, acc) in ranked {
            let Some(found) = client::Entity::find_by_id(client_id).one(&*self.db).await? else {
                continue;
            };
            result.push(TopClient {
                client_id,
                name: found.name,
                total_spent: acc.spent,
                order_count: acc.orders,
                last_purchase: Some(acc.last),
            });
        }
        Ok(result)
    }

    async fn ensure_document_free(
        &self,
        document: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut condition = Condition::all().add(client::Column::Document.eq(document));
        if let Some(id) = exclude {
            condition = condition.add(client::Column::Id.ne(id));
        }
        let clash = client::Entity::find()
            .filter(condition)
            .count(&*self.db)
            .await?;
        if clash > 0 {
            return Err(ServiceError::Conflict(
                "a client with this document already exists".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut condition = Condition::all().add(client::Column::Email.eq(email));
        if let Some(id) = exclude {
            condition = condition.add(client::Column::Id.ne(id));
        }
        let clash = client::Entity::find()
            .filter(condition)
            .count(&*self.db)
            .await?;
        if clash > 0 {
            return Err(ServiceError::Conflict(
                "a client with this email already exists".to_string(),
            ));
        }
        Ok(())
    }
}
