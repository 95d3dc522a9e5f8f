use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::Page;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub is_admin: bool,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_admin: Option<bool>,
    pub phone: Option<String>,
}

/// Successful login payload: user plus a fresh token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: user::Model,
    pub token: String,
}

#[derive(Clone)]
pub struct UserService {
    db: Arc<DbPool>,
    auth: Arc<AuthService>,
    events: Arc<EventSender>,
}

impl UserService {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>, events: Arc<EventSender>) -> Self {
        Self { db, auth, events }
    }

    /// Verifies credentials and issues a token. Failures are reported
    /// uniformly so the response never reveals whether the email exists.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, ServiceError> {
        let invalid = || ServiceError::AuthError("invalid email or password".to_string());

        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(invalid)?;

        if !self.auth.verify_password(password, &found.password_hash)? {
            warn!(user_id = %found.id, "Login rejected: bad password");
            return Err(invalid());
        }

        let mut model: user::ActiveModel = found.clone().into();
        model.last_login = Set(Some(Utc::now()));
        let updated = model.update(&*self.db).await?;

        let token = self.auth.generate_token(&updated)?;

        info!(user_id = %updated.id, "User logged in");
        self.events
            .send_or_log(Event::UserLoggedIn(updated.id))
            .await;
        Ok(AuthenticatedUser {
            user: updated,
            token,
        })
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        let clash = user::Entity::find()
            .filter(user::Column::Email.eq(input.email.as_str()))
            .count(&*self.db)
            .await?;
        if clash > 0 {
            return Err(ServiceError::Conflict(
                "a user with this email already exists".to_string(),
            ));
        }

        let password_hash = self.auth.hash_password(&input.password)?;
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            email: Set(input.email),
            password_hash: Set(password_hash),
            is_admin: Set(input.is_admin),
            phone: Set(input.phone),
            ..Default::default()
        };
        let created = model.insert(&*self.db).await?;

        info!(user_id = %created.id, "User registered");
        self.events
            .send_or_log(Event::UserRegistered(created.id))
            .await;
        Ok(created)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_string()))
    }

    pub async fn list_users(&self, page: u64, limit: u64) -> Result<Page<user::Model>, ServiceError> {
        let query = user::Entity::find();
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_asc(user::Column::Name)
            .offset(limit.saturating_mul(page.saturating_sub(1)))
            .limit(limit)
            .all(&*self.db)
            .await?;
        Ok(Page { items, total })
    }

    /// Applies a patch to a user. Changing the password rehashes it.
    #[instrument(skip(self, patch))]
    pub async fn update_user(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<user::Model, ServiceError> {
        let existing = self.get_user(id).await?;

        if let Some(email) = patch.email.as_deref() {
            let clash = user::Entity::find()
                .filter(
                    Condition::all()
                        .add(user::Column::Email.eq(email))
                        .add(user::Column::Id.ne(id)),
                )
                .count(&*self.db)
                .await?;
            if clash > 0 {
                return Err(ServiceError::Conflict(
                    "a user with this email already exists".to_string(),
                ));
            }
        }

        let mut model: user::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            model.name = Set(name);
        }
        if let Some(email) = patch.email {
            model.email = Set(email);
        }
        if let Some(password) = patch.password {
            model.password_hash = Set(self.auth.hash_password(&password)?);
        }
        if let Some(is_admin) = patch.is_admin {
            model.is_admin = Set(is_admin);
        }
        if let Some(phone) = patch.phone {
            model.phone = Set(Some(phone));
        }
        let updated = model.update(&*self.db).await?;

        self.events.send_or_log(Event::UserUpdated(updated.id)).await;
        Ok(updated)
    }

    /// Self-service profile update: name, email, phone and password
    /// only. Returns a fresh token since the claims may have changed.
    pub async fn update_profile(
        &self,
        id: Uuid,
        patch: UserPatch,
    ) -> Result<AuthenticatedUser, ServiceError> {
        let patch = UserPatch {
            is_admin: None,
            ..patch
        };
        let updated = self.update_user(id, patch).await?;
        let token = self.auth.generate_token(&updated)?;
        Ok(AuthenticatedUser {
            user: updated,
            token,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_user(id).await?;
        existing.delete(&*self.db).await?;

        info!(user_id = %id, "User deleted");
        self.events.send_or_log(Event::UserDeleted(id)).await;
        Ok(())
    }
}
