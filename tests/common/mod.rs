use std::sync::Arc;

use axum::{routing::get, Router};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tabacaria_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::{client, product, user},
    events,
    services::products::NewProduct,
    AppState,
};
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Test harness over an in-memory SQLite database with migrations
/// applied. The pool is pinned to a single connection so every query
/// sees the same in-memory database.
pub struct TestApp {
    pub state: AppState,
    pub admin: user::Model,
    pub admin_token: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to open test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations");
        let pool = Arc::new(pool);

        let (event_sender, event_rx) = events::create_event_channel(64);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth = Arc::new(AuthService::new(AuthConfig::from_app_config(&cfg)));
        let state = AppState::new(pool, Arc::new(cfg), auth.clone(), Arc::new(event_sender));

        let admin = seed_user(&state, "Admin", "admin@tabacaria.test", true).await;
        let admin_token = auth.generate_token(&admin).expect("failed to issue token");

        Self {
            state,
            admin,
            admin_token,
            _event_task: event_task,
        }
    }

    /// Full application router, as served by the binary.
    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        let auth = self.state.auth.clone();
        let db = self.state.db.clone();
        Router::new()
            .route("/health", get(tabacaria_api::health))
            .nest("/api", tabacaria_api::api_routes())
            .layer(axum::middleware::from_fn_with_state(
                (auth, db),
                |axum::extract::State((auth, db)): axum::extract::State<(
                    Arc<AuthService>,
                    Arc<tabacaria_api::db::DbPool>,
                )>,
                 mut req: axum::http::Request<axum::body::Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    req.extensions_mut().insert(db);
                    next.run(req).await
                },
            ))
            .with_state(self.state.clone())
    }
}

pub async fn seed_user(state: &AppState, name: &str, email: &str, is_admin: bool) -> user::Model {
    let hash = state
        .auth
        .hash_password("secret-password")
        .expect("failed to hash password");
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash),
        is_admin: Set(is_admin),
        phone: Set(None),
        last_login: Set(None),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .expect("failed to seed user")
}

#[allow(dead_code)]
pub async fn seed_product(
    app: &TestApp,
    name: &str,
    price: Decimal,
    cost: Decimal,
    stock: i32,
) -> product::Model {
    app.state
        .products
        .create_product(
            NewProduct {
                name: name.to_string(),
                description: None,
                category: product::ProductCategory::Essencias,
                price,
                cost_price: cost,
                stock,
                min_stock: Some(2),
                barcode: None,
                supplier_id: None,
                expiry_date: None,
                images: vec![],
                flavors: vec![],
                attributes: Default::default(),
            },
            app.admin.id,
        )
        .await
        .expect("failed to seed product")
}

#[allow(dead_code)]
pub async fn seed_client(app: &TestApp, name: &str) -> client::Model {
    app.state
        .clients
        .create_client(tabacaria_api::services::clients::NewClient {
            name: name.to_string(),
            email: None,
            phone: None,
            address: None,
            document: None,
            birthday: None,
            observations: None,
            favorite_category: None,
        })
        .await
        .expect("failed to seed client")
}
