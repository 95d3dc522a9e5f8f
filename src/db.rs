use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool with default tuning.
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(database_url.to_string());
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .sqlx_logging(true);
    connect(opt).await
}

/// Establish DB pool using AppConfig tuning.
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let mut opt = ConnectOptions::new(cfg.database_url.clone());
    opt.max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect_timeout(Duration::from_secs(cfg.db_connect_timeout_secs))
        .sqlx_logging(!cfg.is_production());

    info!(
        max_connections = cfg.db_max_connections,
        "Connecting to database"
    );
    connect(opt).await
}

async fn connect(opt: ConnectOptions) -> Result<DbPool, ServiceError> {
    let pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;
    info!("Database connection pool established");
    Ok(pool)
}

/// Runs the embedded migrations to the latest version.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", start.elapsed()),
        Err(e) => error!(
            "Database migrations failed after {:?}: {}",
            start.elapsed(),
            e
        ),
    }
    result
}

/// Checks if the database connection is alive.
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    pool.ping().await.map_err(ServiceError::DatabaseError)
}
