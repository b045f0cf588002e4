use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Connect to the metadata database and bring its schema in line with the entities.
pub async fn init_db(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.url.to_owned());

    // Set connection pool options
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout())
        .acquire_timeout(config.connect_timeout())
        .sqlx_logging(true);
    if let Some(secs) = config.idle_timeout_secs {
        opt.idle_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = config.max_lifetime_secs {
        opt.max_lifetime(Duration::from_secs(secs));
    }

    let db = Database::connect(opt).await?;
    db.get_schema_registry("hopekcc_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}
