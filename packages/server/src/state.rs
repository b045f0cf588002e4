use std::sync::Arc;

use hopekcc_common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::auth::{IdentityGate, JwtIdentityGate};
use crate::config::AppConfig;
use crate::coordinator::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub identity: Arc<dyn IdentityGate>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection, blob_store: Arc<dyn BlobStore>) -> Self {
        let coordinator = Coordinator::new(db, blob_store, config.storage.timeout());
        let identity = Arc::new(JwtIdentityGate::new(&config.auth));
        Self {
            coordinator,
            identity,
            config: Arc::new(config),
        }
    }
}
