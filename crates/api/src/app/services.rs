use std::sync::Arc;

use wms_infra::store::{
    HubStore, InMemoryWarehouseStore, InventoryStore, PostgresWarehouseStore, SkuStore, StoreError,
};
use wms_infra::{AdjustPolicy, AppConfig, InventoryAdjuster, ReferenceValidator};

/// Everything the handlers need, shared behind one `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub hubs: Arc<dyn HubStore>,
    pub skus: Arc<dyn SkuStore>,
    pub validator: ReferenceValidator,
    pub adjuster: InventoryAdjuster,
}

impl AppServices {
    /// Wire every service against one store implementing all three traits.
    pub fn from_store<S>(store: Arc<S>, policy: AdjustPolicy) -> Self
    where
        S: HubStore + SkuStore + InventoryStore + 'static,
    {
        let hubs: Arc<dyn HubStore> = store.clone();
        let skus: Arc<dyn SkuStore> = store.clone();
        let inventory: Arc<dyn InventoryStore> = store;

        Self {
            validator: ReferenceValidator::new(hubs.clone(), skus.clone()),
            adjuster: InventoryAdjuster::new(inventory, policy),
            hubs,
            skus,
        }
    }

    pub fn in_memory(policy: AdjustPolicy) -> Self {
        Self::from_store(Arc::new(InMemoryWarehouseStore::new()), policy)
    }
}

/// Build services from configuration: Postgres when a database is configured,
/// in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match &config.database {
        Some(db) => {
            let store = PostgresWarehouseStore::connect(&db.url, db.max_connections).await?;
            store.ensure_schema().await?;
            tracing::info!(max_connections = db.max_connections, "using postgres stores");
            Ok(AppServices::from_store(Arc::new(store), config.adjust_policy))
        }
        None => {
            tracing::warn!("USE_PERSISTENT_STORES not enabled; using in-memory stores");
            Ok(AppServices::in_memory(config.adjust_policy))
        }
    }
}
