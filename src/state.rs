use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, JwtAuthService, OrderService, SeaOrmCatalogService,
    SeaOrmOrderService, SeaOrmStatsService, StatsService,
};

/// Everything the request handlers share: the connection pool and the
/// domain services, built once at startup. No mutable state lives here.
#[derive(Clone)]
pub struct SharedState {
    pub config: Config,

    pub store: Store,

    pub catalog_service: Arc<dyn CatalogService>,

    pub order_service: Arc<dyn OrderService>,

    pub stats_service: Arc<dyn StatsService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let catalog_service =
            Arc::new(SeaOrmCatalogService::new(store.clone())) as Arc<dyn CatalogService>;
        let order_service =
            Arc::new(SeaOrmOrderService::new(store.clone())) as Arc<dyn OrderService>;
        let stats_service =
            Arc::new(SeaOrmStatsService::new(store.clone())) as Arc<dyn StatsService>;
        let auth_service = Arc::new(JwtAuthService::new(
            store.clone(),
            config.auth.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        Ok(Self {
            config,
            store,
            catalog_service,
            order_service,
            stats_service,
            auth_service,
        })
    }
}
