//! 服务器状态 - 持有所有服务的单例引用
//!
//! `ServerState` is the shared handle every HTTP/WS handler clones: the
//! orders manager, the collaborator services, and the realtime registries.
//! Cloning is shallow (everything is behind an `Arc`).

use std::sync::Arc;

use parking_lot::RwLock;
use shared::models::store_config::StoreConfig;

use crate::accounts::AccountService;
use crate::catalog::CatalogService;
use crate::core::Config;
use crate::orders::{OrderStorage, OrdersManager};
use crate::realtime::{ConnectionHub, PresenceRegistry};
use crate::vouchers::VoucherService;

#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<OrdersManager>,
    pub catalog: Arc<CatalogService>,
    pub vouchers: Arc<VoucherService>,
    pub accounts: Arc<AccountService>,
    pub store_config: Arc<RwLock<StoreConfig>>,
    pub presence: Arc<PresenceRegistry>,
    pub hub: Arc<ConnectionHub>,
}

impl ServerState {
    /// Initialize every service from the configuration
    pub fn initialize(config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let storage = OrderStorage::open(config.db_path())?;
        Ok(Self::with_storage(config, storage))
    }

    /// Assemble the state around an existing storage (tests use in-memory)
    pub fn with_storage(config: Config, storage: OrderStorage) -> Self {
        let catalog = Arc::new(CatalogService::new());
        let vouchers = Arc::new(VoucherService::new());
        let accounts = Arc::new(AccountService::new());
        let store_config = Arc::new(RwLock::new(StoreConfig::default()));
        let presence = Arc::new(PresenceRegistry::new());
        let hub = Arc::new(ConnectionHub::new());

        let manager = Arc::new(OrdersManager::new(
            storage,
            Arc::clone(&catalog),
            Arc::clone(&vouchers),
            Arc::clone(&accounts),
            Arc::clone(&store_config),
            config.timezone,
        ));

        Self {
            config,
            manager,
            catalog,
            vouchers,
            accounts,
            store_config,
            presence,
            hub,
        }
    }
}
