use crate::biz_service::permission_service::PermissionService;
use crate::biz_service::sidebar_service::SidebarService;
use crate::store::{
    MemoryPermissionStore, MemorySidebarConfigStore, MongoPermissionStore, MongoSidebarConfigStore, PermissionStore,
    SidebarConfigStore,
};
use common::config::{AppConfig, CacheConfig};
use common::db::Db;
use log::{info, warn};
use std::sync::Arc;

pub mod biz_service;
pub mod entitys;
pub mod manager;
pub mod store;
pub mod util;

/// 对外暴露的业务服务集合
#[derive(Clone)]
pub struct Services {
    pub sidebar: Arc<SidebarService>,
    pub permission: Arc<PermissionService>,
}

impl Services {
    pub fn new(configs: Arc<dyn SidebarConfigStore>, permissions: Arc<dyn PermissionStore>, cache: &CacheConfig) -> Self {
        let permission = Arc::new(PermissionService::new(permissions));
        let sidebar = Arc::new(SidebarService::new(configs, permission.clone(), cache));
        Self { sidebar, permission }
    }

    /// 进程内存储，用于测试和本地运行
    pub fn in_memory(cache: &CacheConfig) -> Self {
        Self::new(Arc::new(MemorySidebarConfigStore::new()), Arc::new(MemoryPermissionStore::new()), cache)
    }
}

/// 按配置初始化存储与业务服务
pub async fn init_service(config: &AppConfig) -> anyhow::Result<Services> {
    let database = config.get_database();
    let cache = config.get_cache();
    if database.is_memory() {
        warn!("database.url is \"memory\", sidebar configs and permissions are not persisted");
        return Ok(Services::in_memory(&cache));
    }

    let db = Db::connect(&database).await?;
    let configs = MongoSidebarConfigStore::new(&db);
    configs.ensure_indexes().await.map_err(|e| anyhow::anyhow!("sidebar_config indexes: {}", e))?;
    info!("connected to MongoDB database {}", database.db_name);
    Ok(Services::new(Arc::new(configs), Arc::new(MongoPermissionStore::new(&db)), &cache))
}
