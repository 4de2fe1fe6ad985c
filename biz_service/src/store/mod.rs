//! 菜单配置与员工权限的持久化接口。
//!
//! MongoDB 实现用于部署；内存实现用于测试以及 `database.url = "memory"` 的本地运行。
use crate::entitys::permission_entity::PermissionSet;
use crate::entitys::role_entity::RoleEnum;
use crate::entitys::sidebar_entity::{SidebarConfigEntity, SidebarConfigQueryDto};
use async_trait::async_trait;
use common::errors::AppResult;

pub mod memory_store;
pub mod mongo_store;

pub use memory_store::{MemoryPermissionStore, MemorySidebarConfigStore};
pub use mongo_store::{MongoPermissionStore, MongoSidebarConfigStore};

#[async_trait]
pub trait SidebarConfigStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SidebarConfigEntity>>;
    async fn find_override(&self, user_id: &str, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>>;
    async fn find_default(&self, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>>;
    async fn list(&self, query: &SidebarConfigQueryDto) -> AppResult<Vec<SidebarConfigEntity>>;
    /// 不存在时插入（版本号置 1），已存在则返回已有文档
    async fn insert_if_absent(&self, config: SidebarConfigEntity) -> AppResult<SidebarConfigEntity>;
    /// 存储中的版本号等于 `expected_version` 时写入并将版本号 +1；
    /// `expected_version` 为 0 表示新建，文档已存在时返回 Conflict
    async fn save(&self, config: SidebarConfigEntity, expected_version: i64) -> AppResult<SidebarConfigEntity>;
    /// 清除该角色下除 `keep_id` 之外的默认标记，返回受影响条数
    async fn clear_default_flag(&self, role: RoleEnum, keep_id: &str) -> AppResult<u64>;
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// 未开通或记录异常时返回空集合
    async fn load(&self, user_id: &str) -> AppResult<PermissionSet>;
    async fn store(&self, user_id: &str, permissions: &PermissionSet) -> AppResult<()>;
}

/// 多份默认配置并存（数据异常）时取最近更新的一份
pub(crate) fn pick_latest(mut configs: Vec<SidebarConfigEntity>) -> Option<SidebarConfigEntity> {
    configs.sort_by(|a, b| b.update_time.cmp(&a.update_time).then_with(|| a.id.cmp(&b.id)));
    configs.into_iter().next()
}
