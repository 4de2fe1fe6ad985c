use super::{pick_latest, PermissionStore, SidebarConfigStore};
use crate::entitys::permission_entity::PermissionSet;
use crate::entitys::role_entity::RoleEnum;
use crate::entitys::sidebar_entity::{ConfigScope, SidebarConfigEntity, SidebarConfigQueryDto};
use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::util::date_util::now;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// 进程内菜单配置存储，重启即丢失
#[derive(Debug, Default)]
pub struct MemorySidebarConfigStore {
    configs: DashMap<String, SidebarConfigEntity>,
}

impl MemorySidebarConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

#[async_trait]
impl SidebarConfigStore for MemorySidebarConfigStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SidebarConfigEntity>> {
        Ok(self.configs.get(id).map(|c| c.value().clone()))
    }

    async fn find_override(&self, user_id: &str, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
        let found = self.configs.iter().find(|c| {
            c.scope == ConfigScope::UserOverride && c.role == role && c.user_id.as_deref() == Some(user_id)
        });
        Ok(found.map(|c| c.value().clone()))
    }

    async fn find_default(&self, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
        let defaults: Vec<SidebarConfigEntity> =
            self.configs.iter().filter(|c| c.role == role && c.is_default).map(|c| c.value().clone()).collect();
        Ok(pick_latest(defaults))
    }

    async fn list(&self, query: &SidebarConfigQueryDto) -> AppResult<Vec<SidebarConfigEntity>> {
        let mut configs: Vec<SidebarConfigEntity> =
            self.configs.iter().filter(|c| query.matches(c.value())).map(|c| c.value().clone()).collect();
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(configs)
    }

    async fn insert_if_absent(&self, mut config: SidebarConfigEntity) -> AppResult<SidebarConfigEntity> {
        let stored = self.configs.entry(config.id.clone()).or_insert_with(|| {
            config.version = 1;
            config
        });
        Ok(stored.value().clone())
    }

    async fn save(&self, mut config: SidebarConfigEntity, expected_version: i64) -> AppResult<SidebarConfigEntity> {
        match self.configs.entry(config.id.clone()) {
            Entry::Vacant(slot) => {
                if expected_version != 0 {
                    return Err(AppError::NotFound(format!("sidebar config {}", config.id)));
                }
                config.version = 1;
                slot.insert(config.clone());
                Ok(config)
            }
            Entry::Occupied(mut slot) => {
                let current = slot.get().version;
                if current != expected_version {
                    return Err(AppError::Conflict(format!(
                        "sidebar config {} is at version {}, not {}",
                        config.id, current, expected_version
                    )));
                }
                config.version = current + 1;
                slot.insert(config.clone());
                Ok(config)
            }
        }
    }

    async fn clear_default_flag(&self, role: RoleEnum, keep_id: &str) -> AppResult<u64> {
        let mut changed = 0;
        for mut config in self.configs.iter_mut() {
            if config.role == role && config.is_default && config.id != keep_id {
                config.is_default = false;
                config.version += 1;
                config.update_time = now();
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.configs.remove(id).is_some())
    }
}

#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    permissions: DashMap<String, PermissionSet>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn load(&self, user_id: &str) -> AppResult<PermissionSet> {
        Ok(self.permissions.get(user_id).map(|p| p.value().clone()).unwrap_or_default())
    }

    async fn store(&self, user_id: &str, permissions: &PermissionSet) -> AppResult<()> {
        self.permissions.insert(user_id.to_string(), permissions.clone());
        Ok(())
    }
}
