use crate::entitys::permission_entity::{PermissionSet, PERMISSION_CATALOG};
use crate::store::PermissionStore;
use common::errors::AppResult;
use log::info;
use std::sync::Arc;

pub struct PermissionService {
    store: Arc<dyn PermissionStore>,
}

impl PermissionService {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// 获取员工的权限集合（未开通返回空集合）
    pub async fn get_permissions(&self, user_id: &str) -> AppResult<PermissionSet> {
        self.store.load(user_id).await
    }

    /// 整体替换员工权限，权限点去空白、去重后保存
    pub async fn set_permissions(&self, user_id: &str, tokens: &[String]) -> AppResult<PermissionSet> {
        let permissions = PermissionSet::new(tokens);
        self.store.store(user_id, &permissions).await?;
        info!("permissions of {} set to {:?}", user_id, permissions.to_vec());
        Ok(permissions)
    }

    pub fn catalog(&self) -> Vec<String> {
        PERMISSION_CATALOG.iter().map(|p| p.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPermissionStore;

    #[tokio::test]
    async fn set_then_get_round_trips_normalized_tokens() {
        let service = PermissionService::new(Arc::new(MemoryPermissionStore::new()));
        let saved = service
            .set_permissions("u1", &["view_users ".to_string(), "view_users".to_string(), "edit_settings".to_string()])
            .await
            .unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(service.get_permissions("u1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn unknown_user_has_no_permissions() {
        let service = PermissionService::new(Arc::new(MemoryPermissionStore::new()));
        assert!(service.get_permissions("ghost").await.unwrap().is_empty());
    }

    #[test]
    fn catalog_lists_known_tokens() {
        let service = PermissionService::new(Arc::new(MemoryPermissionStore::new()));
        assert!(service.catalog().contains(&"edit_settings".to_string()));
    }
}
