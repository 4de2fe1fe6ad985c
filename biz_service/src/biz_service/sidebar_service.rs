use crate::biz_service::cache_service::CacheService;
use crate::biz_service::permission_service::PermissionService;
use crate::biz_service::sidebar_validate::validate_items;
use crate::entitys::permission_entity::PermissionSet;
use crate::entitys::role_entity::RoleEnum;
use crate::entitys::sidebar_entity::{ConfigScope, SidebarConfigEntity, SidebarConfigQueryDto, SidebarItem};
use crate::manager::access_resolver::{build_tree, resolve, SidebarNode};
use crate::manager::sidebar_defaults::builtin_config;
use crate::store::SidebarConfigStore;
use common::config::CacheConfig;
use common::errors::{AppError, AppResult};
use common::util::date_util::now;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::Arc;

/// 当前用户可见的菜单树
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSidebar {
    pub config_id: String,
    pub scope: ConfigScope,
    pub version: i64,
    pub items: Vec<SidebarNode>,
}

pub struct SidebarService {
    store: Arc<dyn SidebarConfigStore>,
    permission_service: Arc<PermissionService>,
    cache: Option<CacheService<SidebarConfigEntity>>,
}

impl SidebarService {
    pub fn new(store: Arc<dyn SidebarConfigStore>, permission_service: Arc<PermissionService>, cache_config: &CacheConfig) -> Self {
        let cache = cache_config.enabled.then(|| CacheService::new(cache_config.ttl_secs, cache_config.max_capacity));
        Self { store, permission_service, cache }
    }

    fn cache_key(user_id: &str, role: RoleEnum) -> String {
        format!("{}:{}", role, user_id)
    }

    fn invalidate(&self, user_id: &str, role: RoleEnum) {
        if let Some(cache) = &self.cache {
            cache.remove(&Self::cache_key(user_id, role));
        }
    }

    fn invalidate_all(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn ensure_admin_area(role: RoleEnum) -> AppResult<()> {
        if role.is_admin_area() { Ok(()) } else { Err(AppError::Validation(format!("role {} has no admin sidebar", role))) }
    }

    /// 生效配置：用户覆盖 → 角色默认 → 内置默认（落库后返回）
    pub async fn resolve_config(&self, user_id: &str, role: RoleEnum) -> AppResult<SidebarConfigEntity> {
        if !role.is_admin_area() {
            return Err(AppError::Forbidden);
        }
        let key = Self::cache_key(user_id, role);
        if let Some(config) = self.cache.as_ref().and_then(|c| c.get(&key)) {
            return Ok(config);
        }
        let config = self.lookup_config(user_id, role).await?;
        if let Some(cache) = &self.cache {
            cache.insert(key, config.clone());
        }
        Ok(config)
    }

    async fn lookup_config(&self, user_id: &str, role: RoleEnum) -> AppResult<SidebarConfigEntity> {
        if let Some(config) = self.store.find_override(user_id, role).await? {
            debug!("sidebar for {} uses override {}", user_id, config.id);
            return Ok(config);
        }
        if let Some(config) = self.store.find_default(role).await? {
            debug!("sidebar for {} uses {} default {}", user_id, role, config.id);
            return Ok(config);
        }
        warn!("no sidebar config for role {}, persisting built-in default", role);
        let config = self.store.insert_if_absent(builtin_config(role, now())).await?;
        info!("built-in {} sidebar stored as {} (version {})", role, config.id, config.version);
        Ok(config)
    }

    /// 解析调用者可见的菜单树；管理员不读取权限记录
    pub async fn resolve_sidebar(&self, user_id: &str, role: RoleEnum) -> AppResult<ResolvedSidebar> {
        let config = self.resolve_config(user_id, role).await?;
        let permissions = if role.is_admin() {
            PermissionSet::default()
        } else {
            self.permission_service.get_permissions(user_id).await?
        };
        let items = resolve(&config.items, role, &permissions);
        Ok(ResolvedSidebar { config_id: config.id, scope: config.scope, version: config.version, items: build_tree(&items) })
    }

    /// 保存用户覆盖配置；首次编辑时创建（忽略传入版本号）
    pub async fn save_user_override(
        &self,
        user_id: &str,
        role: RoleEnum,
        items: Vec<SidebarItem>,
        expected_version: i64,
    ) -> AppResult<SidebarConfigEntity> {
        Self::ensure_admin_area(role)?;
        let items = validate_items(items)?;
        let (config, expected_version) = match self.store.find_override(user_id, role).await? {
            Some(mut existing) => {
                existing.items = items;
                existing.update_time = now();
                (existing, expected_version)
            }
            None => (SidebarConfigEntity::user_override(user_id, role, items, now()), 0),
        };
        let saved = self.store.save(config, expected_version).await.inspect_err(|e| {
            if let AppError::Conflict(msg) = e {
                warn!("override save for {} rejected: {}", user_id, msg);
            }
        })?;
        self.invalidate(user_id, role);
        info!("sidebar override {} saved at version {}", saved.id, saved.version);
        Ok(saved)
    }

    /// 保存角色默认配置，同时取消该角色下其他配置的默认标记
    pub async fn save_default(
        &self,
        role: RoleEnum,
        name: Option<String>,
        items: Vec<SidebarItem>,
        expected_version: i64,
    ) -> AppResult<SidebarConfigEntity> {
        Self::ensure_admin_area(role)?;
        let items = validate_items(items)?;
        let (config, expected_version) = match self.store.find_by_id(&SidebarConfigEntity::default_id(role)).await? {
            Some(mut existing) => {
                existing.items = items;
                existing.is_default = true;
                if let Some(name) = name {
                    existing.name = name;
                }
                existing.update_time = now();
                (existing, expected_version)
            }
            None => {
                let name = name.unwrap_or_else(|| format!("{} sidebar", role));
                (SidebarConfigEntity::system_default(role, &name, items, now()), 0)
            }
        };
        let saved = self.store.save(config, expected_version).await?;
        // 新默认已落库，先失效缓存再处理其他默认标记
        self.invalidate_all();
        let demoted = self.store.clear_default_flag(role, &saved.id).await?;
        if demoted > 0 {
            warn!("cleared default flag on {} other {} sidebar configs", demoted, role);
        }
        info!("{} default sidebar saved at version {}", role, saved.version);
        Ok(saved)
    }

    /// 删除用户覆盖配置，之后回落到角色默认
    pub async fn reset_user_override(&self, user_id: &str, role: RoleEnum) -> AppResult<bool> {
        let Some(config) = self.store.find_override(user_id, role).await? else {
            return Ok(false);
        };
        let removed = self.store.delete(&config.id).await?;
        self.invalidate(user_id, role);
        info!("sidebar override {} reset", config.id);
        Ok(removed)
    }

    pub async fn set_item_visibility(
        &self,
        config_id: &str,
        item_id: &str,
        visible: bool,
        expected_version: i64,
    ) -> AppResult<SidebarConfigEntity> {
        let mut config = self.get_config(config_id).await?;
        let item = config
            .find_item_mut(item_id)
            .ok_or_else(|| AppError::NotFound(format!("item {} in sidebar config {}", item_id, config_id)))?;
        item.is_visible = visible;
        config.update_time = now();
        let saved = self.store.save(config, expected_version).await?;
        self.invalidate_all();
        Ok(saved)
    }

    pub async fn get_config(&self, config_id: &str) -> AppResult<SidebarConfigEntity> {
        self.store.find_by_id(config_id).await?.ok_or_else(|| AppError::NotFound(format!("sidebar config {}", config_id)))
    }

    pub async fn list_configs(&self, query: &SidebarConfigQueryDto) -> AppResult<Vec<SidebarConfigEntity>> {
        self.store.list(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitys::role_entity::RoleEnum::{Admin, Employee, User};
    use crate::store::{MemoryPermissionStore, MemorySidebarConfigStore};

    struct Fixture {
        store: Arc<MemorySidebarConfigStore>,
        permissions: Arc<PermissionService>,
        service: SidebarService,
    }

    fn fixture(cache_enabled: bool) -> Fixture {
        let store = Arc::new(MemorySidebarConfigStore::new());
        let permissions = Arc::new(PermissionService::new(Arc::new(MemoryPermissionStore::new())));
        let cache = CacheConfig { enabled: cache_enabled, ..CacheConfig::default() };
        let service = SidebarService::new(store.clone(), permissions.clone(), &cache);
        Fixture { store, permissions, service }
    }

    fn employee_menu() -> Vec<SidebarItem> {
        vec![
            SidebarItem::new("dashboard", "Dashboard", "/admin", 0).with_roles(&[Admin, Employee]),
            SidebarItem::new("stats", "Statistics", "/admin/stats", 10)
                .with_roles(&[Admin, Employee])
                .with_permissions(&["view_statistics"]),
            SidebarItem::new("users-group", "Users", "", 20),
            SidebarItem::new("all-users", "All users", "/admin/users", 0)
                .with_parent("users-group")
                .with_roles(&[Admin, Employee]),
        ]
    }

    fn flat_ids(nodes: &[SidebarNode]) -> Vec<String> {
        let mut out = vec![];
        for node in nodes {
            out.push(node.item.id.clone());
            out.extend(flat_ids(&node.children));
        }
        out
    }

    #[tokio::test]
    async fn missing_configs_synthesize_and_persist_builtin_default() {
        let f = fixture(false);
        assert!(f.store.is_empty());

        let first = f.service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(first.id, "default-employee");
        assert!(first.is_default);
        assert_eq!(f.store.len(), 1);

        let second = f.service.resolve_config("e2", Employee).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn override_wins_over_role_default() {
        let f = fixture(true);
        f.service.save_default(Employee, None, employee_menu(), 0).await.unwrap();
        let custom = vec![SidebarItem::new("only", "Only", "/only", 0).with_roles(&[Employee])];
        f.service.save_user_override("e1", Employee, custom, 0).await.unwrap();

        let config = f.service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(config.scope, ConfigScope::UserOverride);
        assert_eq!(config.items.len(), 1);

        let other = f.service.resolve_config("e2", Employee).await.unwrap();
        assert_eq!(other.id, "default-employee");
    }

    #[tokio::test]
    async fn reset_falls_back_to_default() {
        let f = fixture(true);
        f.service.save_default(Employee, Some("staff".into()), employee_menu(), 0).await.unwrap();
        f.service.save_user_override("e1", Employee, employee_menu(), 0).await.unwrap();
        // 预热缓存
        assert_eq!(f.service.resolve_config("e1", Employee).await.unwrap().scope, ConfigScope::UserOverride);

        assert!(f.service.reset_user_override("e1", Employee).await.unwrap());
        let config = f.service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(config.scope, ConfigScope::SystemDefault);
        assert_eq!(config.name, "staff");
        assert!(!f.service.reset_user_override("e1", Employee).await.unwrap());
    }

    #[tokio::test]
    async fn cached_config_is_invalidated_by_override_save() {
        let f = fixture(true);
        let before = f.service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(before.scope, ConfigScope::SystemDefault);

        f.service.save_user_override("e1", Employee, employee_menu(), 0).await.unwrap();
        let after = f.service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(after.scope, ConfigScope::UserOverride);
    }

    #[tokio::test]
    async fn user_role_never_resolves_navigation() {
        let f = fixture(false);
        assert!(matches!(f.service.resolve_config("c1", User).await, Err(AppError::Forbidden)));
        assert!(matches!(f.service.resolve_sidebar("c1", User).await, Err(AppError::Forbidden)));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn employee_tree_respects_permissions_and_groups() {
        let f = fixture(false);
        f.service.save_default(Employee, None, employee_menu(), 0).await.unwrap();

        let sidebar = f.service.resolve_sidebar("e1", Employee).await.unwrap();
        assert_eq!(flat_ids(&sidebar.items), vec!["dashboard"]);

        f.permissions.set_permissions("e1", &["view_statistics".to_string()]).await.unwrap();
        let sidebar = f.service.resolve_sidebar("e1", Employee).await.unwrap();
        assert_eq!(flat_ids(&sidebar.items), vec!["dashboard", "stats"]);
    }

    #[tokio::test]
    async fn admin_tree_nests_children() {
        let f = fixture(false);
        f.service.save_default(Admin, None, employee_menu(), 0).await.unwrap();
        let sidebar = f.service.resolve_sidebar("a1", Admin).await.unwrap();
        assert_eq!(flat_ids(&sidebar.items), vec!["dashboard", "stats", "users-group", "all-users"]);
        assert_eq!(sidebar.items.len(), 3);
        assert_eq!(sidebar.version, 1);
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let f = fixture(false);
        let v1 = f.service.save_user_override("e1", Employee, employee_menu(), 0).await.unwrap();
        let v2 = f.service.save_user_override("e1", Employee, employee_menu(), v1.version).await.unwrap();
        assert_eq!(v2.version, 2);

        let stale = f.service.save_user_override("e1", Employee, employee_menu(), v1.version).await;
        assert!(matches!(stale, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn invalid_items_never_reach_the_store() {
        let f = fixture(false);
        let bad = vec![SidebarItem::new("x", "X", "/x", 0).with_roles(&[])];
        assert!(matches!(f.service.save_default(Employee, None, bad, 0).await, Err(AppError::Validation(_))));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn saving_default_demotes_seeded_defaults() {
        let f = fixture(false);
        let mut seeded = SidebarConfigEntity::system_default(Employee, "seeded", employee_menu(), 1);
        seeded.id = "seeded-employee".into();
        f.store.save(seeded, 0).await.unwrap();

        let saved = f.service.save_default(Employee, None, employee_menu(), 0).await.unwrap();
        let defaults = f.service.list_configs(&SidebarConfigQueryDto { is_default: Some(true), ..Default::default() }).await.unwrap();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, saved.id);
    }

    /// 清除默认标记总是失败的存储
    struct DemotionFailsStore(MemorySidebarConfigStore);

    #[async_trait::async_trait]
    impl SidebarConfigStore for DemotionFailsStore {
        async fn find_by_id(&self, id: &str) -> AppResult<Option<SidebarConfigEntity>> {
            self.0.find_by_id(id).await
        }
        async fn find_override(&self, user_id: &str, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
            self.0.find_override(user_id, role).await
        }
        async fn find_default(&self, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
            self.0.find_default(role).await
        }
        async fn list(&self, query: &SidebarConfigQueryDto) -> AppResult<Vec<SidebarConfigEntity>> {
            self.0.list(query).await
        }
        async fn insert_if_absent(&self, config: SidebarConfigEntity) -> AppResult<SidebarConfigEntity> {
            self.0.insert_if_absent(config).await
        }
        async fn save(&self, config: SidebarConfigEntity, expected_version: i64) -> AppResult<SidebarConfigEntity> {
            self.0.save(config, expected_version).await
        }
        async fn clear_default_flag(&self, _role: RoleEnum, _keep_id: &str) -> AppResult<u64> {
            Err(AppError::Internal("connection reset".into()))
        }
        async fn delete(&self, id: &str) -> AppResult<bool> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn saved_default_is_served_even_if_demotion_fails() {
        let permissions = Arc::new(PermissionService::new(Arc::new(MemoryPermissionStore::new())));
        let store = Arc::new(DemotionFailsStore(MemorySidebarConfigStore::new()));
        let service = SidebarService::new(store, permissions, &CacheConfig::default());

        let cached = service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(cached.version, 1);

        let custom = vec![SidebarItem::new("only", "Only", "/only", 0).with_roles(&[Employee])];
        let failed = service.save_default(Employee, None, custom, cached.version).await;
        assert!(matches!(failed, Err(AppError::Internal(_))));

        let current = service.resolve_config("e1", Employee).await.unwrap();
        assert_eq!(current.version, 2);
        assert_eq!(current.items.len(), 1);
        assert_eq!(current.items[0].id, "only");
    }

    #[tokio::test]
    async fn visibility_toggle_hides_item_for_everyone() {
        let f = fixture(true);
        let saved = f.service.save_default(Admin, None, employee_menu(), 0).await.unwrap();
        f.service.resolve_sidebar("a1", Admin).await.unwrap();

        f.service.set_item_visibility(&saved.id, "users-group", false, saved.version).await.unwrap();
        let sidebar = f.service.resolve_sidebar("a1", Admin).await.unwrap();
        assert_eq!(flat_ids(&sidebar.items), vec!["dashboard", "stats"]);

        let missing = f.service.set_item_visibility(&saved.id, "ghost", false, 2).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn builtin_admin_default_is_never_empty() {
        let f = fixture(false);
        let sidebar = f.service.resolve_sidebar("a1", Admin).await.unwrap();
        assert!(!sidebar.items.is_empty());
        assert_eq!(sidebar.scope, ConfigScope::SystemDefault);
    }
}
