use crate::entitys::permission_entity::PermissionSet;
use crate::entitys::role_entity::RoleEnum;
use mongo_macro::{MongoIndexModelProvider, QueryFilter};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigScope {
    /// 角色级系统默认配置
    SystemDefault,
    /// 针对单个用户的覆盖配置
    UserOverride,
}

/// 后台菜单项（叶子或分组）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItem {
    #[validate(length(min = 1, message = "item id is required"))]
    pub id: String,
    #[validate(length(min = 1, message = "item title is required"))]
    pub title: String,
    /// 空字符串表示分组（不可导航）
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, deserialize_with = "deserialize_parent_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    #[serde(default)]
    pub allowed_roles: Vec<RoleEnum>,
    #[serde(default)]
    pub required_permissions: Vec<String>,
}

fn default_visible() -> bool {
    true
}

// null / 缺省 / 空白字符串统一成 None
fn deserialize_parent_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

impl SidebarItem {
    pub fn new(id: &str, title: &str, path: &str, order: i32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            icon: None,
            parent_id: None,
            order,
            is_visible: true,
            allowed_roles: vec![RoleEnum::Admin],
            required_permissions: vec![],
        }
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn with_roles(mut self, roles: &[RoleEnum]) -> Self {
        self.allowed_roles = roles.to_vec();
        self
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.required_permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn is_group(&self) -> bool {
        self.path.trim().is_empty()
    }

    /// 角色门槛先于权限门槛，权限无法越过角色限制。
    /// allowedRoles 为空时只有管理员可见（写入端会拒绝这种数据）。
    pub fn is_reachable_by(&self, role: RoleEnum, permissions: &PermissionSet) -> bool {
        let role_allowed = if self.allowed_roles.is_empty() { role.is_admin() } else { self.allowed_roles.contains(&role) };
        role_allowed && (role.is_admin() || self.required_permissions.is_empty() || permissions.has_any(role, &self.required_permissions))
    }
}

/// 菜单配置文档（集合 sidebar_config）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, MongoIndexModelProvider)]
#[serde(rename_all = "camelCase")]
#[mongo_index(fields["userId", "role"], name("idx_user_role"))]
#[mongo_index(fields["role", "isDefault"], name("idx_role_default"))]
pub struct SidebarConfigEntity {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub role: RoleEnum,
    pub scope: ConfigScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub items: Vec<SidebarItem>,
    /// 乐观锁版本号，每次写入 +1
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
}

impl SidebarConfigEntity {
    /// 角色默认配置使用固定 ID，保证兜底写入幂等
    pub fn default_id(role: RoleEnum) -> String {
        format!("default-{}", role)
    }

    pub fn override_id(user_id: &str, role: RoleEnum) -> String {
        format!("override-{}-{}", role, user_id)
    }

    pub fn system_default(role: RoleEnum, name: &str, items: Vec<SidebarItem>, now: i64) -> Self {
        Self {
            id: Self::default_id(role),
            name: name.to_string(),
            role,
            scope: ConfigScope::SystemDefault,
            user_id: None,
            is_default: true,
            items,
            version: 0,
            create_time: now,
            update_time: now,
        }
    }

    pub fn user_override(user_id: &str, role: RoleEnum, items: Vec<SidebarItem>, now: i64) -> Self {
        Self {
            id: Self::override_id(user_id, role),
            name: format!("{} sidebar for {}", role, user_id),
            role,
            scope: ConfigScope::UserOverride,
            user_id: Some(user_id.to_string()),
            is_default: false,
            items,
            version: 0,
            create_time: now,
            update_time: now,
        }
    }

    pub fn find_item_mut(&mut self, item_id: &str) -> Option<&mut SidebarItem> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }
}

/// 配置列表查询条件
#[derive(QueryFilter, Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SidebarConfigQueryDto {
    #[query(eq)]
    pub role: Option<RoleEnum>,
    #[query(eq)]
    pub scope: Option<ConfigScope>,
    #[query(eq, field = "userId")]
    pub user_id: Option<String>,
    #[query(eq, field = "isDefault")]
    pub is_default: Option<bool>,
    #[query(like)]
    pub name: Option<String>,
}

impl SidebarConfigQueryDto {
    /// 内存存储使用的同义匹配
    pub fn matches(&self, config: &SidebarConfigEntity) -> bool {
        self.role.is_none_or(|r| r == config.role)
            && self.scope.is_none_or(|s| s == config.scope)
            && self.user_id.as_ref().is_none_or(|u| config.user_id.as_ref() == Some(u))
            && self.is_default.is_none_or(|d| d == config.is_default)
            && self.name.as_ref().is_none_or(|n| config.name.to_lowercase().contains(&n.to_lowercase()))
    }
}
