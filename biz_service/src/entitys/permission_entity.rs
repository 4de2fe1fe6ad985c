use crate::entitys::role_entity::RoleEnum;
use common::util::common_utils::normalize_tokens;
use log::warn;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// 已知的权限点（仅用于后台勾选展示，权限点本身是不透明字符串）
pub const PERMISSION_CATALOG: &[&str] = &[
    "view_dashboard",
    "view_statistics",
    "view_users",
    "manage_users",
    "manage_categories",
    "manage_posts",
    "manage_pricing",
    "manage_packages",
    "view_messages",
    "edit_settings",
];

/// 员工权限记录（集合 user_permission，主键即用户 ID）
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionEntity {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub update_time: i64,
}

impl UserPermissionEntity {
    /// 从原始文档解析权限集合；结构异常的记录按空集合处理
    pub fn permission_set_from_raw(raw: Document) -> PermissionSet {
        match mongodb::bson::from_document::<UserPermissionEntity>(raw) {
            Ok(entity) => PermissionSet::new(entity.permissions),
            Err(e) => {
                warn!("malformed permission record, treated as empty: {}", e);
                PermissionSet::default()
            }
        }
    }
}

/// 用户持有的权限点集合，不含即拒绝
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    tokens: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { tokens: normalize_tokens(tokens).into_iter().collect() }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.tokens.iter().cloned().collect()
    }

    /// `required` 为空、管理员、或与已授予权限有交集时放行
    pub fn has_any<S: AsRef<str>>(&self, role: RoleEnum, required: &[S]) -> bool {
        required.is_empty() || role.is_admin() || required.iter().any(|t| self.tokens.contains(t.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn empty_requirement_always_passes() {
        let none: [&str; 0] = [];
        assert!(PermissionSet::default().has_any(RoleEnum::Employee, &none));
    }

    #[test]
    fn admin_bypasses_tokens() {
        assert!(PermissionSet::default().has_any(RoleEnum::Admin, &["edit_settings"]));
    }

    #[test]
    fn employee_needs_intersection() {
        let perms = PermissionSet::new(["view_dashboard"]);
        assert!(!perms.has_any(RoleEnum::Employee, &["view_statistics"]));
        assert!(perms.has_any(RoleEnum::Employee, &["view_statistics", "view_dashboard"]));
    }

    #[test]
    fn tokens_are_unique_and_trimmed() {
        let perms = PermissionSet::new(["view_users", " view_users ", ""]);
        assert_eq!(perms.len(), 1);
        assert!(perms.contains("view_users"));
    }

    #[test]
    fn malformed_record_is_empty_set() {
        let raw = doc! { "_id": "u1", "permissions": "view_users" };
        assert!(UserPermissionEntity::permission_set_from_raw(raw).is_empty());

        let raw = doc! { "_id": "u1", "permissions": ["view_users", "edit_settings"] };
        let perms = UserPermissionEntity::permission_set_from_raw(raw);
        assert_eq!(perms.to_vec(), vec!["edit_settings".to_string(), "view_users".to_string()]);
    }

    #[test]
    fn record_without_permissions_field_is_empty_set() {
        let raw = doc! { "_id": "u1" };
        assert!(UserPermissionEntity::permission_set_from_raw(raw).is_empty());
    }
}
