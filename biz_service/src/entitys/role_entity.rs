use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// 账号角色
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoleEnum {
    /// 超级管理员，隐式拥有全部权限
    Admin,
    /// 员工，按权限点授权
    Employee,
    /// 前台用户，不进入后台
    User,
}

impl RoleEnum {
    pub fn is_admin(self) -> bool {
        self == RoleEnum::Admin
    }

    /// 可以解析后台菜单的角色
    pub fn is_admin_area(self) -> bool {
        matches!(self, RoleEnum::Admin | RoleEnum::Employee)
    }

    /// 允许出现在菜单项 allowedRoles 中的角色
    pub fn is_item_role(self) -> bool {
        self.is_admin_area()
    }
}
