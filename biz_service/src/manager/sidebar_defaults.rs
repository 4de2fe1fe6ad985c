use crate::entitys::role_entity::RoleEnum;
use crate::entitys::role_entity::RoleEnum::{Admin, Employee};
use crate::entitys::sidebar_entity::{SidebarConfigEntity, SidebarItem};

/// 内置最小菜单：部署缺少默认配置时兜底，保证管理员总能看到菜单
pub fn builtin_items(role: RoleEnum) -> Vec<SidebarItem> {
    match role {
        Admin => vec![
            SidebarItem::new("dashboard", "Dashboard", "/admin/dashboard", 0).with_icon("dashboard").with_roles(&[Admin, Employee]),
            SidebarItem::new("users-group", "Users", "", 10).with_icon("users"),
            SidebarItem::new("all-users", "All users", "/admin/users", 0).with_parent("users-group"),
            SidebarItem::new("permissions", "Employee permissions", "/admin/users/permissions", 1).with_parent("users-group"),
            SidebarItem::new("sidebar", "Sidebar", "/admin/sidebar", 80).with_icon("menu"),
            SidebarItem::new("settings", "Settings", "/admin/settings", 90).with_icon("settings"),
        ],
        Employee => vec![
            SidebarItem::new("dashboard", "Dashboard", "/admin/dashboard", 0).with_icon("dashboard").with_roles(&[Admin, Employee]),
            SidebarItem::new("stats", "Statistics", "/admin/statistics", 10)
                .with_icon("chart")
                .with_roles(&[Admin, Employee])
                .with_permissions(&["view_statistics"]),
            SidebarItem::new("messages", "Messages", "/admin/messages", 20)
                .with_icon("mail")
                .with_roles(&[Admin, Employee])
                .with_permissions(&["view_messages"]),
        ],
        RoleEnum::User => vec![],
    }
}

pub fn builtin_config(role: RoleEnum, now: i64) -> SidebarConfigEntity {
    SidebarConfigEntity::system_default(role, &format!("Built-in {} sidebar", role), builtin_items(role), now)
}
