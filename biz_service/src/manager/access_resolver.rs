//! 菜单可见性解析：可见开关 → 角色/权限 → 父级级联剔除 → 排序。
//!
//! 纯函数，不访问存储，也不会失败；结果为空表示该用户没有菜单。

use crate::entitys::permission_entity::PermissionSet;
use crate::entitys::role_entity::RoleEnum;
use crate::entitys::sidebar_entity::SidebarItem;
use serde::Serialize;
use std::collections::HashMap;

/// 渲染用的树节点
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarNode {
    #[serde(flatten)]
    pub item: SidebarItem,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SidebarNode>,
}

fn admits(item: &SidebarItem, role: RoleEnum, permissions: &PermissionSet) -> bool {
    item.is_visible && item.is_reachable_by(role, permissions)
}

/// 沿父链向上判定；父级缺失、成环或任一祖先被剔除时，整条链都被剔除
fn survives<'a>(
    start: &'a SidebarItem,
    by_id: &HashMap<&'a str, &'a SidebarItem>,
    role: RoleEnum,
    permissions: &PermissionSet,
    memo: &mut HashMap<&'a str, bool>,
) -> bool {
    let mut chain: Vec<&'a str> = vec![];
    let mut current = Some(start);
    let verdict = loop {
        let Some(item) = current else {
            break false;
        };
        if let Some(&known) = memo.get(item.id.as_str()) {
            break known;
        }
        if chain.contains(&item.id.as_str()) {
            break false;
        }
        chain.push(item.id.as_str());
        if !admits(item, role, permissions) {
            break false;
        }
        match item.parent_id.as_deref() {
            None => break true,
            Some(parent_id) => current = by_id.get(parent_id).copied(),
        }
    };
    for id in chain {
        memo.insert(id, verdict);
    }
    verdict
}

/// 过滤并排序菜单项，返回扁平列表（保留 parentId 关系）
pub fn resolve(items: &[SidebarItem], role: RoleEnum, permissions: &PermissionSet) -> Vec<SidebarItem> {
    let mut by_id: HashMap<&str, &SidebarItem> = HashMap::with_capacity(items.len());
    for item in items {
        by_id.entry(item.id.as_str()).or_insert(item);
    }

    let mut memo: HashMap<&str, bool> = HashMap::with_capacity(items.len());
    let mut resolved = vec![];
    for item in items {
        if survives(item, &by_id, role, permissions, &mut memo) {
            resolved.push(item.clone());
        }
    }
    resolved.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    resolved
}

/// 将 `resolve` 的结果按父子关系组装成树，兄弟节点保持原有顺序
pub fn build_tree(resolved: &[SidebarItem]) -> Vec<SidebarNode> {
    let mut children: HashMap<&str, Vec<&SidebarItem>> = HashMap::new();
    let mut roots = vec![];
    for item in resolved {
        match item.parent_id.as_deref() {
            Some(parent_id) => children.entry(parent_id).or_default().push(item),
            None => roots.push(item),
        }
    }
    roots.into_iter().map(|item| attach(item, &children)).collect()
}

fn attach(item: &SidebarItem, children: &HashMap<&str, Vec<&SidebarItem>>) -> SidebarNode {
    let nodes = match children.get(item.id.as_str()) {
        Some(list) => list.iter().map(|child| attach(child, children)).collect(),
        None => vec![],
    };
    SidebarNode { item: item.clone(), children: nodes }
}
