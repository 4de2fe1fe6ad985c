//! 菜单项写入校验。读取端（解析器）默认数据合法，异常数据在这里拦截。
use crate::entitys::sidebar_entity::SidebarItem;
use common::errors::{AppError, AppResult};
use common::util::common_utils::normalize_tokens;
use std::collections::{HashMap, HashSet};
use validator::Validate;

fn invalid(msg: String) -> AppError {
    AppError::Validation(msg)
}

/// 校验并规整一份菜单项列表，返回可直接落库的结果
pub fn validate_items(items: Vec<SidebarItem>) -> AppResult<Vec<SidebarItem>> {
    let mut normalized = Vec::with_capacity(items.len());
    let mut ids: HashSet<String> = HashSet::with_capacity(items.len());

    for mut item in items {
        item.id = item.id.trim().to_string();
        item.title = item.title.trim().to_string();
        item.path = item.path.trim().to_string();
        item.parent_id = item.parent_id.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        item.validate()?;

        if !ids.insert(item.id.clone()) {
            return Err(invalid(format!("duplicate item id {}", item.id)));
        }
        if item.allowed_roles.is_empty() {
            return Err(invalid(format!("item {} must list at least one allowed role", item.id)));
        }
        if let Some(role) = item.allowed_roles.iter().find(|r| !r.is_item_role()) {
            return Err(invalid(format!("item {} allows role {}, only admin and employee are permitted", item.id, role)));
        }
        let mut roles = vec![];
        for role in &item.allowed_roles {
            if !roles.contains(role) {
                roles.push(*role);
            }
        }
        item.allowed_roles = roles;
        item.required_permissions = normalize_tokens(&item.required_permissions);
        normalized.push(item);
    }

    let referenced: HashSet<&str> = normalized.iter().filter_map(|i| i.parent_id.as_deref()).collect();
    let parents: HashMap<&str, Option<&str>> =
        normalized.iter().map(|i| (i.id.as_str(), i.parent_id.as_deref())).collect();

    for item in &normalized {
        if let Some(parent_id) = item.parent_id.as_deref() {
            if !parents.contains_key(parent_id) {
                return Err(invalid(format!("item {} references missing parent {}", item.id, parent_id)));
            }
        }
        if item.is_group() && !referenced.contains(item.id.as_str()) {
            return Err(invalid(format!("item {} has no path and no children", item.id)));
        }

        let mut cursor = item.parent_id.as_deref();
        let mut depth = 0;
        while let Some(parent_id) = cursor {
            depth += 1;
            if parent_id == item.id || depth > normalized.len() {
                return Err(invalid(format!("item {} is part of a parent cycle", item.id)));
            }
            cursor = parents.get(parent_id).copied().flatten();
        }
    }

    Ok(normalized)
}
