use super::{pick_latest, PermissionStore, SidebarConfigStore};
use crate::entitys::permission_entity::{PermissionSet, UserPermissionEntity};
use crate::entitys::role_entity::RoleEnum;
use crate::entitys::sidebar_entity::{ConfigScope, SidebarConfigEntity, SidebarConfigQueryDto};
use crate::util::db_index_util::ensure_indexes;
use async_trait::async_trait;
use common::errors::{AppError, AppResult};
use common::repository_util::{BaseRepository, Repository};
use common::util::date_util::now;
use log::warn;
use mongodb::bson::{doc, to_document, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Database;

const SIDEBAR_CONFIG_COLLECTION: &str = "sidebar_config";
const USER_PERMISSION_COLLECTION: &str = "user_permission";

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        _ => false,
    }
}

fn override_filter(user_id: &str, role: RoleEnum) -> Document {
    doc! {
        "scope": ConfigScope::UserOverride.to_string(),
        "userId": user_id,
        "role": role.as_ref(),
    }
}

fn default_filter(role: RoleEnum) -> Document {
    doc! { "role": role.as_ref(), "isDefault": true }
}

/// 仅当存储中的版本号仍为 `expected_version` 时命中
fn version_filter(id: &str, expected_version: i64) -> Document {
    doc! { "_id": id, "version": expected_version }
}

/// 兜底写入：`_id` 作为过滤条件，其余字段只在插入时生效
fn insert_if_absent_ops(config: &SidebarConfigEntity) -> AppResult<(Document, Document)> {
    let mut fields = to_document(config)?;
    fields.remove("_id");
    fields.insert("version", 1_i64);
    Ok((doc! { "_id": &config.id }, doc! { "$setOnInsert": fields }))
}

fn demote_ops(role: RoleEnum, keep_id: &str, now: i64) -> (Document, Document) {
    let filter = doc! { "role": role.as_ref(), "isDefault": true, "_id": { "$ne": keep_id } };
    let update = doc! { "$set": { "isDefault": false, "updateTime": now }, "$inc": { "version": 1_i64 } };
    (filter, update)
}

/// 版本条件未命中时区分：文档仍在为 Conflict，已不存在为 NotFound
fn stale_write_error(id: &str, current_version: Option<i64>, expected_version: i64) -> AppError {
    match current_version {
        Some(current) => {
            AppError::Conflict(format!("sidebar config {} is at version {}, not {}", id, current, expected_version))
        }
        None => AppError::NotFound(format!("sidebar config {}", id)),
    }
}

fn permission_update(permissions: &PermissionSet, now: i64) -> Document {
    doc! { "$set": { "permissions": permissions.to_vec(), "updateTime": now } }
}

#[derive(Debug, Clone)]
pub struct MongoSidebarConfigStore {
    dao: BaseRepository<SidebarConfigEntity>,
}

impl MongoSidebarConfigStore {
    pub fn new(db: &Database) -> Self {
        Self { dao: BaseRepository::new(db, SIDEBAR_CONFIG_COLLECTION) }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        ensure_indexes(&self.dao.collection).await
    }
}

#[async_trait]
impl SidebarConfigStore for MongoSidebarConfigStore {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<SidebarConfigEntity>> {
        Ok(self.dao.find_by_id(id).await?)
    }

    async fn find_override(&self, user_id: &str, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
        Ok(self.dao.find_one(override_filter(user_id, role)).await?)
    }

    async fn find_default(&self, role: RoleEnum) -> AppResult<Option<SidebarConfigEntity>> {
        let defaults = self.dao.query(default_filter(role)).await?;
        if defaults.len() > 1 {
            warn!("{} sidebar configs marked default for role {}", defaults.len(), role);
        }
        Ok(pick_latest(defaults))
    }

    async fn list(&self, query: &SidebarConfigQueryDto) -> AppResult<Vec<SidebarConfigEntity>> {
        let mut configs = self.dao.query(query.to_query_doc()).await?;
        configs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(configs)
    }

    async fn insert_if_absent(&self, config: SidebarConfigEntity) -> AppResult<SidebarConfigEntity> {
        let (filter, update) = insert_if_absent_ops(&config)?;
        // $setOnInsert 保证并发兜底只落一份；并发 upsert 撞上唯一键时以已写入的为准
        match self.dao.update(filter, update, true).await {
            Ok(_) => {}
            Err(e) if is_duplicate_key(&e) => warn!("concurrent insert of {}, reading stored copy", config.id),
            Err(e) => return Err(e.into()),
        }
        self.dao
            .find_by_id(&config.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("sidebar config {}", config.id)))
    }

    async fn save(&self, mut config: SidebarConfigEntity, expected_version: i64) -> AppResult<SidebarConfigEntity> {
        config.version = expected_version + 1;
        if expected_version == 0 {
            return match self.dao.insert(&config).await {
                Ok(()) => Ok(config),
                Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(format!("sidebar config {} already exists", config.id))),
                Err(e) => Err(e.into()),
            };
        }

        let matched = self.dao.replace(version_filter(&config.id, expected_version), &config).await?;
        if matched == 0 {
            let current = self.dao.find_by_id(&config.id).await?.map(|c| c.version);
            return Err(stale_write_error(&config.id, current, expected_version));
        }
        Ok(config)
    }

    async fn clear_default_flag(&self, role: RoleEnum, keep_id: &str) -> AppResult<u64> {
        let (filter, update) = demote_ops(role, keep_id, now());
        Ok(self.dao.update(filter, update, false).await?)
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        Ok(self.dao.delete(doc! { "_id": id }).await? > 0)
    }
}

#[derive(Debug, Clone)]
pub struct MongoPermissionStore {
    dao: BaseRepository<UserPermissionEntity>,
}

impl MongoPermissionStore {
    pub fn new(db: &Database) -> Self {
        Self { dao: BaseRepository::new(db, USER_PERMISSION_COLLECTION) }
    }
}

#[async_trait]
impl PermissionStore for MongoPermissionStore {
    async fn load(&self, user_id: &str) -> AppResult<PermissionSet> {
        match self.dao.find_one_raw(doc! { "_id": user_id }).await? {
            Some(raw) => Ok(UserPermissionEntity::permission_set_from_raw(raw)),
            None => Ok(PermissionSet::default()),
        }
    }

    async fn store(&self, user_id: &str, permissions: &PermissionSet) -> AppResult<()> {
        self.dao.update(doc! { "_id": user_id }, permission_update(permissions, now()), true).await?;
        Ok(())
    }
}
