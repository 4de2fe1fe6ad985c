use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{error::Result, Collection, Database};
use serde::{de::DeserializeOwned, Serialize};

#[async_trait]
pub trait Repository<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;
    async fn insert(&self, entity: &T) -> Result<()>;
    async fn find_one(&self, filter: Document) -> Result<Option<T>>;
    /// 原始文档读取，调用方自行决定如何处理无法反序列化的记录
    async fn find_one_raw(&self, filter: Document) -> Result<Option<Document>>;
    async fn query(&self, filter: Document) -> Result<Vec<T>>;
    /// 按条件整体替换，返回匹配条数
    async fn replace(&self, filter: Document, entity: &T) -> Result<u64>;
    /// 按条件更新，`upsert` 为 true 时不存在即插入；返回匹配或新插入的条数
    async fn update(&self, filter: Document, update: Document, upsert: bool) -> Result<u64>;
    async fn delete(&self, filter: Document) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct BaseRepository<T: Send + Sync> {
    pub collection: Collection<T>,
}

impl<T: Send + Sync> BaseRepository<T> {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self { collection: db.collection(collection_name) }
    }
}

#[async_trait]
impl<T> Repository<T> for BaseRepository<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    async fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.find_one(doc! { "_id": id }).await
    }

    async fn insert(&self, entity: &T) -> Result<()> {
        self.collection.insert_one(entity).await?;
        Ok(())
    }

    async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.collection.find_one(filter).await
    }

    async fn find_one_raw(&self, filter: Document) -> Result<Option<Document>> {
        self.collection.clone_with_type::<Document>().find_one(filter).await
    }

    async fn query(&self, filter: Document) -> Result<Vec<T>> {
        let mut cursor = self.collection.find(filter).await?;
        let mut result = vec![];
        while let Some(doc) = cursor.try_next().await? {
            result.push(doc);
        }
        Ok(result)
    }

    async fn replace(&self, filter: Document, entity: &T) -> Result<u64> {
        let result = self.collection.replace_one(filter, entity).await?;
        Ok(result.matched_count)
    }

    async fn update(&self, filter: Document, update: Document, upsert: bool) -> Result<u64> {
        let result = self.collection.update_many(filter, update).upsert(upsert).await?;
        let upserted = if result.upserted_id.is_some() { 1 } else { 0 };
        Ok(result.matched_count + upserted)
    }

    async fn delete(&self, filter: Document) -> Result<u64> {
        let result = self.collection.delete_many(filter).await?;
        Ok(result.deleted_count)
    }
}
