use common::errors::AppResult;
use common::index_trait::MongoIndexModelProvider;
use mongodb::Collection;

/// 按实体声明创建缺失的索引（按索引名比对）
pub async fn ensure_indexes<T>(coll: &Collection<T>) -> AppResult<()>
where
    T: MongoIndexModelProvider + Send + Sync,
{
    // 集合尚未创建时 listIndexes 会报 NamespaceNotFound，按无索引处理
    let existing = match coll.list_index_names().await {
        Ok(names) => names,
        Err(e) => {
            log::warn!("list indexes of {} failed: {}", coll.name(), e);
            vec![]
        }
    };
    for target in T::index_models() {
        let name = target.options.as_ref().and_then(|o| o.name.clone()).unwrap_or_default();
        if existing.contains(&name) {
            continue;
        }
        match coll.create_index(target).await {
            Ok(_) => log::info!("✅ 创建索引成功: {}.{}", coll.name(), name),
            Err(e) => {
                log::error!("❌ 创建索引失败: {}.{} {:?}", coll.name(), name, e);
                return Err(e.into());
            }
        }
    }
    Ok(())
}
