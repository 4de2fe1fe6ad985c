use mongodb::IndexModel;

/// 实体声明的索引（由 `#[derive(MongoIndexModelProvider)]` 生成）
pub trait MongoIndexModelProvider {
    fn index_models() -> Vec<IndexModel>;
}
