use crate::config::DatabaseConfig;
use anyhow::{Result, anyhow};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

pub struct Db;

impl Db {
    /// 建立 MongoDB 连接并返回数据库句柄
    pub async fn connect(config: &DatabaseConfig) -> Result<Database> {
        let client_options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| anyhow!("MongoDB URI parse error: {}", e))?;

        let client = Client::with_options(client_options).map_err(|e| anyhow!("MongoDB client init error: {}", e))?;

        Ok(client.database(&config.db_name))
    }
}
