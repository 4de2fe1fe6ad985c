use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::sync::Arc;

/// 存储地址为该值时使用进程内存储（开发、测试环境）
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub database: Option<DatabaseConfig>,
    pub server: Option<ServerConfig>,
    pub sys: Option<SysConfig>,
    pub cache: Option<CacheConfig>,
}

impl AppConfig {
    /// 读取配置文件，并允许 `APP_` 前缀的环境变量覆盖。
    /// 段名与字段名之间用双下划线分隔，如 `APP_SERVER__PORT`、`APP_CACHE__TTL_SECS`
    pub fn new(file: &str) -> Result<Self> {
        Self::with_environment(file, environment())
    }

    fn with_environment(file: &str, env: ::config::Environment) -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::File::with_name(file).required(true))
            .add_source(env)
            .build()
            .with_context(|| format!("Failed to build configuration from {}", file))?;
        let cfg = config.try_deserialize::<AppConfig>().context("Failed to deserialize configuration")?;
        Ok(cfg)
    }

    pub fn init(file: &str) -> Result<Arc<Self>> {
        let instance = Arc::new(Self::new(file)?);
        INSTANCE.set(instance.clone()).map_err(|_| anyhow::anyhow!("AppConfig already initialized"))?;
        Ok(instance)
    }

    pub fn get_database(&self) -> DatabaseConfig {
        self.database.clone().unwrap_or_default()
    }
    pub fn get_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }
    pub fn get_sys(&self) -> SysConfig {
        self.sys.clone().unwrap_or_default()
    }
    pub fn get_cache(&self) -> CacheConfig {
        self.cache.clone().unwrap_or_default()
    }

    /// 获取单例
    pub fn get() -> Option<Arc<Self>> {
        INSTANCE.get().cloned()
    }
}
static INSTANCE: OnceCell<Arc<AppConfig>> = OnceCell::new();

// 单下划线保留给字段名（db_name、ttl_secs），层级只按 "__" 拆分
fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix("APP").prefix_separator("_").separator("__").try_parsing(true)
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub db_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: MEMORY_DATABASE_URL.to_string(), db_name: "admin_console".to_string() }
    }
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case(MEMORY_DATABASE_URL)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SysConfig {
    //全局日志级别
    pub log_level: String,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8080 }
    }
}

/// 侧边栏配置读缓存，写操作会显式失效
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true, ttl_secs: 300, max_capacity: 10_000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg = AppConfig::default();
        assert!(cfg.get_database().is_memory());
        assert_eq!(cfg.get_server().port, 8080);
        assert_eq!(cfg.get_sys().log_level, "info");
        assert!(cfg.get_cache().enabled);
    }

    #[test]
    fn env_overrides_multi_word_keys() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[database]\nurl = \"memory\"\ndb_name = \"file_db\"\n[server]\nhost = \"0.0.0.0\"\nport = 8080\n[cache]\nenabled = true\nttl_secs = 300\nmax_capacity = 100"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let vars: ::config::Map<String, String> = [
            ("APP_CACHE__TTL_SECS", "5"),
            ("APP_DATABASE__DB_NAME", "env_db"),
            ("APP_SERVER__PORT", "9999"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let cfg = AppConfig::with_environment(&path, environment().source(Some(vars))).unwrap();

        assert_eq!(cfg.get_cache().ttl_secs, 5);
        assert_eq!(cfg.get_cache().max_capacity, 100);
        assert_eq!(cfg.get_database().db_name, "env_db");
        assert_eq!(cfg.get_server().port, 9999);
        assert_eq!(cfg.get_server().host, "0.0.0.0");
    }

    #[test]
    fn single_underscore_does_not_split_field_names() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cache]\nenabled = true\nttl_secs = 300\nmax_capacity = 100").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let vars: ::config::Map<String, String> =
            [("APP_CACHE_TTL_SECS".to_string(), "5".to_string())].into_iter().collect();
        let cfg = AppConfig::with_environment(&path, environment().source(Some(vars))).unwrap();
        assert_eq!(cfg.get_cache().ttl_secs, 300);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::new("definitely-not-here.toml").is_err());
    }
}
