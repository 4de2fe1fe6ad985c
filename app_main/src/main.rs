use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use app_main::handlers;
use app_main::middleware::AuthMiddleware;
use common::config::AppConfig;
use log::{LevelFilter, warn};
use std::str::FromStr;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 读取配置文件
    let app_cfg = AppConfig::init("main-config.toml")?;
    //初始化日志
    init_log(&app_cfg);
    let services = web::Data::new(biz_service::init_service(&app_cfg).await?);

    let server = app_cfg.get_server();
    let address_and_port = format!("{}:{}", &server.host, &server.port);
    warn!("Starting server on {}", address_and_port);
    HttpServer::new(move || {
        App::new()
            .app_data(services.clone())
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            // 配置 控制器
            .configure(handlers::configure)
    })
    .keep_alive(actix_web::http::KeepAlive::Timeout(std::time::Duration::from_secs(600))) // 允许 10 分钟超时
    .bind(address_and_port)?
    .run()
    .await?;
    Ok(())
}

pub fn init_log(config: &AppConfig) {
    let log_level = config.get_sys().log_level;
    let level = LevelFilter::from_str(&log_level).unwrap_or(LevelFilter::Info);
    env_logger::Builder::new().filter(None, level).init();
}
