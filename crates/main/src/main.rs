//! 主应用程序入口
//!
//! 加载配置、初始化日志、选择目录存储并启动 Axum 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{memory_directory, Directory, RealtimeHub, SystemClock};
use config::AppConfig;
use infrastructure::{create_pg_pool, PgStorage, MIGRATOR};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    // RUST_LOG 优先于配置中的默认过滤器
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(config = %config.sanitize(), "starting matchline");

    let directory = open_directory(&config).await?;
    let state = AppState::assemble(
        directory,
        Arc::new(RealtimeHub::new(config.realtime.connection_buffer)),
        Arc::new(SystemClock),
        Arc::new(JwtService::from_config(&config.auth)),
        config.discovery.page_size,
    );

    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(address = %address, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

/// 配置了数据库地址时使用 PostgreSQL，否则退回内存存储
async fn open_directory(config: &AppConfig) -> anyhow::Result<Directory> {
    let Some(url) = &config.database.url else {
        tracing::warn!("no database url configured, using in-memory directory store");
        return Ok(memory_directory());
    };

    let pool = create_pg_pool(url, config.database.max_connections)
        .await
        .context("failed to connect to postgres")?;
    MIGRATOR
        .run(&pool)
        .await
        .context("failed to run migrations")?;
    tracing::info!("postgres directory store ready");

    Ok(PgStorage::new(pool).directory())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
