//! 服务入口

use ai_soudan::config::AppConfig;
use ai_soudan::server;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "[MAIN] 启动 AI相談室: port={} gemini={} resend={} sheets={}",
        config.port,
        config.gemini_api_key.is_some(),
        config.resend_api_key.is_some(),
        config.sheets.is_some(),
    );

    server::serve(config).await
}
