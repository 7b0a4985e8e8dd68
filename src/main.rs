use anyhow::Result;
use tracing::info;

use nairadesk::config::AppConfig;
use nairadesk::gateway::{self, AppState};
use nairadesk::logging;

#[tokio::main]
async fn main() -> Result<()> {
    let env = std::env::args().nth(1).unwrap_or_else(|| "dev".to_string());
    let config = AppConfig::load(&env);
    let _guard = logging::init_logging(&config);

    info!(
        rev = env!("BUILD_REV"),
        env = %env,
        commission_model = %config.engine.commission_model,
        "nairadesk ledger engine starting"
    );

    let state = AppState::build(&config.engine);
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("gateway listening on {addr}");

    axum::serve(listener, gateway::router(state)).await?;
    Ok(())
}
