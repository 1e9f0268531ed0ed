use arena::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ArenaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = ArenaServer::builder()
        .config(ServerConfig::from_env())
        .build()
        .await?;

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
