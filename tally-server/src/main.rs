//! tally-server: account and counter sync backend for tally clients.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use tally_server::{build_router, AppState, Db, ServerConfig, TokenSigner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tally_server={}", config.log_level).parse()?),
        )
        .init();

    config.check_secret();

    let db = Db::open(&config.db_path)?;
    let state = AppState {
        db: Arc::new(db),
        tokens: TokenSigner::new(config.jwt_secret.clone(), config.jwt_expiry_days),
    };
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("tally-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
