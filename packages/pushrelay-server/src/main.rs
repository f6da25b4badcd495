mod bootstrap;
mod delivery;
mod error;
mod routes;
mod state;

use crate::state::AppState;
use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use pushrelay_core::Resolver;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(clap::Parser)]
#[command(name = "pushrelay-server")]
#[command(about = "Relay push notification requests to FCM")]
struct CliArgs {
    /// 监听地址，覆盖 PUSHRELAY_ADDR
    #[arg(long)]
    addr: Option<String>,

    /// 以 info 级别输出声音与频道的决策过程
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr = bootstrap::config::server_addr_from_env(args.addr.as_deref())?;
    let resolver_config = bootstrap::config::resolver_config_from_env(args.verbose);
    let delivery_config = bootstrap::config::delivery_config_from_env()?;
    let delivery =
        delivery::init(&delivery_config).context("failed to initialize delivery backend")?;

    info!(
        ios_custom_sound = %resolver_config.ios_custom_sound,
        diagnostics = ?resolver_config.diagnostics,
        "resolver configured"
    );
    let state = Arc::new(AppState {
        resolver: Resolver::new(resolver_config),
        delivery,
    });
    let app = bootstrap::app::axum_app(state);

    info!(%addr, "pushrelay started");
    println!(
        "pushrelay started at http://{}",
        addr.to_string().replace("0.0.0.0", "127.0.0.1")
    );
    let tcp_listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(tcp_listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}
