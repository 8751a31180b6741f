use clap::Parser;
use tracing::info;

use coinproxy::{app, config::Config, server::Server};

#[derive(Debug, Parser)]
#[command(
    name = "coinproxy",
    about = "Authenticated proxy for blockchain and price-data APIs"
)]
struct Cli {
    /// Address to listen on. Overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinproxy=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }

    let state = app::state_from_config(&config)?;
    let server = Server::bind(&config.bind_addr).await?;

    app::serve(server, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received");
    })
    .await?;

    info!("coinproxy stopped");
    Ok(())
}
