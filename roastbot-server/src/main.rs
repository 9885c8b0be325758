use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use roastbot_core::platforms::ChatTransport;
use roastbot_core::platforms::twitch_irc::TwitchIrcClient;
use roastbot_core::{Bot, Dispatcher, OutboundSender};

mod config;
mod http;

use config::BotConfig;

const SENDER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug, Clone)]
#[command(name = "roastbot")]
#[command(author, version, about = "RoastBot - Twitch chat bot with per-channel command modules")]
struct Args {
    /// Path to the JSON bot configuration
    #[arg(long, default_value = "bot.config.json")]
    config: PathBuf,

    /// Serve the read-only HTTP view on this address (overrides the config file)
    #[arg(long)]
    http_addr: Option<String>,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("roastbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("failed to set global subscriber")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let mut config = BotConfig::load(&args.config)
        .with_context(|| format!("failed to load config from {}", args.config.display()))?;
    if let Some(addr) = args.http_addr {
        config.http_addr = Some(addr);
    }
    info!(
        "RoastBot starting. username={}, operator={}, channels={:?}",
        config.username, config.operator, config.channels
    );

    let (client, incoming) = TwitchIrcClient::connect(&config.username, &config.oauth).await?;
    let transport: Arc<dyn ChatTransport> = Arc::new(client);
    let (sender, sender_handle) = OutboundSender::spawn(transport.clone(), config.send_interval());

    let bot = Arc::new(Bot::new(&config.username, &config.operator, sender));
    for name in &config.channels {
        if let Err(e) = bot.bootstrap_channel(name) {
            warn!("skipping channel '{}': {}", name, e);
        }
    }
    bot.join_channels(transport.as_ref()).await;

    let mut dispatch_handle = tokio::spawn(Dispatcher::new(bot.clone()).run(incoming));

    let http = match config.http_addr.as_deref() {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .with_context(|| format!("invalid http_addr '{}'", addr))?;
            let (shutdown_tx, shutdown_rx) = oneshot::channel();
            let handle = http::serve(bot.clone(), addr, shutdown_rx).await?;
            Some((shutdown_tx, handle))
        }
        None => None,
    };

    let mut dispatcher_done = false;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!("Failed to listen for Ctrl-C: {:?}", e);
            }
            info!("Ctrl-C detected; shutting down...");
        }
        _ = &mut dispatch_handle => {
            dispatcher_done = true;
            warn!("Chat connection closed; shutting down...");
        }
    }

    if let Some((shutdown_tx, handle)) = http {
        let _ = shutdown_tx.send(());
        let _ = handle.await;
    }
    if !dispatcher_done {
        dispatch_handle.abort();
        let _ = dispatch_handle.await;
    }

    // The worker exits once the last sender handle is gone and the queue is empty.
    drop(bot);
    match tokio::time::timeout(SENDER_DRAIN_TIMEOUT, sender_handle).await {
        Ok(_) => info!("Outbound queue drained."),
        Err(_) => warn!("Outbound queue not drained after {:?}; dropping the rest", SENDER_DRAIN_TIMEOUT),
    }

    if let Err(e) = transport.disconnect().await {
        error!("Failed to disconnect cleanly: {}", e);
    }

    info!("Main finished. Goodbye!");
    Ok(())
}
