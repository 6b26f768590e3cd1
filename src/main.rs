// src/main.rs - Operator console entry point
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use plot_director::config::{self, Config};
use plot_director::director::{Action, PlotDirector};
use plot_director::service::{ServiceConnector, SimulatedConnector, TcpConnector};
use plot_director::web;

#[derive(Debug, Parser)]
#[command(name = "plot-director", version, about = "Pen-plotter operator console")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Plot script to load at startup
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Use the in-process plot service instead of connecting over TCP
    #[arg(long)]
    simulate: bool,

    /// Address for the operator API, overrides the config file
    #[arg(long)]
    bind: Option<String>,

    /// URL that receives a POST when a plot completes, overrides the config file
    #[arg(long)]
    webhook: Option<String>,

    /// Max tracing level
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let args = Args::parse();

    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    tracing::info!("Starting plot-director");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => Config::default(),
    };
    if let Some(bind) = args.bind {
        config.web.bind = bind;
    }
    if let Some(webhook) = args.webhook {
        config.notify.webhook = Some(webhook);
    }
    config.validate()?;
    if let Some(webhook) = &config.notify.webhook {
        tracing::info!("Completion webhook: {}", webhook);
    }

    let connector: Arc<dyn ServiceConnector> = if args.simulate {
        tracing::info!("Using simulated plot service");
        Arc::new(SimulatedConnector::new())
    } else {
        tracing::info!("Plot service: {}", config.service.address());
        Arc::new(TcpConnector::from_config(&config.service))
    };

    let bind = config.web.bind.clone();
    let director = PlotDirector::new(config, connector);

    if let Some(path) = args.script {
        if let Err(e) = director.invoke(Action::LoadScript(path)).await {
            tracing::error!("Startup script not loaded: {}", e);
        }
    }

    // Operator requests are serialized through one console task.
    let (console_tx, console_rx) = mpsc::channel(16);
    tokio::spawn(web::console_channel::serve_requests(director.clone(), console_rx));

    let app = web::api::create_router(console_tx);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Operator API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    director.cleanup().await;
    Ok(())
}
