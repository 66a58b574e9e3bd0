use clap::Parser;
use retro_core::RetroConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use retro_server::{server, AppContext};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "retro.toml")]
    config: String,

    /// Check the store and LLM configuration, then exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match RetroConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let ctx = match AppContext::from_config(config.clone()).await {
        Ok(c) => c,
        Err(e) => {
            if args.health {
                println!("❌ Thread store connection failed: {}", e);
            } else {
                eprintln!("Failed to initialise thread store: {}", e);
            }
            std::process::exit(1);
        }
    };

    if args.health {
        println!("✅ Thread store: {}", ctx.store.backend_name());
        println!("✅ LLM backend: {}", ctx.summarizer.name());
        println!("✅ Retro health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    let http_task = if config.http.enabled {
        let http_ctx = ctx.clone();
        let http_shutdown = tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = retro_server::http::start_http_server(http_ctx, http_shutdown).await {
                tracing::error!("HTTP server error: {}", e);
            }
        }))
    } else {
        None
    };

    if config.service.ipc_enabled {
        let socket_path = config.socket_path();
        server::run_unix_server(&socket_path, ctx, tx.subscribe()).await?;
    } else if let Some(task) = http_task {
        task.await?;
    } else {
        tracing::warn!("Both HTTP and IPC are disabled; nothing to serve");
    }

    Ok(())
}
