use std::sync::Arc;

use clap::Parser;
use studio_core::StudioConfig;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use studio_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "studio.toml")]
    config: String,

    /// Verify storage and model credentials, then exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match StudioConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over service.log_level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    // Build services once; the store must be usable, the model may be missing
    let state = match HttpState::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open content store: {}", e);
            std::process::exit(1);
        }
    };

    if args.check {
        println!("✅ Content store ready: {}", state.store.path().display());
        match &state.generation {
            Ok(service) => println!(
                "✅ Generation service ready: {} ({})",
                service.backend_name(),
                state.config.gemini.model
            ),
            Err(e) => {
                println!("❌ Generation service unavailable: {}", e);
                println!("   Set GEMINI_API_KEY in the environment or a .env file");
                std::process::exit(1);
            }
        }
        println!("✅ Creator Studio check passed");
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

    http::start_http_server(Arc::new(state), tx.subscribe()).await?;

    Ok(())
}
