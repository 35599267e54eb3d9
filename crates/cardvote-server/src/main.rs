//! cardvote-server binary
//!
//! Runs the room-coordination service that browser and CLI clients connect to.

use cardvote_server::{shutdown_signal, RoomServer, ServerConfig};
use clap::Parser;
use std::net::SocketAddr;

/// Command line arguments for the room service.
#[derive(Parser, Debug)]
#[command(name = "cardvote-server")]
#[command(about = "WebSocket room service for multiplayer card voting")]
#[command(version)]
struct Args {
    /// YAML configuration file; flags given explicitly override it
    #[arg(short, long)]
    config: Option<String>,

    /// Server bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// Disable CORS
    #[arg(long)]
    no_cors: bool,

    /// CORS allowed origins (comma-separated)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Largest accepted WebSocket message in bytes
    #[arg(long)]
    max_message_size: Option<usize>,

    /// Maximum number of simultaneously open rooms
    #[arg(long)]
    max_rooms: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from file: {}", path);
            ServerConfig::from_file(path).await?
        }
        None => ServerConfig::new(),
    };

    if let Some(bind) = &args.bind {
        let bind_addr: SocketAddr = bind
            .parse()
            .map_err(|e| format!("Invalid bind address '{}': {}", bind, e))?;
        config = config.with_bind_addr(bind_addr);
    }
    if args.no_cors {
        config = config.with_cors(false);
    }
    if let Some(origins) = &args.cors_origins {
        config = config.with_cors_origins(origins.split(',').map(|s| s.trim().to_string()).collect());
    }
    if let Some(size) = args.max_message_size {
        config = config.with_max_message_size(size);
    }
    if let Some(max_rooms) = args.max_rooms {
        config = config.with_max_rooms(max_rooms.max(1));
    }

    log::info!("Configuration:");
    log::info!("  Bind address: {}", config.bind_addr);
    log::info!("  CORS enabled: {}", config.enable_cors);
    log::info!("  CORS origins: {:?}", config.cors_origins);
    log::info!("  Max message size: {} bytes", config.max_message_size);
    log::info!("  Max rooms: {}", config.max_rooms);

    let server = RoomServer::with_config(config);
    server.serve_with_shutdown(shutdown_signal()).await?;

    Ok(())
}
