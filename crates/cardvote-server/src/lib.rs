//! WebSocket room-coordination service for multiplayer card voting
//!
//! Players connect to `/{room_id}/{user_id}`. The service tracks who is in
//! each room, collects the cards every player selects, and broadcasts a
//! `users updated` event on every change and a `voting completed` event once
//! the room's capacity worth of players have submitted. Room capacity and
//! selections per player are read from the leading digit of the room id.

pub mod config;
pub mod error;
pub mod rooms;
pub mod tally;
pub mod ws;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use rooms::{ConnectionToken, EventSender, RoomManager};
pub use tally::VotingResult;

// Re-export commonly used types from cardvote-types
pub use cardvote_types::{ClientEvent, RoomId, RoomOverview, RoomRules, ServerEvent, UserId, UserStatus};

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::{middleware, Router};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub rooms: usize,
}

/// Shared application state containing the room manager and configuration.
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomManager>,
    pub config: ServerConfig,
}

/// Handler for the / GET endpoint.
async fn overview_handler(State(app_state): State<AppState>) -> Json<RoomOverview> {
    Json(app_state.rooms.overview().await)
}

/// Handler for the /health GET endpoint.
async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rooms: app_state.rooms.room_count().await,
    })
}

/// The room service.
pub struct RoomServer {
    rooms: Arc<RoomManager>,
    config: ServerConfig,
}

impl RoomServer {
    /// Create a new server with default configuration.
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new server with custom configuration.
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            rooms: Arc::new(RoomManager::with_max_rooms(config.max_rooms)),
            config,
        }
    }

    /// The room manager backing this server, for in-process clients.
    pub fn rooms(&self) -> Arc<RoomManager> {
        self.rooms.clone()
    }

    /// Build the Axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            rooms: self.rooms.clone(),
            config: self.config.clone(),
        };

        let mut router = Router::new()
            .route("/", get(overview_handler))
            .route("/health", get(health_handler))
            .route("/{room_id}/{user_id}", get(ws::room_socket_handler))
            .with_state(state);

        if self.config.enable_logging {
            router = router.layer(middleware::from_fn(
                |request: axum::http::Request<axum::body::Body>, next: axum::middleware::Next| async {
                    let request_id = uuid::Uuid::new_v4().to_string();
                    let method = request.method().clone();
                    let uri = request.uri().clone();

                    // the root endpoint doubles as the clients' liveness probe
                    if uri.path() == "/" {
                        log::debug!("Request {} {} {}", request_id, method, uri);
                    } else {
                        log::info!("Request {} {} {}", request_id, method, uri);
                    }

                    let start = std::time::Instant::now();
                    let response = next.run(request).await;
                    log::debug!(
                        "Response {} {} in {:?}",
                        request_id,
                        response.status(),
                        start.elapsed()
                    );

                    response
                },
            ));
        }

        router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors_layer = if let Some(ref origins) = self.config.cors_origins {
                let origins: std::result::Result<Vec<axum::http::HeaderValue>, _> =
                    origins.iter().map(|s| s.parse()).collect();
                match origins {
                    Ok(origins) => CorsLayer::new()
                        .allow_origin(origins)
                        .allow_methods(Any)
                        .allow_headers(Any),
                    Err(_) => {
                        log::warn!("Invalid CORS origin configured, allowing any origin");
                        CorsLayer::permissive()
                    }
                }
            } else {
                CorsLayer::permissive()
            };
            router = router.layer(cors_layer);
        }

        router
    }

    /// Bind the configured address and serve until the shutdown signal fires.
    pub async fn serve_with_shutdown<F>(self, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| {
                ServerError::config_error(format!(
                    "Failed to bind to {}: {}",
                    self.config.bind_addr, e
                ))
            })?;
        self.serve_on_listener(listener, shutdown_signal).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on_listener<F>(self, listener: TcpListener, shutdown_signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = listener.local_addr()?;

        log::info!("cardvote server starting on {}", addr);
        log::info!("Room overview: http://{}/", addr);
        log::info!("Health check: http://{}/health", addr);
        log::info!("Room sockets: ws://{}/{{room_id}}/{{user_id}}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::internal(format!("Server error: {}", e)))?;

        log::info!("cardvote server shut down gracefully");
        Ok(())
    }
}

impl Default for RoomServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Utility function to create a shutdown signal from Ctrl+C.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            log::info!("Received SIGTERM, shutting down...");
        },
    }
}
