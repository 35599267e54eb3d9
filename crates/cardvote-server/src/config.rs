//! Server configuration, built from CLI flags or loaded from a YAML file.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::error::{Result, ServerError};
use crate::rooms::RoomManager;

/// Configuration for the room service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Enable CORS
    pub enable_cors: bool,
    /// CORS allowed origins (if None, allows any origin)
    pub cors_origins: Option<Vec<String>>,
    /// Enable request logging
    pub enable_logging: bool,
    /// Largest accepted WebSocket message in bytes
    pub max_message_size: usize,
    /// Maximum number of simultaneously open rooms
    pub max_rooms: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            enable_cors: true,
            cors_origins: None, // Allow any origin
            enable_logging: true,
            max_message_size: 64 * 1024,
            max_rooms: RoomManager::DEFAULT_MAX_ROOMS,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Parse and set the bind address from a string.
    pub fn with_bind_addr_str(mut self, addr: &str) -> Result<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| ServerError::config_error(format!("Invalid bind address: {}", e)))?;
        Ok(self)
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, enable: bool) -> Self {
        self.enable_cors = enable;
        self
    }

    /// Set allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = if origins.is_empty() {
            None
        } else {
            Some(origins)
        };
        self
    }

    /// Enable or disable request logging.
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_max_rooms(mut self, max_rooms: usize) -> Self {
        self.max_rooms = max_rooms;
        self
    }

    /// Load configuration from a YAML file.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ServerError::config_error(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string. Missing keys keep their defaults.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(content)
            .map_err(|e| ServerError::config_error(format!("Failed to parse YAML config: {}", e)))?;
        file.apply(Self::default())
    }
}

/// On-disk shape of [`ServerConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind_addr: Option<String>,
    cors: Option<bool>,
    cors_origins: Option<Vec<String>>,
    logging: Option<bool>,
    max_message_size: Option<usize>,
    max_rooms: Option<usize>,
}

impl FileConfig {
    fn apply(self, mut config: ServerConfig) -> Result<ServerConfig> {
        if let Some(addr) = self.bind_addr {
            config = config.with_bind_addr_str(&addr)?;
        }
        if let Some(cors) = self.cors {
            config = config.with_cors(cors);
        }
        if let Some(origins) = self.cors_origins {
            config = config.with_cors_origins(origins);
        }
        if let Some(logging) = self.logging {
            config = config.with_logging(logging);
        }
        if let Some(size) = self.max_message_size {
            config = config.with_max_message_size(size);
        }
        if let Some(max_rooms) = self.max_rooms {
            if max_rooms == 0 {
                return Err(ServerError::config_error("max_rooms must be at least 1"));
            }
            config = config.with_max_rooms(max_rooms);
        }
        Ok(config)
    }
}
