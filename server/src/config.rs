//! Server startup settings

use std::path::PathBuf;
use std::time::Duration;

/// Startup settings for [`crate::network::Server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// 0 binds an ephemeral port.
    pub port: u16,
    /// When set, handshakes whose `Origin` header differs are refused.
    pub allowed_origin: Option<String>,
    /// How long a new TCP connection may take to finish the WebSocket handshake.
    pub handshake_timeout: Duration,
    pub tick_interval: Duration,
    pub max_clients: usize,
    /// Capacity of each client's outbound frame queue.
    pub outbound_queue: usize,
    pub map_width: u32,
    pub map_height: u32,
    pub countries: usize,
    /// Directory holding the JSON seed files. Procedural world when absent.
    pub seed_dir: Option<PathBuf>,
    pub rng_seed: Option<u64>,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            allowed_origin: None,
            handshake_timeout: Duration::from_secs(10),
            tick_interval: Duration::from_millis(1000),
            max_clients: 64,
            outbound_queue: 256,
            map_width: 24,
            map_height: 16,
            countries: 6,
            seed_dir: None,
            rng_seed: None,
        }
    }
}
