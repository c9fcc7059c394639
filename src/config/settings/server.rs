//! HTTP API settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Interface to bind
    /// Default: 127.0.0.1
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Default: 8787
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret required on every request (sent as `X-GreenCampus-Token`)
    ///
    /// If empty, the server accepts unauthenticated requests (not recommended
    /// outside local development).
    #[serde(default)]
    pub http_token: String,
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            http_token: String::new(),
        }
    }
}
