use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Settings shared by every service: where to listen.
///
/// Loaded from an optional `configuration` file and `APP__*` environment
/// variables (e.g. `APP__PORT=8080`). The gRPC listener sits on `port + 1`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Port for the gRPC listener, one above the HTTP port. Port 0 stays 0 so
    /// tests get an ephemeral port.
    pub fn grpc_port(&self) -> Result<u16, AppError> {
        if self.port == 0 {
            return Ok(0);
        }
        self.port.checked_add(1).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!(
                "HTTP port {} leaves no room for the gRPC port",
                self.port
            ))
        })
    }

    pub fn bind_address(&self, port: u16) -> Result<std::net::SocketAddr, AppError> {
        format!("{}:{}", self.host, port).parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid bind address {}:{}: {}",
                self.host,
                port,
                e
            ))
        })
    }
}
