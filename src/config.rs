use std::env;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_BUS_CAPACITY;

/// Which key-value store backs the user records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local store, lost on restart (development and tests)
    Memory,
    /// Shared Redis instance at `REDIS_URL`
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("Invalid STORE_BACKEND: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => f.write_str("memory"),
            StoreBackend::Redis => f.write_str("redis"),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub redis_url: String,
    pub redis_pool_size: u32,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub admin_secret_key: Option<String>,
    pub log_requests: bool,
    pub bus_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let redis_pool_size = env::var("REDIS_POOL_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| "Invalid REDIS_POOL_SIZE")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Admin endpoints stay disabled unless a key is configured
        let admin_secret_key = env::var("ADMIN_SECRET_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let log_requests = env::var("LOG_REQUESTS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .map_err(|_| "Invalid LOG_REQUESTS")?;

        let bus_capacity = env::var("BUS_CAPACITY")
            .unwrap_or_else(|_| DEFAULT_BUS_CAPACITY.to_string())
            .parse()
            .map_err(|_| "Invalid BUS_CAPACITY")?;

        Ok(Config {
            server_host,
            server_port,
            store_backend,
            redis_url,
            redis_pool_size,
            allowed_origins,
            environment,
            admin_secret_key,
            log_requests,
            bus_capacity,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
