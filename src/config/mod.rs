//! Configuration module for the job marketplace backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Optional pre-shared key gating the whole `/api` tree
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Absolute base URL used when rendering links sent to users
    pub public_url: String,
    /// Base URL that file references are resolved against
    pub media_url: String,
    /// Page size used when the client does not ask for one
    pub page_size: u32,
    /// Upper bound for a client-requested page size
    pub max_page_size: u32,
    /// bcrypt cost factor for password hashes
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("JOBMARKET_API_PSK").ok();

        let db_path = env::var("JOBMARKET_DB_PATH")
            .unwrap_or_else(|_| "./data/jobmarket.sqlite".to_string())
            .into();

        let bind_addr = env::var("JOBMARKET_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid JOBMARKET_BIND_ADDR format");

        let log_level = env::var("JOBMARKET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let public_url = env::var("JOBMARKET_PUBLIC_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let media_url = env::var("JOBMARKET_MEDIA_URL").unwrap_or_else(|_| "/media/".to_string());

        let page_size = parse_or("JOBMARKET_PAGE_SIZE", 2);
        let max_page_size = parse_or("JOBMARKET_MAX_PAGE_SIZE", 10).max(page_size);
        let bcrypt_cost = parse_or("JOBMARKET_BCRYPT_COST", bcrypt::DEFAULT_COST);

        Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            public_url,
            media_url,
            page_size,
            max_page_size,
            bcrypt_cost,
        }
    }
}

fn parse_or(key: &str, default: u32) -> u32 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
