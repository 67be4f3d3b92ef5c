use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub catalog_cache_ttl: Duration,
    pub catalog_cache_limit: u64,
    pub audit_buffer: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_or("APP_PORT", 3000);
        Ok(Self {
            port,
            database_url,
            host,
            catalog_cache_ttl: cache_ttl(env_or("CATALOG_CACHE_TTL_HOURS", 6)),
            catalog_cache_limit: env_or("CATALOG_CACHE_LIMIT", 50),
            audit_buffer: env_or("AUDIT_BUFFER", 1024),
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Hours to a `Duration`, capped instead of overflowing.
fn cache_ttl(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(60 * 60))
}
