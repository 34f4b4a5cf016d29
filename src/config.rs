use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upper bound for the cache TTL (30 days)
const MAX_TTL_SECONDS: u64 = 30 * 24 * 3600;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Lifetime of an entry without a refreshing event
    pub ttl_seconds: u64,
    pub sweep_interval_ms: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                log_level: "info".to_string(),
                log_format: "text".to_string(),
            },
            cache: CacheConfig {
                ttl_seconds: 6 * 3600,
                sweep_interval_ms: 1000,
            },
        }
    }
}

/// Load configuration from defaults, an optional TOML file, and the environment
///
/// Environment variables use the `GITLAB_EXPORTER` prefix with `__` as the
/// section separator, e.g. `GITLAB_EXPORTER_CACHE__TTL_SECONDS=3600`.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let defaults = Config::default();

    let config = config::Config::builder()
        .set_default("server.host", defaults.server.host)?
        .set_default("server.port", i64::from(defaults.server.port))?
        .set_default("server.log_level", defaults.server.log_level)?
        .set_default("server.log_format", defaults.server.log_format)?
        .set_default("cache.ttl_seconds", defaults.cache.ttl_seconds as i64)?
        .set_default("cache.sweep_interval_ms", defaults.cache.sweep_interval_ms as i64)?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("GITLAB_EXPORTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("Server port must be non-zero");
    }

    if cfg.server.host.parse::<std::net::IpAddr>().is_err() {
        anyhow::bail!("Invalid server host: {}", cfg.server.host);
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}', expected 'text' or 'json'", other),
    }

    if cfg.cache.ttl_seconds == 0 || cfg.cache.ttl_seconds > MAX_TTL_SECONDS {
        anyhow::bail!(
            "Cache TTL must be between 1 and {} seconds, got {}",
            MAX_TTL_SECONDS,
            cfg.cache.ttl_seconds
        );
    }

    if cfg.cache.sweep_interval_ms < 10 {
        anyhow::bail!(
            "Sweep interval must be at least 10ms, got {}ms",
            cfg.cache.sweep_interval_ms
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.cache.ttl(), chrono::Duration::hours(6));
        assert_eq!(cfg.cache.sweep_interval(), Duration::from_secs(1));
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn test_validate_config_rejects_zero_ttl() {
        let mut cfg = Config::default();
        cfg.cache.ttl_seconds = 0;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Cache TTL"));
    }

    #[test]
    fn test_validate_config_rejects_tiny_sweep_interval() {
        let mut cfg = Config::default();
        cfg.cache.sweep_interval_ms = 1;

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Sweep interval"));
    }

    #[test]
    fn test_validate_config_rejects_unknown_log_format() {
        let mut cfg = Config::default();
        cfg.server.log_format = "xml".to_string();

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_bad_host() {
        let mut cfg = Config::default();
        cfg.server.host = "not-an-ip".to_string();

        assert!(validate_config(&cfg).is_err());
    }
}
