use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub holds: HoldsConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Hold engine tunables.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldsConfig {
    /// Longest allowed single hold, in days.
    #[serde(default = "default_max_hold_days")]
    pub max_hold_days: i64,
    /// Channel written into `legacy_queue.channel`.
    #[serde(default = "default_legacy_channel")]
    pub legacy_channel: String,
    /// Period of the status sweep; 0 disables it.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for HoldsConfig {
    fn default() -> Self {
        Self {
            max_hold_days: default_max_hold_days(),
            legacy_channel: default_legacy_channel(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_max_hold_days() -> i64 { 365 }
fn default_legacy_channel() -> String { "queue".into() }
fn default_sweep_interval() -> u64 { 3600 }

/// In-process job queue sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self { workers: default_workers(), capacity: default_capacity() }
    }
}

fn default_workers() -> usize { 2 }
fn default_capacity() -> usize { 1024 }

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like `load_and_validate`, but a missing config file falls back to
    /// defaults plus environment variables.
    pub fn load_or_env() -> Result<Self> {
        let mut cfg = load_default().unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.holds.validate()?;
        self.queue.normalize();
        self.auth.normalize_from_env();
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl HoldsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_hold_days <= 0 {
            return Err(anyhow!("holds.max_hold_days must be > 0"));
        }
        if self.legacy_channel.trim().is_empty() {
            return Err(anyhow!("holds.legacy_channel must not be empty"));
        }
        Ok(())
    }
}

impl QueueConfig {
    fn normalize(&mut self) {
        if self.workers == 0 { self.workers = default_workers(); }
        if self.capacity == 0 { self.capacity = default_capacity(); }
    }
}

/// Signing secret used when neither the config file nor `JWT_SECRET` sets one.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        self.fill_secret(std::env::var("JWT_SECRET").ok());
    }

    fn fill_secret(&mut self, from_env: Option<String>) {
        if !self.jwt_secret.trim().is_empty() {
            return;
        }
        match from_env.filter(|s| !s.trim().is_empty()) {
            Some(secret) => self.jwt_secret = secret,
            None => {
                warn!("no JWT secret configured, falling back to the development secret");
                self.jwt_secret = DEV_JWT_SECRET.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            url = "postgres://localhost/gym"

            [holds]
            max_hold_days = 90
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 10);
        assert_eq!(cfg.holds.max_hold_days, 90);
        assert_eq!(cfg.holds.legacy_channel, "queue");
        assert_eq!(cfg.queue.workers, 2);
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut db = DatabaseConfig { url: "mysql://localhost/gym".into(), ..DatabaseConfig::default() };
        assert!(db.validate().is_err());
        db.url = "postgres://localhost/gym".into();
        assert!(db.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_hold_length() {
        let holds = HoldsConfig { max_hold_days: 0, ..HoldsConfig::default() };
        assert!(holds.validate().is_err());
    }

    #[test]
    fn jwt_secret_falls_back_only_when_unset() {
        let mut auth = AuthConfig { jwt_secret: String::new() };
        auth.fill_secret(None);
        assert_eq!(auth.jwt_secret, DEV_JWT_SECRET);

        let mut auth = AuthConfig { jwt_secret: " ".into() };
        auth.fill_secret(Some("from-env".into()));
        assert_eq!(auth.jwt_secret, "from-env");

        let mut auth = AuthConfig { jwt_secret: String::new() };
        auth.fill_secret(Some("".into()));
        assert_eq!(auth.jwt_secret, DEV_JWT_SECRET);

        let mut auth = AuthConfig { jwt_secret: "configured".into() };
        auth.fill_secret(Some("from-env".into()));
        assert_eq!(auth.jwt_secret, "configured");
    }

    #[test]
    fn queue_zero_values_fall_back() {
        let mut q = QueueConfig { workers: 0, capacity: 0 };
        q.normalize();
        assert_eq!(q.workers, 2);
        assert_eq!(q.capacity, 1024);
    }
}
