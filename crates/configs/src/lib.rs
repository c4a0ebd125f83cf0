use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATABASE_FILE: &str = "rest.json";
const DEFAULT_WORKER_THREADS: usize = 4;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(DEFAULT_WORKER_THREADS) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_file")]
    pub database_file: PathBuf,
    /// Report a failed save as a server error instead of the legacy 200.
    #[serde(default)]
    pub strict_persistence: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { database_file: default_database_file(), strict_persistence: false }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// `host:port` for the `/healthz` + `/metrics` listener; disabled when unset.
    #[serde(default)]
    pub addr: Option<String>,
}

fn default_host() -> String { DEFAULT_HOST.to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_database_file() -> PathBuf { PathBuf::from(DEFAULT_DATABASE_FILE) }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config file first; when it is missing or invalid fall back to
    /// `SERVER_HOST`, `SERVER_PORT`, `DATABASE_FILE`, `ADMIN_ADDR` and
    /// `TOKIO_WORKER_THREADS`, then to built-in defaults.
    pub fn load_or_env() -> Self {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_or_env_from(&path)
    }

    /// Same as [`AppConfig::load_or_env`] for an explicit file. A file that
    /// exists but does not parse or validate is reported before falling back.
    pub fn load_or_env_from(path: &str) -> Self {
        let loaded = load_from_file(path).and_then(|mut cfg| {
            cfg.normalize_and_validate()?;
            Ok(cfg)
        });
        match loaded {
            Ok(cfg) => cfg,
            Err(e) => {
                if std::path::Path::new(path).exists() {
                    warn!(path, error = %e, "ignoring invalid config file, using environment");
                }
                let mut cfg = Self::from_env();
                // from_env only yields values that pass validation after normalising
                let _ = cfg.normalize_and_validate();
                cfg
            }
        }
    }

    pub fn from_env() -> Self {
        let env = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        let server = ServerConfig {
            host: env("SERVER_HOST").unwrap_or_else(default_host),
            port: env("SERVER_PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .filter(|p| *p != 0)
                .unwrap_or(DEFAULT_PORT),
            worker_threads: env("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()),
        };
        let storage = StorageConfig {
            database_file: env("DATABASE_FILE").map(PathBuf::from).unwrap_or_else(default_database_file),
            strict_persistence: env("STRICT_PERSISTENCE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };
        let admin = AdminConfig { addr: env("ADMIN_ADDR") };
        Self { server, storage, admin }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize();
        self.admin.normalize();
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = DEFAULT_HOST.to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(DEFAULT_WORKER_THREADS),
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.database_file.as_os_str().is_empty() {
            self.database_file = default_database_file();
        }
    }
}

impl AdminConfig {
    fn normalize(&mut self) {
        if self.addr.as_deref().is_some_and(|a| a.trim().is_empty()) {
            self.addr = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let mut cfg = parse("").unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:5000");
        assert_eq!(cfg.storage.database_file, PathBuf::from("rest.json"));
        assert!(!cfg.storage.strict_persistence);
        assert!(cfg.admin.addr.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let mut cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 8088
            worker_threads = 0

            [storage]
            database_file = "data/records.json"
            strict_persistence = true

            [admin]
            addr = "127.0.0.1:9100"
            "#,
        )
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8088");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.database_file, PathBuf::from("data/records.json"));
        assert!(cfg.storage.strict_persistence);
        assert_eq!(cfg.admin.addr.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn blank_values_are_normalized() {
        let mut cfg = parse(
            r#"
            [server]
            host = "  "
            [storage]
            database_file = ""
            [admin]
            addr = ""
            "#,
        )
        .unwrap();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.storage.database_file, PathBuf::from("rest.json"));
        assert!(cfg.admin.addr.is_none());
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut cfg = parse("[server]\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn malformed_file_falls_back_to_env_defaults() {
        let path = std::env::temp_dir().join(format!("records-bad-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[server\nport = \"not a number\"\n").unwrap();
        let cfg = AppConfig::load_or_env_from(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert!(cfg.server.port != 0);
        assert!(!cfg.storage.database_file.as_os_str().is_empty());
        assert_eq!(cfg.server.worker_threads.map(|w| w > 0), Some(true));
    }

    #[test]
    fn valid_file_is_used() {
        let path = std::env::temp_dir().join(format!("records-good-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nport = 8123\n[storage]\ndatabase_file = \"x.json\"\n").unwrap();
        let cfg = AppConfig::load_or_env_from(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();
        assert_eq!(cfg.server.port, 8123);
        assert_eq!(cfg.storage.database_file, PathBuf::from("x.json"));
    }
}
