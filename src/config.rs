use serde::Deserialize;
use std::path::Path;

use crate::error::AppError;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DbConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3001
}
fn default_db_path() -> String {
    "tasks.db".to_string()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults. Environment
    /// overrides are applied either way.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        let mut cfg = if path.exists() {
            Self::load(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// `PORT` and `DATABASE_PATH` take precedence over the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|s| !s.is_empty()) {
            self.server.port = port
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|s| !s.is_empty()) {
            self.database.path = path;
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
path = "data/test.db"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "data/test.db");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_sections_default() {
        let config: Config = toml::from_str("[server]\nport = 4000\n").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.path, "tasks.db");

        let empty: Config = toml::from_str("").unwrap();
        assert_eq!(empty.server.port, 3001);
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("PORT", "9000".to_string()),
            ("DATABASE_PATH", "/tmp/other.db".to_string()),
        ]);
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, "/tmp/other.db");

        let bad = HashMap::from([("PORT", "not-a-port".to_string())]);
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(|k| bad.get(k).cloned()),
            Err(AppError::Config(_))
        ));
    }
}
