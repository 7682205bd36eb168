//! Layered configuration for kataboard
//!
//! Precedence, lowest first:
//!   built-in defaults
//!   ~/.kataboard/config.toml
//!   environment (after loading .env)
//!   command-line flags (applied by each command)
//!
//! Environment variables:
//!   KATABOARD_DATABASE_URL / DATABASE_URL   # SQLite URL
//!   KATABOARD_BIND                          # Server address, e.g. 0.0.0.0:8080

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

const DEFAULT_DATABASE_URL: &str = "sqlite://kataboard.db";

/// Effective configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KataboardConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    pub cors_permissive: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: kataboard_server::db::pool::DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl KataboardConfig {
    /// Location of the config file (`~/.kataboard/config.toml`)
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kataboard").join("config.toml"))
    }

    /// Load defaults, then the config file if present, then the environment.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_toml(&text)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            _ => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Database URL and pool size after command-line overrides.
    pub fn database_target(
        &self,
        url: Option<String>,
        max_connections: Option<u32>,
    ) -> (String, u32) {
        (
            url.unwrap_or_else(|| self.database.url.clone()),
            max_connections.unwrap_or(self.database.max_connections),
        )
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KATABOARD_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.database.url = url;
        }

        if let Some(bind) = lookup("KATABOARD_BIND") {
            self.server.bind = bind
                .parse()
                .with_context(|| format!("KATABOARD_BIND is not a socket address: {}", bind))?;
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show config file path
    Path,
    /// Print the effective configuration as TOML
    Show,
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            let path = KataboardConfig::config_path().context("Could not determine home directory")?;
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = KataboardConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = KataboardConfig::from_toml(
            r#"
            [database]
            url = "sqlite:///var/lib/kataboard/data.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url, "sqlite:///var/lib/kataboard/data.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn malformed_file_is_error() {
        assert!(KataboardConfig::from_toml("[server]\nbind = 12").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("DATABASE_URL", "sqlite://fallback.db"),
            ("KATABOARD_DATABASE_URL", "sqlite://preferred.db"),
            ("KATABOARD_BIND", "0.0.0.0:8080"),
        ]
        .into_iter()
        .collect();

        let mut config = KataboardConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "sqlite://preferred.db");
        assert_eq!(config.server.bind.port(), 8080);
    }

    #[test]
    fn bad_bind_env_is_error() {
        let mut config = KataboardConfig::default();
        let result = config.apply_env(|key| (key == "KATABOARD_BIND").then(|| "nowhere".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn database_target_prefers_flags() {
        let config = KataboardConfig::from_toml("[database]\nmax_connections = 2").unwrap();

        assert_eq!(
            config.database_target(None, None),
            (DEFAULT_DATABASE_URL.to_string(), 2)
        );
        assert_eq!(
            config.database_target(Some("sqlite://other.db".into()), Some(8)),
            ("sqlite://other.db".to_string(), 8)
        );
    }

    #[test]
    fn round_trips_through_toml() {
        let config = KataboardConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(KataboardConfig::from_toml(&text).unwrap(), config);
    }
}
