use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.name)
            .username(&self.username)
            .password(&self.password)
    }
}

/// Process-wide settings. Built once in `main` and shared read-only.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Reads the TOML file named by `CONFIG_PATH`, or falls back to plain env vars.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_PATH") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Self::from_env(),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("load config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).context("parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let http = HttpConfig {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| default_host()),
            port: parse_env("APP_PORT")?.unwrap_or_else(default_port),
        };
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
        };
        let database = DatabaseConfig {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".into()),
            port: parse_env("DB_PORT")?.unwrap_or_else(default_db_port),
            name: std::env::var("DB_NAME").context("DB_NAME must be set")?,
            username: std::env::var("DB_USER").context("DB_USER must be set")?,
            password: std::env::var("DB_PASSWORD").unwrap_or_default(),
            max_connections: parse_env("DB_MAX_CONNECTIONS")?
                .unwrap_or_else(default_max_connections),
            acquire_timeout_secs: parse_env("DB_ACQUIRE_TIMEOUT_SECS")?
                .unwrap_or_else(default_acquire_timeout_secs),
        };

        let config = Self {
            http,
            jwt,
            database,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.http.host, self.http.port))
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.jwt.secret.is_empty(), "jwt secret must not be empty");
        anyhow::ensure!(
            self.database.max_connections > 0,
            "database max_connections must be positive"
        );
        Ok(())
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            http: HttpConfig::default(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
            },
            database: DatabaseConfig {
                host: "localhost".into(),
                port: default_db_port(),
                name: "pvz_test".into(),
                username: "postgres".into(),
                password: "postgres".into(),
                max_connections: default_max_connections(),
                acquire_timeout_secs: default_acquire_timeout_secs(),
            },
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(None),
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_db_port() -> u16 {
    5432
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_secs() -> u64 {
    5
}
